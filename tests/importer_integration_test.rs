// ==========================================
// 导入模块集成测试
// ==========================================
// 测试范围:
// 1. 目录导入: roads.csv → estimates.csv → conditions.csv
// 2. 行级错误定位（缺字段、越界、主键重复）
// 3. 外键违反时整文件不落库
// 4. 导入后直接生成计划
// ==========================================

mod helpers;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use helpers::mock_predictor::FixedPredictor;
use helpers::test_db::{count_rows, setup_test_db};
use road_works_dss::api::{ApiError, ImportApi, PlanningApi};
use road_works_dss::config::ConfigManager;
use road_works_dss::domain::types::{PlanPeriod, RoadId};
use road_works_dss::importer::{ImportError, ReferenceDataImporter};
use tempfile::TempDir;

fn write_file(dir: &Path, name: &str, lines: &[&str]) {
    fs::write(dir.join(name), lines.join("\n")).unwrap();
}

fn write_reference_files(dir: &Path) {
    write_file(
        dir,
        "roads.csv",
        &["id,number,priority,link", "1,R1,1,", "2,R2,3,http://passport/2"],
    );
    write_file(
        dir,
        "estimates.csv",
        &[
            "id,name,level_of_work,cost,link,road_id",
            "1,Patching,0.2,20000,,1",
            "2,Resurfacing,0.4,40000,,1",
        ],
    );
    write_file(
        dir,
        "conditions.csv",
        &[
            "road_id,year,month,condition",
            "1,2024,October,4.1",
            "1,2024,11,4.0",
            "2,2024,Nov,2.0",
        ],
    );
}

#[test]
fn test_import_directory_loads_all_entities() {
    let db = setup_test_db();
    let dir = TempDir::new().unwrap();
    write_reference_files(dir.path());

    let api = ImportApi::new(&db.repos);
    let response = api.import_directory(dir.path().to_str().unwrap()).unwrap();

    let entities: Vec<&str> = response.summaries.iter().map(|s| s.entity.as_str()).collect();
    assert_eq!(entities, vec!["road", "estimate", "condition_record"]);
    assert_eq!(response.total_written, 7);

    let road = db.repos.road_repo.find_by_id(RoadId(2)).unwrap().unwrap();
    assert_eq!(road.priority, 3.0);
    assert_eq!(road.link_to_passport, "http://passport/2");

    let conditions = db.repos.condition_repo.find_observed_by_road(RoadId(1)).unwrap();
    assert_eq!(conditions.len(), 2);
    assert_eq!(conditions[0].month, 10);
}

#[test]
fn test_import_directory_without_files_is_error() {
    let db = setup_test_db();
    let dir = TempDir::new().unwrap();

    let result = ImportApi::new(&db.repos).import_directory(dir.path().to_str().unwrap());
    assert!(matches!(result, Err(ApiError::ImportError(_))));
}

#[test]
fn test_row_errors_carry_line_numbers() {
    let db = setup_test_db();
    let dir = TempDir::new().unwrap();
    let importer = ReferenceDataImporter::new(
        db.repos.road_repo.clone(),
        db.repos.estimate_repo.clone(),
        db.repos.condition_repo.clone(),
    );

    write_file(dir.path(), "missing.csv", &["id,number,priority", "1,R1,1", "2,,3"]);
    match importer.import_roads(dir.path().join("missing.csv")) {
        Err(ImportError::MissingField { row, field }) => {
            assert_eq!(row, 3);
            assert_eq!(field, "number");
        }
        other => panic!("应返回 MissingField，实际: {:?}", other),
    }

    write_file(dir.path(), "dup.csv", &["id,number,priority", "1,R1,1", "1,R1b,2"]);
    assert!(matches!(
        importer.import_roads(dir.path().join("dup.csv")),
        Err(ImportError::DuplicateKey { row: 3, .. })
    ));

    write_file(
        dir.path(),
        "range.csv",
        &["road_id,year,month,condition", "1,2024,1,5.5"],
    );
    assert!(matches!(
        importer.import_conditions(dir.path().join("range.csv")),
        Err(ImportError::ValueRangeError { row: 2, .. })
    ));

    // 任一行失败则整个文件不写入
    assert_eq!(count_rows(&db.conn, "road"), 0);
}

#[test]
fn test_estimates_for_unknown_road_are_rejected() {
    let db = setup_test_db();
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "estimates.csv",
        &["id,name,level_of_work,cost,link,road_id", "1,Patching,0.2,20000,,9"],
    );

    let result = ImportApi::new(&db.repos)
        .import_estimates(dir.path().join("estimates.csv").to_str().unwrap());
    assert!(matches!(result, Err(ApiError::BusinessRuleViolation(_))));
    assert_eq!(count_rows(&db.conn, "estimate"), 0);
}

#[test]
fn test_off_grid_level_rejected_at_import() {
    let db = setup_test_db();
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "roads.csv", &["id,number,priority", "1,R1,1"]);
    write_file(
        dir.path(),
        "estimates.csv",
        &[
            "id,name,level_of_work,cost,link,road_id",
            "1,Patching,0.2,20000,,1",
            "2,Odd,0.25,25000,,1",
        ],
    );

    let api = ImportApi::new(&db.repos);
    api.import_roads(dir.path().join("roads.csv").to_str().unwrap())
        .unwrap();
    let result = api.import_estimates(dir.path().join("estimates.csv").to_str().unwrap());

    match result {
        Err(ApiError::ValidationError(msg)) => assert!(msg.contains("行 3")),
        other => panic!("应返回 ValidationError，实际: {:?}", other),
    }
    assert_eq!(count_rows(&db.conn, "estimate"), 0);
}

#[tokio::test]
async fn test_imported_data_feeds_planning() {
    let db = setup_test_db();
    let dir = TempDir::new().unwrap();
    write_reference_files(dir.path());
    ImportApi::new(&db.repos)
        .import_directory(dir.path().to_str().unwrap())
        .unwrap();

    let config = Arc::new(ConfigManager::from_connection(db.conn.clone()).unwrap());
    let api = PlanningApi::new(db.repos.clone(), config)
        .with_predictor(Arc::new(FixedPredictor::new(&[(1, 1.5), (2, 1.5)])));

    assert_eq!(
        api.next_horizon_start().unwrap(),
        PlanPeriod { year: 2024, month: 12 }
    );

    let result = api.create_plan(2024, 12, 1, 30_000.0).await.unwrap();
    assert_eq!(result.entries.len(), 2);
    assert_eq!(result.deferred_count, 1);
    assert_eq!(api.list_plan_entries(&result.run.run_id).unwrap(), result.entries);
}
