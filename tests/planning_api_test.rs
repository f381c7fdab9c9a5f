// ==========================================
// PlanningApi 集成测试
// ==========================================
// 测试范围:
// 1. 参数校验
// 2. 财务汇总（按条目 / 按运行）
// 3. 运行与条目查询
// ==========================================

mod helpers;

use std::sync::Arc;

use helpers::mock_predictor::FixedPredictor;
use helpers::test_data_builder::two_road_scenario;
use helpers::test_db::{setup_test_db, TestDb};
use road_works_dss::api::{ApiError, PlanningApi};
use road_works_dss::config::ConfigManager;
use road_works_dss::domain::types::{EstimateId, PlanPeriod, RoadId};
use road_works_dss::domain::{ConditionRecord, PlanEntry, Road};

fn planning_api(db: &TestDb, prediction: &[(i64, f64)]) -> PlanningApi {
    let config = Arc::new(ConfigManager::from_connection(db.conn.clone()).unwrap());
    PlanningApi::new(db.repos.clone(), config)
        .with_predictor(Arc::new(FixedPredictor::new(prediction)))
}

fn entry(road_id: i64, cost: f64) -> PlanEntry {
    PlanEntry {
        run_id: "run".to_string(),
        year: 2024,
        month: 12,
        road_id: RoadId(road_id),
        estimate_ids: vec![EstimateId(1)],
        cost,
        required_change: 0.2,
    }
}

#[tokio::test]
async fn test_create_plan_rejects_invalid_input() {
    let db = setup_test_db();
    two_road_scenario(&db.repos);
    let api = planning_api(&db, &[(1, 1.5), (2, 1.5)]);

    let cases = [
        (0, 1, 1.0),
        (13, 1, 1.0),
        (1, 0, 1.0),
        (1, 101, 1.0),
        (1, u32::MAX, 1.0),
        (1, 1, f64::NAN),
        (1, 1, -5.0),
    ];
    for (month, years, budget) in cases {
        let result = api.create_plan(2024, month, years, budget).await;
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    }
    assert!(api.list_runs().unwrap().is_empty());
}

#[test]
fn test_financial_summary() {
    let db = setup_test_db();
    let api = planning_api(&db, &[]);

    let summary = api.financial_summary(100_000.0, &[entry(1, 20_000.0), entry(2, 40_000.0)]);
    assert_eq!(summary.budget, 100_000.0);
    assert_eq!(summary.expenses, 60_000.0);
    assert_eq!(summary.balance, 40_000.0);

    let empty = api.financial_summary(5_000.0, &[]);
    assert_eq!(empty.expenses, 0.0);
    assert_eq!(empty.balance, 5_000.0);
}

#[tokio::test]
async fn test_financial_summary_for_run_matches_result() {
    let db = setup_test_db();
    two_road_scenario(&db.repos);
    let api = planning_api(&db, &[(1, 1.5), (2, 1.5)]);

    let result = api.create_plan(2024, 12, 1, 100_000.0).await.unwrap();
    let summary = api.financial_summary_for_run(&result.run.run_id).unwrap();

    assert_eq!(summary, result.summary);
    assert_eq!(summary.expenses, 80_000.0);
    assert_eq!(api.get_run(&result.run.run_id).unwrap().month_count, 1);
}

#[test]
fn test_queries_for_unknown_run() {
    let db = setup_test_db();
    let api = planning_api(&db, &[]);

    assert!(matches!(api.list_plan_entries("nope"), Err(ApiError::NotFound(_))));
    assert!(matches!(api.financial_summary_for_run("nope"), Err(ApiError::NotFound(_))));
    assert!(matches!(api.get_run("  "), Err(ApiError::InvalidInput(_))));
}

#[test]
fn test_compare_prediction_methods() {
    let db = setup_test_db();
    let api = planning_api(&db, &[]);
    assert!(matches!(api.compare_prediction_methods(), Err(ApiError::NotFound(_))));

    // 线性下降的实测历史：两种次数都能精确复现留出的最后一个月
    db.repos.road_repo.insert(&Road::new(1, "R1", 1.0)).unwrap();
    let mut period = PlanPeriod { year: 2024, month: 1 };
    let records: Vec<ConditionRecord> = [4.0, 3.8, 3.6, 3.4, 3.2]
        .iter()
        .map(|value| {
            let record = ConditionRecord::new(RoadId(1), period, *value);
            period = period.next();
            record
        })
        .collect();
    db.repos.condition_repo.batch_insert_observed(&records).unwrap();

    let scores = api.compare_prediction_methods().unwrap();
    let degrees: Vec<usize> = scores.iter().map(|s| s.degree).collect();
    assert_eq!(degrees, vec![1, 2]);
    assert!(scores.iter().all(|s| s.samples == 1 && s.mae < 1e-6));
}

#[test]
fn test_next_horizon_start_requires_observations() {
    let db = setup_test_db();
    let api = planning_api(&db, &[]);

    assert!(matches!(api.next_horizon_start(), Err(ApiError::NotFound(_))));
}
