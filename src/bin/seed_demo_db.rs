// ==========================================
// 道路养护计划系统 - 演示数据库生成
// ==========================================
// 用法: seed_demo_db [数据库路径] [历史月数]
// 内容: 20 条道路、每条道路 40 份预算书（等级 0.1..=4.0）、
//       截至上个月的逐月实测技术状况
// ==========================================

use chrono::{Datelike, Local};
use std::error::Error;
use std::fs;
use std::path::Path;

use road_works_dss::app::get_default_db_path;
use road_works_dss::db::open_shared_connection;
use road_works_dss::domain::types::{round_to_tenth, PlanPeriod, RoadId, MAX_CONDITION, MIN_CONDITION};
use road_works_dss::domain::{ConditionRecord, Estimate, Road};
use road_works_dss::engine::PlanningRepositories;

const DEFAULT_HISTORY_MONTHS: usize = 24;
const ESTIMATES_PER_ROAD: i64 = 40;

// (道路编号, 优先级)
const ROADS: [(&str, f64); 20] = [
    ("18 OP RZ 18R-1", 1.0),
    ("18 OP RZ 18R-1-1", 3.0),
    ("18 OP RZ 18R-1-2", 4.0),
    ("18 OP RZ 18R-1-3", 4.0),
    ("18 OP RZ 18R-1-4", 1.0),
    ("18 OP RZ 18R-1-5", 4.0),
    ("18 OP RZ 18R-1-6", 3.0),
    ("18 OP RZ 18R-1-7", 4.0),
    ("18 OP RZ 18R-1-8", 4.0),
    ("18 OP RZ 18R-2", 4.0),
    ("18 OP RZ 18R-2-1", 3.0),
    ("18 OP RZ 18R-2-2", 3.0),
    ("18 OP RZ 18R-2-3", 3.0),
    ("18 OP RZ 18R-2-4", 4.0),
    ("18 OP RZ 18R-2-5", 4.0),
    ("18 OP RZ 18R-2-6", 2.0),
    ("18 OP RZ 18R-2-7", 2.0),
    ("18 OP RZ 18R-2-8", 2.0),
    ("18 OP RZ 18R-2-9", 2.0),
    ("18 OP RZ 18R-2-10", 1.0),
];

fn main() -> Result<(), Box<dyn Error>> {
    road_works_dss::logging::init();

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(get_default_db_path);

    let history_months = std::env::args()
        .nth(2)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_HISTORY_MONTHS)
        .max(3);

    backup_and_reset_db(&db_path)?;

    let conn = open_shared_connection(&db_path)?;
    let repos = PlanningRepositories::from_connection(conn);

    let roads = seed_roads();
    let estimates = seed_estimates(&roads);
    let conditions = seed_conditions(&roads, history_months);

    let road_count = repos.road_repo.batch_upsert(&roads)?;
    let estimate_count = repos.estimate_repo.batch_upsert(&estimates)?;
    let condition_count = repos.condition_repo.batch_insert_observed(&conditions)?;

    eprintln!(
        "Seeded {}: roads={}, estimates={}, condition_records={}",
        db_path, road_count, estimate_count, condition_count
    );
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_roads() -> Vec<Road> {
    ROADS
        .iter()
        .enumerate()
        .map(|(i, (number, priority))| Road::new(i as i64 + 1, *number, *priority))
        .collect()
}

// 第 i 份预算书: 等级 i*0.1，费用 i*0.2*100000
fn seed_estimates(roads: &[Road]) -> Vec<Estimate> {
    let mut estimates = Vec::with_capacity(roads.len() * ESTIMATES_PER_ROAD as usize);
    let mut next_id = 1;
    for road in roads {
        for i in 1..=ESTIMATES_PER_ROAD {
            let mut estimate = Estimate::new(
                next_id,
                round_to_tenth(i as f64 * 0.1),
                (i as f64 * 0.2 * 100_000.0).round(),
                road.id.0,
            );
            estimate.name = format!("Road {} works, level {:.1}", road.number, estimate.level_of_works);
            estimates.push(estimate);
            next_id += 1;
        }
    }
    estimates
}

// 历史结束于上个月；状况缓慢下降并带确定性的季节波动
fn seed_conditions(roads: &[Road], months: usize) -> Vec<ConditionRecord> {
    let today = Local::now().date_naive();
    let end = PlanPeriod {
        year: today.year(),
        month: today.month(),
    }
    .previous();
    let start = (1..months).fold(end, |p, _| p.previous());

    let mut records = Vec::with_capacity(roads.len() * months);
    for road in roads {
        let RoadId(id) = road.id;
        let base = 4.6 - 0.1 * (id % 5) as f64;
        let mut period = start;
        for step in 0..months {
            let seasonal = 0.15 * ((step as f64 + id as f64) * std::f64::consts::PI / 6.0).sin();
            let value = base - 0.04 * step as f64 + seasonal;
            records.push(ConditionRecord::new(
                road.id,
                period,
                round_to_tenth(value.clamp(MIN_CONDITION, MAX_CONDITION)),
            ));
            period = period.next();
        }
    }
    records
}
