// ==========================================
// 道路养护计划系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合计划编排器所需的所有 Repository
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    ConditionRecordRepository, EstimateRepository, PlanEntryRepository, PlanRunRepository,
    RoadRepository,
};

/// 计划引擎仓储集合
///
/// # 包含的仓储
/// - `road_repo`: 道路主数据
/// - `estimate_repo`: 预算书
/// - `condition_repo`: 技术状况记录
/// - `run_repo`: 计划运行
/// - `entry_repo`: 月度计划条目
#[derive(Clone)]
pub struct PlanningRepositories {
    pub road_repo: Arc<RoadRepository>,
    pub estimate_repo: Arc<EstimateRepository>,
    pub condition_repo: Arc<ConditionRecordRepository>,
    pub run_repo: Arc<PlanRunRepository>,
    pub entry_repo: Arc<PlanEntryRepository>,
}

impl PlanningRepositories {
    pub fn new(
        road_repo: Arc<RoadRepository>,
        estimate_repo: Arc<EstimateRepository>,
        condition_repo: Arc<ConditionRecordRepository>,
        run_repo: Arc<PlanRunRepository>,
        entry_repo: Arc<PlanEntryRepository>,
    ) -> Self {
        Self {
            road_repo,
            estimate_repo,
            condition_repo,
            run_repo,
            entry_repo,
        }
    }

    /// 基于同一共享连接创建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self::new(
            Arc::new(RoadRepository::new(conn.clone())),
            Arc::new(EstimateRepository::new(conn.clone())),
            Arc::new(ConditionRecordRepository::new(conn.clone())),
            Arc::new(PlanRunRepository::new(conn.clone())),
            Arc::new(PlanEntryRepository::new(conn)),
        )
    }
}
