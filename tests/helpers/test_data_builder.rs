// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use road_works_dss::domain::types::{PlanPeriod, RoadId};
use road_works_dss::domain::{ConditionRecord, Estimate, Road};
use road_works_dss::engine::PlanningRepositories;

// ==========================================
// Scenario 构建器
// ==========================================
// 累积道路、预算书、实测状况，最后一次性写入仓储

pub struct ScenarioBuilder {
    roads: Vec<Road>,
    estimates: Vec<Estimate>,
    conditions: Vec<ConditionRecord>,
    next_estimate_id: i64,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self {
            roads: Vec::new(),
            estimates: Vec::new(),
            conditions: Vec::new(),
            next_estimate_id: 1,
        }
    }

    /// 添加道路
    pub fn road(mut self, id: i64, priority: f64) -> Self {
        self.roads.push(Road::new(id, format!("R{}", id), priority));
        self
    }

    /// 添加预算书（挂在第一条道路上，未添加道路时挂在 1 号道路）
    pub fn estimate(mut self, level: f64, cost: f64) -> Self {
        let road_id = self.roads.first().map(|r| r.id.0).unwrap_or(1);
        self.estimates
            .push(Estimate::new(self.next_estimate_id, level, cost, road_id));
        self.next_estimate_id += 1;
        self
    }

    /// 添加实测状况
    pub fn condition(mut self, road_id: i64, year: i32, month: u32, value: f64) -> Self {
        self.conditions.push(ConditionRecord::new(
            RoadId(road_id),
            PlanPeriod { year, month },
            value,
        ));
        self
    }

    /// 写入仓储
    pub fn persist(self, repos: &PlanningRepositories) -> Self {
        repos.road_repo.batch_upsert(&self.roads).unwrap();
        repos.estimate_repo.batch_upsert(&self.estimates).unwrap();
        repos
            .condition_repo
            .batch_insert_observed(&self.conditions)
            .unwrap();
        self
    }
}

/// 两条道路场景: R1(优先级 1) / R2(优先级 3)，预算书 {0.2: 20000, 0.4: 40000}，
/// 2024-11 实测 {R1: 4.0, R2: 2.0}
pub fn two_road_scenario(repos: &PlanningRepositories) -> ScenarioBuilder {
    ScenarioBuilder::new()
        .road(1, 1.0)
        .road(2, 3.0)
        .estimate(0.2, 20_000.0)
        .estimate(0.4, 40_000.0)
        .condition(1, 2024, 11, 4.0)
        .condition(2, 2024, 11, 2.0)
        .persist(repos)
}
