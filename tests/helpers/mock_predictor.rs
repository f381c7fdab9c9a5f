// ==========================================
// Mock 预测器 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use road_works_dss::domain::types::{PlanPeriod, RoadId};
use road_works_dss::domain::{ConditionRecord, RoadConditionMap};
use road_works_dss::engine::{ConditionPredictor, PlanningError, PlanningResult};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

/// 构造状况映射
pub fn condition_map(values: &[(i64, f64)]) -> RoadConditionMap {
    let mut map = RoadConditionMap::new();
    for (road_id, value) in values {
        map.insert(RoadId(*road_id), *value);
    }
    map
}

// ==========================================
// FixedPredictor - 每月返回同一预测
// ==========================================
pub struct FixedPredictor {
    pub prediction: RoadConditionMap,
}

impl FixedPredictor {
    pub fn new(values: &[(i64, f64)]) -> Self {
        Self {
            prediction: condition_map(values),
        }
    }
}

#[async_trait]
impl ConditionPredictor for FixedPredictor {
    async fn predict(
        &self,
        _period: PlanPeriod,
        _current: &RoadConditionMap,
        _history: &[ConditionRecord],
    ) -> PlanningResult<RoadConditionMap> {
        Ok(self.prediction.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

// ==========================================
// PeriodPredictor - 按月份返回预测，未配置的月份失败
// ==========================================
// 同时记录每次调用收到的历史记录数
pub struct PeriodPredictor {
    pub by_period: BTreeMap<PlanPeriod, RoadConditionMap>,
    pub calls: Mutex<Vec<(PlanPeriod, usize)>>,
}

impl PeriodPredictor {
    pub fn new() -> Self {
        Self {
            by_period: BTreeMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn month(mut self, year: i32, month: u32, values: &[(i64, f64)]) -> Self {
        self.by_period
            .insert(PlanPeriod { year, month }, condition_map(values));
        self
    }

    pub fn calls(&self) -> Vec<(PlanPeriod, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConditionPredictor for PeriodPredictor {
    async fn predict(
        &self,
        period: PlanPeriod,
        _current: &RoadConditionMap,
        history: &[ConditionRecord],
    ) -> PlanningResult<RoadConditionMap> {
        self.calls.lock().unwrap().push((period, history.len()));
        self.by_period
            .get(&period)
            .cloned()
            .ok_or_else(|| PlanningError::PredictionUnavailable(format!("{} 无预测", period)))
    }

    fn name(&self) -> &'static str {
        "period"
    }
}

// ==========================================
// SlowPredictor - 超过超时时间才返回
// ==========================================
pub struct SlowPredictor {
    pub delay: Duration,
}

#[async_trait]
impl ConditionPredictor for SlowPredictor {
    async fn predict(
        &self,
        _period: PlanPeriod,
        current: &RoadConditionMap,
        _history: &[ConditionRecord],
    ) -> PlanningResult<RoadConditionMap> {
        tokio::time::sleep(self.delay).await;
        Ok(current.clone())
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}
