// ==========================================
// 道路养护计划系统 - 技术状况追踪
// ==========================================
// 职责:
// - 衰减基线: condition * e^-1
// - 初始状况: 计划起点及之前的最新记录
// - 所需改善量: 预测值 - 衰减基线
// 红线: 评分落在 [0.1, 5.0]，改善量落在 [0, 5.0]，均保留一位小数
// ==========================================

use crate::domain::condition::{ConditionRecord, RoadConditionMap};
use crate::domain::road::Road;
use crate::domain::types::{
    round_to_tenth, PlanPeriod, RoadId, MAX_CHANGE, MAX_CONDITION, MIN_CHANGE, MIN_CONDITION,
};
use crate::engine::error::{PlanningError, PlanningResult};
use std::collections::HashMap;
use tracing::debug;

/// 衰减指数（固定为 1）
pub const DECAY_EXPONENT: f64 = 1.0;

// ==========================================
// ConditionTracker - 技术状况追踪器
// ==========================================
#[derive(Debug, Default)]
pub struct ConditionTracker {
    // 无状态，历史记录由调用方传入
}

impl ConditionTracker {
    pub fn new() -> Self {
        Self {}
    }

    /// 衰减基线
    ///
    /// `condition * e^-1`，截断到 [0.1, 5.0] 后保留一位小数。
    pub fn decay(&self, condition: f64) -> f64 {
        let decayed = condition * (-DECAY_EXPONENT).exp();
        round_to_tenth(decayed.clamp(MIN_CONDITION, MAX_CONDITION))
    }

    /// 所需改善量
    ///
    /// `predicted - decay(initial)`，截断到 [0, 5.0] 后保留一位小数。
    pub fn required_change(&self, initial: f64, predicted: f64) -> f64 {
        let delta = predicted - self.decay(initial);
        round_to_tenth(delta.clamp(MIN_CHANGE, MAX_CHANGE))
    }

    /// 规范化单个预测值（保留一位小数并截断到评分取值域）
    pub fn normalize_prediction(&self, road_id: RoadId, value: f64) -> PlanningResult<f64> {
        if !value.is_finite() {
            return Err(PlanningError::PredictionUnavailable(format!(
                "道路 {} 的预测值不是有限数: {}",
                road_id, value
            )));
        }
        Ok(round_to_tenth(value).clamp(MIN_CONDITION, MAX_CONDITION))
    }

    /// 规范化整张预测表，并确认每条道路都有预测值
    pub fn normalize_predictions(
        &self,
        roads: &[Road],
        raw: &RoadConditionMap,
    ) -> PlanningResult<RoadConditionMap> {
        raw.ensure_complete(roads).map_err(|road_id| {
            PlanningError::PredictionUnavailable(format!("道路 {} 缺少预测值", road_id))
        })?;
        roads
            .iter()
            .filter_map(|road| raw.get(road.id).map(|value| (road.id, value)))
            .map(|(road_id, value)| Ok((road_id, self.normalize_prediction(road_id, value)?)))
            .collect()
    }

    /// 初始状况：每条道路在 `horizon_start` 及之前的最新记录
    ///
    /// # 参数
    /// - `roads`: 参与计划的道路
    /// - `records`: 可见的历史记录（同一周期多条时以靠后的为准）
    /// - `horizon_start`: 计划起点
    ///
    /// # 返回
    /// - `Err(NotFound)`: 某条道路在起点之前没有任何记录
    pub fn initial_conditions(
        &self,
        roads: &[Road],
        records: &[ConditionRecord],
        horizon_start: PlanPeriod,
    ) -> PlanningResult<RoadConditionMap> {
        let mut latest: HashMap<RoadId, (PlanPeriod, f64)> = HashMap::new();

        for record in records {
            let Some(period) = record.period() else {
                continue;
            };
            if period > horizon_start {
                continue;
            }
            match latest.get(&record.road_id) {
                Some((seen, _)) if *seen > period => {}
                _ => {
                    latest.insert(record.road_id, (period, record.condition));
                }
            }
        }

        let mut result = RoadConditionMap::new();
        for road in roads {
            match latest.get(&road.id) {
                Some((period, condition)) => {
                    debug!(road_id = %road.id, period = %period, condition, "初始状况");
                    result.insert(road.id, *condition);
                }
                None => {
                    return Err(PlanningError::not_found(
                        "ConditionRecord",
                        format!("road_id={} at or before {}", road.id, horizon_start),
                    ));
                }
            }
        }
        Ok(result)
    }

    /// 计算每条道路的所需改善量
    pub fn compute_deltas(
        &self,
        roads: &[Road],
        initial: &RoadConditionMap,
        predicted: &RoadConditionMap,
    ) -> PlanningResult<RoadConditionMap> {
        roads
            .iter()
            .map(|road| {
                let start = initial
                    .get(road.id)
                    .ok_or_else(|| PlanningError::not_found("InitialCondition", road.id))?;
                let target = predicted.get(road.id).ok_or_else(|| {
                    PlanningError::PredictionUnavailable(format!("道路 {} 缺少预测值", road.id))
                })?;
                Ok((road.id, self.required_change(start, target)))
            })
            .collect()
    }

    /// 下一个计划起点：全部记录中最新周期的下一个月
    pub fn next_horizon_start(&self, records: &[ConditionRecord]) -> PlanningResult<PlanPeriod> {
        records
            .iter()
            .filter_map(|r| r.period())
            .max()
            .map(PlanPeriod::next)
            .ok_or_else(|| PlanningError::not_found("ConditionRecord", "any"))
    }
}
