// ==========================================
// 道路养护计划系统 - 技术状况领域模型
// ==========================================
// 用途: 月度技术状况记录 + 按道路索引的状况映射
// 红线: 记录只追加不修改
// ==========================================

use crate::domain::road::Road;
use crate::domain::types::{PlanPeriod, RoadId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ConditionRecord - 技术状况记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRecord {
    pub road_id: RoadId,       // 道路ID
    pub year: i32,             // 年
    pub month: u32,            // 月 (1-12)
    pub condition: f64,        // 技术状况评分 [0.1, 5.0]
}

impl ConditionRecord {
    pub fn new(road_id: RoadId, period: PlanPeriod, condition: f64) -> Self {
        Self {
            road_id,
            year: period.year,
            month: period.month,
            condition,
        }
    }

    /// 记录所属周期（月份越界时返回 None，入库前已校验）
    pub fn period(&self) -> Option<PlanPeriod> {
        PlanPeriod::new(self.year, self.month)
    }
}

// ==========================================
// RoadConditionMap - 按道路索引的数值映射
// ==========================================
// 用于: 初始状况、预测状况、所需改善量
// BTreeMap 保证按 RoadId 稳定排序，跨道路合并结果时顺序确定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoadConditionMap {
    values: BTreeMap<RoadId, f64>,
}

impl RoadConditionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, road_id: RoadId, value: f64) -> Option<f64> {
        self.values.insert(road_id, value)
    }

    pub fn get(&self, road_id: RoadId) -> Option<f64> {
        self.values.get(&road_id).copied()
    }

    pub fn get_mut(&mut self, road_id: RoadId) -> Option<&mut f64> {
        self.values.get_mut(&road_id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RoadId, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    pub fn road_ids(&self) -> impl Iterator<Item = RoadId> + '_ {
        self.values.keys().copied()
    }

    /// 完整性校验：每条道路都必须有取值
    ///
    /// # 返回
    /// - Ok(()): 完整
    /// - Err(RoadId): 第一条缺失的道路
    pub fn ensure_complete(&self, roads: &[Road]) -> Result<(), RoadId> {
        match roads.iter().find(|r| !self.values.contains_key(&r.id)) {
            Some(missing) => Err(missing.id),
            None => Ok(()),
        }
    }
}

impl FromIterator<(RoadId, f64)> for RoadConditionMap {
    fn from_iter<T: IntoIterator<Item = (RoadId, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
