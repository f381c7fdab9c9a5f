// ==========================================
// 道路养护计划系统 - 预算书领域模型
// ==========================================
// 用途: 带价格的养护作业单元，挂靠在某条道路上
// 红线: 同一工作等级只取最便宜的预算书参与搜索（由 EstimateCatalogue 保证）
// ==========================================

use crate::domain::types::{EstimateId, RoadId};
use serde::{Deserialize, Serialize};

// ==========================================
// Estimate - 预算书
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub id: EstimateId,        // 预算书ID
    pub name: String,          // 名称
    pub level_of_works: f64,   // 工作等级（该作业带来的技术状况改善量）
    pub cost: f64,             // 费用（非负）
    pub link: String,          // 文档链接
    pub road_id: RoadId,       // 所属道路
}

impl Estimate {
    pub fn new(id: i64, level_of_works: f64, cost: f64, road_id: i64) -> Self {
        Self {
            id: EstimateId(id),
            name: format!("Estimate #{}", id),
            level_of_works,
            cost,
            link: String::new(),
            road_id: RoadId(road_id),
        }
    }
}
