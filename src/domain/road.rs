// ==========================================
// 道路养护计划系统 - 道路领域模型
// ==========================================
// 用途: 计划期内不可变的道路参考数据
// ==========================================

use crate::domain::types::RoadId;
use serde::{Deserialize, Serialize};

// ==========================================
// Road - 道路
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Road {
    pub id: RoadId,                 // 道路ID
    pub number: String,             // 道路编号（显示用）
    pub priority: f64,              // 优先级权重（越大越重要）
    pub link_to_passport: String,   // 道路档案链接
}

impl Road {
    pub fn new(id: i64, number: impl Into<String>, priority: f64) -> Self {
        Self {
            id: RoadId(id),
            number: number.into(),
            priority,
            link_to_passport: String::new(),
        }
    }
}
