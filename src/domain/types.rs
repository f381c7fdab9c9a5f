// ==========================================
// 道路养护计划系统 - 领域类型定义
// ==========================================
// 职责: 强类型 ID、计划周期、技术状况取值域
// 红线: 技术状况评分始终落在 [0.1, 5.0]
// ==========================================

use chrono::Month;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 技术状况取值域
// ==========================================

/// 技术状况评分下限
pub const MIN_CONDITION: f64 = 0.1;

/// 技术状况评分上限（5.0 = 最好）
pub const MAX_CONDITION: f64 = 5.0;

/// 所需改善量下限
pub const MIN_CHANGE: f64 = 0.0;

/// 所需改善量上限
pub const MAX_CHANGE: f64 = 5.0;

/// 一位小数网格的缩放倍数（评分、改善量、工作等级均落在 0.1 网格上）
pub const TENTHS_SCALE: f64 = 10.0;

/// 四舍五入到一位小数（中点远离零取整）
pub fn round_to_tenth(value: f64) -> f64 {
    (value * TENTHS_SCALE).round() / TENTHS_SCALE
}

/// 转换为整数"十分位"（用于精确求和比较）
pub fn to_tenths(value: f64) -> i64 {
    (value * TENTHS_SCALE).round() as i64
}

/// 整数"十分位"还原为实数
pub fn from_tenths(tenths: i64) -> f64 {
    tenths as f64 / TENTHS_SCALE
}

/// 判断实数是否落在 0.1 网格上
pub fn is_on_tenth_grid(value: f64) -> bool {
    ((value * TENTHS_SCALE) - (value * TENTHS_SCALE).round()).abs() < 1e-6
}

// ==========================================
// RoadId - 道路标识
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoadId(pub i64);

impl fmt::Display for RoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RoadId {
    fn from(value: i64) -> Self {
        RoadId(value)
    }
}

// ==========================================
// EstimateId - 预算书（作业）标识
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EstimateId(pub i64);

impl fmt::Display for EstimateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EstimateId {
    fn from(value: i64) -> Self {
        EstimateId(value)
    }
}

// ==========================================
// PlanPeriod - 计划周期（年 + 月）
// ==========================================
// 月份取值 1..=12；字段顺序保证派生的 Ord 先比年再比月
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanPeriod {
    pub year: i32,
    pub month: u32,
}

impl PlanPeriod {
    /// 创建计划周期，月份越界返回 None
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// 下一个月（12 月之后回绕到次年 1 月）
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// 上一个月（1 月之前回绕到上年 12 月）
    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for PlanPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// 解析月份：支持数字 (1-12) 与英文月份名 (January / Jan)
pub fn parse_month(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    trimmed
        .parse::<Month>()
        .ok()
        .map(|m| m.number_from_month())
}
