// ==========================================
// 道路养护计划系统 - 作业计划领域模型
// ==========================================
// 用途: 计划运行、月度计划条目、预算表、财务汇总
// 红线: PlanEntry 一经落库不可修改
// ==========================================

use crate::domain::estimate::Estimate;
use crate::domain::types::{EstimateId, PlanPeriod, RoadId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// PlanRun - 计划运行
// ==========================================
// 每次 create_plan 产生一条，承载运行上下文（替代进程级计划缓存）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRun {
    pub run_id: String,                      // 运行ID (UUID v4)
    pub start_year: i32,                     // 计划起始年
    pub start_month: u32,                    // 计划起始月
    pub year_count: u32,                     // 计划年数
    pub month_count: usize,                  // 计划月数
    pub budget: f64,                         // 总预算
    pub config_snapshot_json: Option<String>,// 配置快照 (JSON)
    pub created_at: NaiveDateTime,           // 创建时间
}

// ==========================================
// RoadAllocation - 单条道路的月度作业分配
// ==========================================
// 由 EstimateOptimizer 生成，OverflowReconciler 可能清空
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadAllocation {
    pub road_id: RoadId,
    pub required_change: f64,    // 所需改善量
    pub estimates: Vec<Estimate>,// 选中的预算书（同一等级可重复出现）
    pub cost: f64,               // 总费用
}

impl RoadAllocation {
    /// 空分配（无需作业或被预算剔除）
    pub fn empty(road_id: RoadId, required_change: f64) -> Self {
        Self {
            road_id,
            required_change,
            estimates: Vec::new(),
            cost: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    /// 清空分配（预算超限剔除）
    pub fn clear(&mut self) {
        self.estimates.clear();
        self.cost = 0.0;
    }
}

// ==========================================
// PlanEntry - 月度计划条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub run_id: String,                  // 所属运行
    pub year: i32,                       // 年
    pub month: u32,                      // 月
    pub road_id: RoadId,                 // 道路
    pub estimate_ids: Vec<EstimateId>,   // 选中的预算书ID
    pub cost: f64,                       // 总费用
    pub required_change: f64,            // 计划针对的改善量（被剔除时为 0）
}

impl PlanEntry {
    pub fn from_allocation(run_id: &str, period: PlanPeriod, allocation: &RoadAllocation) -> Self {
        Self {
            run_id: run_id.to_string(),
            year: period.year,
            month: period.month,
            road_id: allocation.road_id,
            estimate_ids: allocation.estimates.iter().map(|e| e.id).collect(),
            cost: allocation.cost,
            required_change: if allocation.is_empty() {
                0.0
            } else {
                allocation.required_change
            },
        }
    }

    pub fn period(&self) -> Option<PlanPeriod> {
        PlanPeriod::new(self.year, self.month)
    }
}

// ==========================================
// BudgetSchedule - 月度预算表
// ==========================================
// 运行期间可变：前面月份的结余滚入后一个月
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSchedule {
    ceilings: Vec<f64>,
}

impl BudgetSchedule {
    pub fn new(ceilings: Vec<f64>) -> Self {
        Self { ceilings }
    }

    pub fn len(&self) -> usize {
        self.ceilings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ceilings.is_empty()
    }

    /// 第 i 个月的预算上限
    pub fn ceiling(&self, month_index: usize) -> Option<f64> {
        self.ceilings.get(month_index).copied()
    }

    pub fn ceilings(&self) -> &[f64] {
        &self.ceilings
    }

    pub fn total(&self) -> f64 {
        self.ceilings.iter().sum()
    }

    /// 将第 i 个月的结余滚入第 i+1 个月
    ///
    /// # 返回
    /// - true: 已滚入
    /// - false: i 是最后一个月（结余不滚动，留作总结余）
    pub fn carry_surplus(&mut self, month_index: usize, surplus: f64) -> bool {
        match self.ceilings.get_mut(month_index + 1) {
            Some(next) => {
                *next += surplus;
                true
            }
            None => false,
        }
    }
}

// ==========================================
// FinancialSummary - 财务汇总
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub budget: f64,    // 总预算
    pub expenses: f64,  // 总支出 = Σ PlanEntry.cost
    pub balance: f64,   // 结余 = budget - expenses
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carry_surplus_stops_at_last_month() {
        let mut schedule = BudgetSchedule::new(vec![100.0, 100.0]);
        assert!(schedule.carry_surplus(0, 30.0));
        assert_eq!(schedule.ceiling(1), Some(130.0));
        assert!(!schedule.carry_surplus(1, 10.0));
        assert_eq!(schedule.total(), 230.0);
    }

    #[test]
    fn test_plan_entry_from_cleared_allocation_has_zero_change() {
        let mut allocation = RoadAllocation {
            road_id: RoadId(7),
            required_change: 0.6,
            estimates: vec![Estimate::new(1, 0.6, 100.0, 7)],
            cost: 100.0,
        };
        let period = PlanPeriod::new(2024, 5).unwrap();

        let entry = PlanEntry::from_allocation("run", period, &allocation);
        assert_eq!(entry.estimate_ids, vec![EstimateId(1)]);
        assert_eq!(entry.required_change, 0.6);

        allocation.clear();
        let entry = PlanEntry::from_allocation("run", period, &allocation);
        assert!(entry.estimate_ids.is_empty());
        assert_eq!(entry.cost, 0.0);
        assert_eq!(entry.required_change, 0.0);
    }
}
