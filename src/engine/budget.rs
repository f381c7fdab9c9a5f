// ==========================================
// 道路养护计划系统 - 预算分摊
// ==========================================
// 职责: 将总预算平均分摊到计划期剩余各月
// 规则: 第 i 月分得 remaining / (n - i)，remaining 随之扣减
// 红线: 各月之和等于总预算
// ==========================================

use crate::domain::plan::{BudgetSchedule, FinancialSummary, PlanEntry};
use crate::engine::error::{PlanningError, PlanningResult};

/// 计划年数上限
pub const MAX_YEAR_COUNT: u32 = 100;

// ==========================================
// BudgetAllocator - 预算分摊器
// ==========================================
#[derive(Debug, Default)]
pub struct BudgetAllocator {}

impl BudgetAllocator {
    pub fn new() -> Self {
        Self {}
    }

    /// 计划月数：`year_count * 12 - (initial_month - 1)`
    ///
    /// 起始月之前的月份不计入第一年。
    pub fn horizon_month_count(&self, initial_month: u32, year_count: u32) -> PlanningResult<usize> {
        if !(1..=12).contains(&initial_month) {
            return Err(PlanningError::InvalidInput(format!(
                "起始月份必须在 1..=12: {}",
                initial_month
            )));
        }
        if year_count == 0 || year_count > MAX_YEAR_COUNT {
            return Err(PlanningError::InvalidInput(format!(
                "计划年数必须在 1..={}: {}",
                MAX_YEAR_COUNT, year_count
            )));
        }
        year_count
            .checked_mul(12)
            .and_then(|months| months.checked_sub(initial_month - 1))
            .map(|months| months as usize)
            .ok_or_else(|| PlanningError::InvalidInput(format!("计划月数溢出: {} 年", year_count)))
    }

    /// 平均分摊
    ///
    /// # 参数
    /// - `total_budget`: 总预算（非负有限数）
    /// - `month_count`: 剩余月数（> 0）
    pub fn amortize(&self, total_budget: f64, month_count: usize) -> PlanningResult<BudgetSchedule> {
        if !total_budget.is_finite() || total_budget < 0.0 {
            return Err(PlanningError::InvalidInput(format!(
                "总预算必须为非负有限数: {}",
                total_budget
            )));
        }
        if month_count == 0 {
            return Err(PlanningError::InvalidInput("计划月数必须大于 0".to_string()));
        }

        let mut remaining = total_budget;
        let mut ceilings = Vec::with_capacity(month_count);
        for i in 0..month_count {
            let share = remaining / (month_count - i) as f64;
            ceilings.push(share);
            remaining -= share;
        }
        Ok(BudgetSchedule::new(ceilings))
    }

    /// 财务汇总：支出 = Σ 条目费用，结余 = 预算 - 支出
    pub fn financial_summary(&self, budget: f64, plans: &[PlanEntry]) -> FinancialSummary {
        let expenses: f64 = plans.iter().map(|p| p.cost).sum();
        FinancialSummary {
            budget,
            expenses,
            balance: budget - expenses,
        }
    }
}
