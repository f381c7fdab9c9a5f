// ==========================================
// 道路养护计划系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、强类型 ID、值对象
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod condition;
pub mod estimate;
pub mod plan;
pub mod road;
pub mod types;

// 重导出核心类型
pub use condition::{ConditionRecord, RoadConditionMap};
pub use estimate::Estimate;
pub use plan::{BudgetSchedule, FinancialSummary, PlanEntry, PlanRun, RoadAllocation};
pub use road::Road;
pub use types::{EstimateId, PlanPeriod, RoadId, MAX_CHANGE, MAX_CONDITION, MIN_CHANGE, MIN_CONDITION};
