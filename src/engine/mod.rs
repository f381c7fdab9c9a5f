// ==========================================
// 道路养护计划系统 - 引擎层
// ==========================================
// 职责: 状况衰减、预算分摊、组合优化、超限处理、逐月编排
// 红线: Engine 不拼 SQL，数据访问全部经由 repository
// ==========================================

pub mod budget;
pub mod condition;
pub mod error;
pub mod optimizer;
pub mod orchestrator;
pub mod predictor;
pub mod reconciler;
pub mod repositories;
pub mod strategy;

// 重导出核心引擎
pub use budget::{BudgetAllocator, MAX_YEAR_COUNT};
pub use condition::ConditionTracker;
pub use error::{PlanningError, PlanningResult};
pub use optimizer::{best_combination, Combination, EstimateCatalogue, EstimateOptimizer};
pub use orchestrator::{PlanRequest, PlanResult, PlanningOrchestrator};
pub use predictor::{
    build_predictor, ConditionPredictor, PredictionMethodScore, RegressionPredictor, ScriptPredictor,
};
pub use reconciler::{DeferredRoad, OverflowReconciler, ReconcileOutcome};
pub use repositories::PlanningRepositories;
pub use strategy::{PredictorKind, ReconcileOrder};
