// ==========================================
// 道路养护计划系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + Tokio
// 系统定位: 决策支持系统（多年度养护作业与预算计划）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{EstimateId, PlanPeriod, RoadId};

// 领域实体
pub use domain::{
    BudgetSchedule, ConditionRecord, Estimate, FinancialSummary, PlanEntry, PlanRun, Road,
    RoadAllocation, RoadConditionMap,
};

// 引擎
pub use engine::{
    BudgetAllocator, ConditionPredictor, ConditionTracker, EstimateOptimizer,
    OverflowReconciler, PlanningError, PlanningOrchestrator, RegressionPredictor,
    ScriptPredictor,
};

// API
pub use api::{ApiError, ImportApi, PlanningApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "道路养护计划系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";
