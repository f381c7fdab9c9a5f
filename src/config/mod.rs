// ==========================================
// 道路养护计划系统 - 配置层
// ==========================================
// 职责: 运行参数管理（预测器、并行度、超限剔除顺序）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod planning_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use planning_config_trait::{ConfigResult, PlanningConfigReader};
