// ==========================================
// 道路养护计划系统 - 引擎层错误类型
// ==========================================
// 红线: 所有错误均为终止性错误，不做重试
// ==========================================

use crate::domain::types::{PlanPeriod, RoadId};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 计划引擎错误类型
#[derive(Error, Debug)]
pub enum PlanningError {
    // ===== 数据缺失 =====
    #[error("实体未找到: {entity} (id={id})")]
    NotFound { entity: String, id: String },

    // ===== 预测 =====
    #[error("预测不可用: {0}")]
    PredictionUnavailable(String),

    // ===== 优化 =====
    #[error("目标改善量 {target} 无法由现有工作等级精确组合")]
    NoExactCombination { target: f64 },

    #[error("道路 {road_id} 在 {period} 所需改善量 {target} 无法精确组合")]
    OptimizationFailed {
        road_id: RoadId,
        period: PlanPeriod,
        target: f64,
    },

    #[error("预算书目录非法: {0}")]
    InvalidCatalogue(String),

    #[error("后台优化任务异常: {0}")]
    TaskFailed(String),

    // ===== 输入与配置 =====
    #[error("输入参数非法: {0}")]
    InvalidInput(String),

    #[error("配置读取失败: {0}")]
    ConfigError(String),

    // ===== 持久化 =====
    #[error("持久化失败: {0}")]
    PersistenceFailure(#[from] RepositoryError),
}

/// Result 类型别名
pub type PlanningResult<T> = Result<T, PlanningError>;

impl PlanningError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        PlanningError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}
