// ==========================================
// 道路养护计划系统 - API层错误类型
// ==========================================
// 职责: 将仓储、引擎、导入错误转换为带明确原因的用户消息
// ==========================================

use crate::engine::error::PlanningError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 计划引擎错误
    // ==========================================
    #[error("技术状况预测不可用: {0}")]
    PredictionUnavailable(String),

    #[error("无法组合出所需改善量: {0}")]
    OptimizationFailed(String),

    #[error("预算书目录非法: {0}")]
    InvalidCatalogue(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
        }
    }
}

// ==========================================
// 从 PlanningError 转换
// ==========================================
impl From<PlanningError> for ApiError {
    fn from(err: PlanningError) -> Self {
        match err {
            PlanningError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            PlanningError::PredictionUnavailable(msg) => ApiError::PredictionUnavailable(msg),
            PlanningError::NoExactCombination { target } => {
                ApiError::OptimizationFailed(format!("目标改善量 {}", target))
            }
            PlanningError::OptimizationFailed {
                road_id,
                period,
                target,
            } => ApiError::OptimizationFailed(format!(
                "道路 {} 在 {} 需要改善 {}，现有工作等级无法精确组合",
                road_id, period, target
            )),
            PlanningError::InvalidCatalogue(msg) => ApiError::InvalidCatalogue(msg),
            PlanningError::TaskFailed(msg) => ApiError::InternalError(msg),
            PlanningError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            PlanningError::ConfigError(msg) => ApiError::ConfigError(msg),
            PlanningError::PersistenceFailure(repo) => ApiError::from(repo),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::MissingField { .. }
            | ImportError::TypeConversionError { .. }
            | ImportError::ValueRangeError { .. }
            | ImportError::OffGridValue { .. }
            | ImportError::DuplicateKey { .. } => ApiError::ValidationError(err.to_string()),
            ImportError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            ImportError::Repository(repo) => ApiError::from(repo),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
