// ==========================================
// 道路养护计划系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 行号为 CSV 文件中的物理行号（表头为第 1 行）
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 数据映射错误 =====
    #[error("必填字段缺失 (行 {row}): {field}")]
    MissingField { row: usize, field: String },

    #[error("类型转换失败 (行 {row}, 字段 {field}): {message}")]
    TypeConversionError {
        row: usize,
        field: String,
        message: String,
    },

    #[error("数值范围错误 (行 {row}, 字段 {field}): 值 {value} 超出范围 [{min}, {max}]")]
    ValueRangeError {
        row: usize,
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("数值不在 0.1 步长上 (行 {row}, 字段 {field}): {value}")]
    OffGridValue { row: usize, field: String, value: f64 },

    #[error("主键重复 (行 {row}): {key}")]
    DuplicateKey { row: usize, key: String },

    // ===== 数据库错误 =====
    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    #[error("数据写入失败: {0}")]
    Repository(RepositoryError),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 外键违反单独归类，其余仓储错误原样包装
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ForeignKeyViolation(msg) => ImportError::ForeignKeyViolation(msg),
            other => ImportError::Repository(other),
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
