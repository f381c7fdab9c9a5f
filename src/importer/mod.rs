// ==========================================
// 道路养护计划系统 - 导入层
// ==========================================
// 职责: 外部 CSV 数据 → 领域对象 → 仓储
// 支持: CSV
// ==========================================

pub mod error;
pub mod file_parser;
pub mod reference_importer;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, FileParser, RawRecord};
pub use reference_importer::{
    ImportSummary, ReferenceDataImporter, CONDITIONS_FILE, ESTIMATES_FILE, ROADS_FILE,
};
