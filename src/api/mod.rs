// ==========================================
// 道路养护计划系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行入口调用
// ==========================================

pub mod error;
pub mod import_api;
pub mod planning_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportApiResponse};
pub use planning_api::PlanningApi;
