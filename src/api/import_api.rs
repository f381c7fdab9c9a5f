// ==========================================
// 道路养护计划系统 - 基础数据导入 API
// ==========================================
// 职责: 封装道路、预算书、技术状况的 CSV 导入
// ==========================================

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::engine::PlanningRepositories;
use crate::importer::{ImportSummary, ReferenceDataImporter};

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 各文件导入结果
    pub summaries: Vec<ImportSummary>,
    /// 写入的总行数
    pub total_written: usize,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

impl ImportApiResponse {
    fn from_summaries(summaries: Vec<ImportSummary>, started: Instant) -> Self {
        let total_written = summaries.iter().map(|s| s.rows_written).sum();
        Self {
            summaries,
            total_written,
            elapsed_ms: started.elapsed().as_millis() as i64,
        }
    }
}

/// 导入API
pub struct ImportApi {
    importer: ReferenceDataImporter,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(repos: &PlanningRepositories) -> Self {
        Self {
            importer: ReferenceDataImporter::new(
                repos.road_repo.clone(),
                repos.estimate_repo.clone(),
                repos.condition_repo.clone(),
            ),
        }
    }

    /// 导入道路
    pub fn import_roads(&self, file_path: &str) -> ApiResult<ImportApiResponse> {
        let started = Instant::now();
        let summary = self.importer.import_roads(Self::checked_path(file_path)?)?;
        Ok(ImportApiResponse::from_summaries(vec![summary], started))
    }

    /// 导入预算书
    pub fn import_estimates(&self, file_path: &str) -> ApiResult<ImportApiResponse> {
        let started = Instant::now();
        let summary = self.importer.import_estimates(Self::checked_path(file_path)?)?;
        Ok(ImportApiResponse::from_summaries(vec![summary], started))
    }

    /// 导入实测技术状况
    pub fn import_conditions(&self, file_path: &str) -> ApiResult<ImportApiResponse> {
        let started = Instant::now();
        let summary = self.importer.import_conditions(Self::checked_path(file_path)?)?;
        Ok(ImportApiResponse::from_summaries(vec![summary], started))
    }

    /// 导入目录（roads.csv / estimates.csv / conditions.csv）
    pub fn import_directory(&self, dir: &str) -> ApiResult<ImportApiResponse> {
        let started = Instant::now();
        let summaries = self.importer.import_directory(Self::checked_path(dir)?)?;
        if summaries.is_empty() {
            return Err(ApiError::ImportError(format!("目录中没有可导入的文件: {}", dir)));
        }
        Ok(ImportApiResponse::from_summaries(summaries, started))
    }

    fn checked_path(raw: &str) -> ApiResult<&Path> {
        if raw.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
        }
        Ok(Path::new(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_json_is_readable_back() {
        let response = ImportApiResponse {
            summaries: vec![ImportSummary {
                entity: "road".to_string(),
                rows_read: 2,
                rows_written: 2,
            }],
            total_written: 2,
            elapsed_ms: 5,
        };

        let json = serde_json::to_string(&response).unwrap();
        let parsed: ImportApiResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.summaries, response.summaries);
        assert_eq!(parsed.total_written, 2);
    }

    #[test]
    fn test_checked_path_rejects_blank() {
        assert!(matches!(
            ImportApi::checked_path("  "),
            Err(ApiError::InvalidInput(_))
        ));
    }
}
