// ==========================================
// 道路养护计划系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::Arc;

use crate::api::{ImportApi, PlanningApi};
use crate::config::config_manager::ConfigManager;
use crate::db::open_shared_connection;
use crate::engine::PlanningRepositories;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "ROAD_WORKS_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 养护计划API
    pub planning_api: Arc<PlanningApi>,

    /// 基础数据导入API
    pub import_api: Arc<ImportApi>,

    /// 配置管理器（CLI 的 config 子命令直接读写）
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接并建表
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = open_shared_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let repos = PlanningRepositories::from_connection(conn.clone());

        // ==========================================
        // 初始化配置与API层
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let import_api = Arc::new(ImportApi::new(&repos));
        let planning_api = Arc::new(PlanningApi::new(repos, config_manager.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            planning_api,
            import_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级：环境变量 ROAD_WORKS_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./road_works.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("road-works-dss");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("road_works.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_app_state_initializes_schema() {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.db_path, db_path);
        assert!(state.planning_api.list_runs().unwrap().is_empty());
    }
}
