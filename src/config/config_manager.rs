// ==========================================
// 道路养护计划系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::planning_config_trait::{ConfigResult, PlanningConfigReader};
use crate::db::open_sqlite_connection;
use crate::engine::strategy::{PredictorKind, ReconcileOrder};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有 global 配置的快照（JSON 格式）
    ///
    /// # 用途
    /// - 每次计划运行记录配置快照，便于复现结果
    pub fn get_config_snapshot_json(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// 实现 PlanningConfigReader Trait
// ==========================================
#[async_trait]
impl PlanningConfigReader for ConfigManager {
    // ===== 预测器配置 =====

    async fn get_predictor_kind(&self) -> ConfigResult<PredictorKind> {
        let value = self.get_config_or_default(config_keys::PREDICTOR_KIND, "regression")?;
        Ok(value.parse::<PredictorKind>().unwrap_or_else(|e| {
            warn!(key = config_keys::PREDICTOR_KIND, error = %e, "配置值非法，使用默认值");
            PredictorKind::default()
        }))
    }

    async fn get_predictor_command(&self) -> ConfigResult<Option<String>> {
        let value = self.get_config_value(config_keys::PREDICTOR_COMMAND)?;
        Ok(value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
    }

    async fn get_predictor_timeout_secs(&self) -> ConfigResult<u64> {
        let value = self.get_config_or_default(config_keys::PREDICTOR_TIMEOUT_SECS, "30")?;
        match value.trim().parse::<u64>() {
            Ok(v) if v > 0 => Ok(v),
            _ => {
                warn!(key = config_keys::PREDICTOR_TIMEOUT_SECS, value = %value, "配置值非法，使用默认值 30");
                Ok(30)
            }
        }
    }

    async fn get_regression_degree(&self) -> ConfigResult<usize> {
        let value = self.get_config_or_default(config_keys::REGRESSION_DEGREE, "2")?;
        match value.trim().parse::<usize>() {
            Ok(v @ 1..=2) => Ok(v),
            _ => {
                warn!(key = config_keys::REGRESSION_DEGREE, value = %value, "配置值非法，使用默认值 2");
                Ok(2)
            }
        }
    }

    // ===== 优化与预算配置 =====

    async fn get_parallel_optimization(&self) -> ConfigResult<bool> {
        let value = self.get_config_or_default(config_keys::PARALLEL_OPTIMIZATION, "true")?;
        Ok(match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => {
                warn!(key = config_keys::PARALLEL_OPTIMIZATION, value = %value, "配置值非法，使用默认值 true");
                true
            }
        })
    }

    async fn get_reconcile_order(&self) -> ConfigResult<ReconcileOrder> {
        let value = self.get_config_or_default(
            config_keys::RECONCILE_ORDER,
            ReconcileOrder::default().as_str(),
        )?;
        Ok(value.parse::<ReconcileOrder>().unwrap_or_else(|e| {
            warn!(key = config_keys::RECONCILE_ORDER, error = %e, "配置值非法，使用默认值");
            ReconcileOrder::default()
        }))
    }

    // ===== 快照 =====

    async fn get_config_snapshot(&self) -> ConfigResult<Option<String>> {
        Ok(Some(self.get_config_snapshot_json()?))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 预测器
    pub const PREDICTOR_KIND: &str = "predictor_kind";
    pub const PREDICTOR_COMMAND: &str = "predictor_command";
    pub const PREDICTOR_TIMEOUT_SECS: &str = "predictor_timeout_secs";
    pub const REGRESSION_DEGREE: &str = "regression_degree";

    // 优化
    pub const PARALLEL_OPTIMIZATION: &str = "parallel_optimization";

    // 预算超限处理
    pub const RECONCILE_ORDER: &str = "reconcile_order";
}
