// ==========================================
// 道路养护计划系统 - 计划配置读取 Trait
// ==========================================
// 职责: 定义计划引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::engine::strategy::{PredictorKind, ReconcileOrder};
use async_trait::async_trait;
use std::error::Error;

/// 配置读取结果
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// PlanningConfigReader Trait
// ==========================================
// 用途: 计划编排器所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）、测试中的 MockConfig
#[async_trait]
pub trait PlanningConfigReader: Send + Sync {
    // ===== 预测器配置 =====

    /// 获取预测器类型
    ///
    /// # 默认值
    /// - regression
    async fn get_predictor_kind(&self) -> ConfigResult<PredictorKind>;

    /// 获取外部预测脚本命令（predictor_kind = script 时必填）
    ///
    /// # 返回
    /// - Some(String): 命令行（程序 + 参数，空白分隔）
    /// - None: 未配置
    async fn get_predictor_command(&self) -> ConfigResult<Option<String>>;

    /// 获取预测超时（秒）
    ///
    /// # 默认值
    /// - 30
    async fn get_predictor_timeout_secs(&self) -> ConfigResult<u64>;

    /// 获取回归预测的多项式次数（1 或 2）
    ///
    /// # 默认值
    /// - 2
    async fn get_regression_degree(&self) -> ConfigResult<usize>;

    // ===== 优化与预算配置 =====

    /// 是否并行执行逐路搜索
    ///
    /// # 默认值
    /// - true
    async fn get_parallel_optimization(&self) -> ConfigResult<bool>;

    /// 获取预算超限剔除顺序
    ///
    /// # 默认值
    /// - highest_priority_first
    async fn get_reconcile_order(&self) -> ConfigResult<ReconcileOrder>;

    // ===== 快照 =====

    /// 获取配置快照（JSON），写入 PlanRun 以便复现
    async fn get_config_snapshot(&self) -> ConfigResult<Option<String>> {
        Ok(None)
    }
}
