// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use road_works_dss::config::{ConfigResult, PlanningConfigReader};
use road_works_dss::engine::{PredictorKind, ReconcileOrder};

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub predictor_kind: PredictorKind,
    pub predictor_command: Option<String>,
    pub predictor_timeout_secs: u64,
    pub regression_degree: usize,
    pub parallel_optimization: bool,
    pub reconcile_order: ReconcileOrder,
}

impl MockConfig {
    /// 创建默认配置（与 ConfigManager 的默认值一致）
    pub fn default() -> Self {
        Self {
            predictor_kind: PredictorKind::Regression,
            predictor_command: None,
            predictor_timeout_secs: 30,
            regression_degree: 2,
            parallel_optimization: true,
            reconcile_order: ReconcileOrder::HighestPriorityFirst,
        }
    }

    /// 串行优化
    pub fn serial() -> Self {
        let mut config = Self::default();
        config.parallel_optimization = false;
        config
    }

    /// 指定剔除顺序
    pub fn with_order(order: ReconcileOrder) -> Self {
        let mut config = Self::default();
        config.reconcile_order = order;
        config
    }

    /// 指定预测超时
    pub fn with_timeout(secs: u64) -> Self {
        let mut config = Self::default();
        config.predictor_timeout_secs = secs;
        config
    }
}

#[async_trait]
impl PlanningConfigReader for MockConfig {
    async fn get_predictor_kind(&self) -> ConfigResult<PredictorKind> {
        Ok(self.predictor_kind)
    }

    async fn get_predictor_command(&self) -> ConfigResult<Option<String>> {
        Ok(self.predictor_command.clone())
    }

    async fn get_predictor_timeout_secs(&self) -> ConfigResult<u64> {
        Ok(self.predictor_timeout_secs)
    }

    async fn get_regression_degree(&self) -> ConfigResult<usize> {
        Ok(self.regression_degree)
    }

    async fn get_parallel_optimization(&self) -> ConfigResult<bool> {
        Ok(self.parallel_optimization)
    }

    async fn get_reconcile_order(&self) -> ConfigResult<ReconcileOrder> {
        Ok(self.reconcile_order)
    }
}
