// ==========================================
// 道路养护计划系统 - 养护计划 API
// ==========================================
// 职责: 生成计划、财务汇总、运行与条目查询
// ==========================================

use std::sync::Arc;

use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, PlanningConfigReader};
use crate::domain::plan::{FinancialSummary, PlanEntry, PlanRun};
use crate::domain::types::PlanPeriod;
use crate::engine::{
    build_predictor, BudgetAllocator, ConditionPredictor, ConditionTracker, PlanRequest,
    PlanResult, PlanningOrchestrator, PlanningRepositories, PredictionMethodScore,
    RegressionPredictor, MAX_YEAR_COUNT,
};

// ==========================================
// PlanningApi - 养护计划 API
// ==========================================

/// 养护计划API
///
/// 职责：
/// 1. 生成多年度养护计划（每次调用产生独立的 PlanRun）
/// 2. 财务汇总
/// 3. 计划运行与月度条目查询
pub struct PlanningApi {
    repos: PlanningRepositories,
    config_manager: Arc<ConfigManager>,
    // 指定时覆盖配置中的预测器
    predictor_override: Option<Arc<dyn ConditionPredictor>>,
    tracker: ConditionTracker,
    allocator: BudgetAllocator,
}

impl PlanningApi {
    /// 创建新的PlanningApi实例
    pub fn new(repos: PlanningRepositories, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            repos,
            config_manager,
            predictor_override: None,
            tracker: ConditionTracker::new(),
            allocator: BudgetAllocator::new(),
        }
    }

    /// 使用指定预测器（不再按配置构建）
    pub fn with_predictor(mut self, predictor: Arc<dyn ConditionPredictor>) -> Self {
        self.predictor_override = Some(predictor);
        self
    }

    // ==========================================
    // 计划生成
    // ==========================================

    /// 生成养护计划
    ///
    /// # 参数
    /// - initial_year / initial_month: 计划起始月
    /// - year_count: 计划年数
    /// - budget: 总预算
    ///
    /// # 返回
    /// - Ok(PlanResult): 运行信息、全部计划条目、财务汇总
    /// - Err(ApiError): 首个失败步骤（已提交的月份保留）
    pub async fn create_plan(
        &self,
        initial_year: i32,
        initial_month: u32,
        year_count: u32,
        budget: f64,
    ) -> ApiResult<PlanResult> {
        // 参数验证
        if !(1..=12).contains(&initial_month) {
            return Err(ApiError::InvalidInput(format!(
                "起始月份必须在 1-12 之间: {}",
                initial_month
            )));
        }
        if year_count == 0 || year_count > MAX_YEAR_COUNT {
            return Err(ApiError::InvalidInput(format!(
                "计划年数必须在 1-{} 之间: {}",
                MAX_YEAR_COUNT, year_count
            )));
        }
        if !budget.is_finite() || budget < 0.0 {
            return Err(ApiError::InvalidInput(format!("预算必须为非负数: {}", budget)));
        }

        let predictor = self.resolve_predictor().await?;
        let orchestrator =
            PlanningOrchestrator::new(self.config_manager.clone(), self.repos.clone(), predictor);

        let result = orchestrator
            .create_plan(PlanRequest {
                initial_year,
                initial_month,
                year_count,
                budget,
            })
            .await?;

        info!(
            run_id = %result.run.run_id,
            entries = result.entries.len(),
            balance = result.summary.balance,
            "计划生成成功"
        );
        Ok(result)
    }

    async fn resolve_predictor(&self) -> ApiResult<Arc<dyn ConditionPredictor>> {
        if let Some(predictor) = &self.predictor_override {
            return Ok(predictor.clone());
        }

        let config_err = |e: Box<dyn std::error::Error + Send + Sync>| ApiError::ConfigError(e.to_string());
        let kind = self.config_manager.get_predictor_kind().await.map_err(config_err)?;
        let command = self.config_manager.get_predictor_command().await.map_err(config_err)?;
        let degree = self.config_manager.get_regression_degree().await.map_err(config_err)?;

        Ok(build_predictor(kind, command.as_deref(), degree)?)
    }

    /// 比较回归次数（基于全部实测记录）
    ///
    /// # 返回
    /// - Err(NotFound): 没有任何道路的历史足以检验
    pub fn compare_prediction_methods(&self) -> ApiResult<Vec<PredictionMethodScore>> {
        let observed = self.repos.condition_repo.find_observed()?;
        let scores = RegressionPredictor::compare_degrees(&observed);
        if scores.is_empty() {
            return Err(ApiError::NotFound(
                "实测历史不足，无法比较预测方法（每条道路至少需要 3 个月）".to_string(),
            ));
        }
        for score in &scores {
            info!(
                degree = score.degree,
                samples = score.samples,
                mse = score.mse,
                mae = score.mae,
                "预测方法比较"
            );
        }
        Ok(scores)
    }

    // ==========================================
    // 财务汇总
    // ==========================================

    /// 财务汇总: 支出 = Σ 条目费用，结余 = 预算 - 支出
    pub fn financial_summary(&self, budget: f64, plans: &[PlanEntry]) -> FinancialSummary {
        self.allocator.financial_summary(budget, plans)
    }

    /// 按运行ID汇总（预算取运行记录中的总预算）
    pub fn financial_summary_for_run(&self, run_id: &str) -> ApiResult<FinancialSummary> {
        let run = self.get_run(run_id)?;
        let entries = self.repos.entry_repo.find_by_run(run_id)?;
        Ok(self.allocator.financial_summary(run.budget, &entries))
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 建议的计划起始月（最新实测记录的下一个月）
    pub fn next_horizon_start(&self) -> ApiResult<PlanPeriod> {
        let observed = self.repos.condition_repo.find_observed()?;
        Ok(self.tracker.next_horizon_start(&observed)?)
    }

    /// 查询全部计划运行（按创建时间倒序）
    pub fn list_runs(&self) -> ApiResult<Vec<PlanRun>> {
        Ok(self.repos.run_repo.list()?)
    }

    /// 查询单个计划运行
    pub fn get_run(&self, run_id: &str) -> ApiResult<PlanRun> {
        if run_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("运行ID不能为空".to_string()));
        }
        self.repos
            .run_repo
            .find_by_id(run_id)?
            .ok_or_else(|| ApiError::NotFound(format!("PlanRun(id={})不存在", run_id)))
    }

    /// 查询计划运行的全部条目
    pub fn list_plan_entries(&self, run_id: &str) -> ApiResult<Vec<PlanEntry>> {
        self.get_run(run_id)?;
        Ok(self.repos.entry_repo.find_by_run(run_id)?)
    }
}
