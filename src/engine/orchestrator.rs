// ==========================================
// 道路养护计划系统 - 计划编排器
// ==========================================
// 用途: 逐月推进模拟，协调状况追踪、预测、优化、预算处理与落库
// 流程:
//   Init → ComputeInitialConditions →
//   每月 { Predict → ComputeDelta → Optimize → Reconcile → Persist → Advance } → Done
// 红线:
// - 任一步骤失败即终止运行（已提交月份保留，失败月份不落库）
// - 每月计划条目与新状况记录在同一事务内提交
// ==========================================

use crate::config::PlanningConfigReader;
use crate::domain::condition::{ConditionRecord, RoadConditionMap};
use crate::domain::plan::{FinancialSummary, PlanEntry, PlanRun};
use crate::domain::road::Road;
use crate::domain::types::{round_to_tenth, PlanPeriod, MAX_CONDITION, MIN_CONDITION};
use crate::engine::budget::BudgetAllocator;
use crate::engine::condition::ConditionTracker;
use crate::engine::error::{PlanningError, PlanningResult};
use crate::engine::optimizer::{EstimateCatalogue, EstimateOptimizer};
use crate::engine::predictor::ConditionPredictor;
use crate::engine::reconciler::{OverflowReconciler, ReconcileOutcome};
use crate::engine::repositories::PlanningRepositories;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// PlanRequest / PlanResult
// ==========================================

/// 计划请求
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub initial_year: i32,
    pub initial_month: u32,
    pub year_count: u32,
    pub budget: f64,
}

/// 计划结果
#[derive(Debug, Clone)]
pub struct PlanResult {
    pub run: PlanRun,
    pub entries: Vec<PlanEntry>,     // 全部月份的计划条目（按月、道路排序）
    pub summary: FinancialSummary,
    pub deferred_count: usize,       // 因预算被剔除的道路-月次数
}

/// 单次运行的配置（运行开始时读取一次）
#[derive(Debug, Clone)]
struct RunSettings {
    predictor_timeout: Duration,
    parallel_optimization: bool,
    reconciler: OverflowReconciler,
    config_snapshot: Option<String>,
}

// ==========================================
// PlanningOrchestrator - 计划编排器
// ==========================================
pub struct PlanningOrchestrator<C>
where
    C: PlanningConfigReader + ?Sized,
{
    config: Arc<C>,
    repos: PlanningRepositories,
    predictor: Arc<dyn ConditionPredictor>,
    tracker: ConditionTracker,
    allocator: BudgetAllocator,
}

impl<C> PlanningOrchestrator<C>
where
    C: PlanningConfigReader + ?Sized,
{
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - config: 配置读取器
    /// - repos: 仓储集合
    /// - predictor: 技术状况预测器
    pub fn new(
        config: Arc<C>,
        repos: PlanningRepositories,
        predictor: Arc<dyn ConditionPredictor>,
    ) -> Self {
        Self {
            config,
            repos,
            predictor,
            tracker: ConditionTracker::new(),
            allocator: BudgetAllocator::new(),
        }
    }

    async fn load_settings(&self) -> PlanningResult<RunSettings> {
        let config_err = |e: Box<dyn std::error::Error + Send + Sync>| PlanningError::ConfigError(e.to_string());

        let timeout_secs = self.config.get_predictor_timeout_secs().await.map_err(config_err)?;
        let parallel = self.config.get_parallel_optimization().await.map_err(config_err)?;
        let order = self.config.get_reconcile_order().await.map_err(config_err)?;
        let snapshot = self.config.get_config_snapshot().await.map_err(config_err)?;

        Ok(RunSettings {
            predictor_timeout: Duration::from_secs(timeout_secs),
            parallel_optimization: parallel,
            reconciler: OverflowReconciler::new(order),
            config_snapshot: snapshot,
        })
    }

    /// 生成多年度养护计划
    ///
    /// # 返回
    /// - Ok(PlanResult): 全部月份成功
    /// - Err: 第一个失败的步骤（此前已提交的月份保留在库中）
    #[instrument(skip(self), fields(predictor = self.predictor.name()))]
    pub async fn create_plan(&self, request: PlanRequest) -> PlanningResult<PlanResult> {
        // ==========================================
        // Init: 参数校验、预算分摊、读取配置
        // ==========================================
        let start = PlanPeriod::new(request.initial_year, request.initial_month).ok_or_else(|| {
            PlanningError::InvalidInput(format!("起始月份必须在 1..=12: {}", request.initial_month))
        })?;
        let month_count = self
            .allocator
            .horizon_month_count(request.initial_month, request.year_count)?;
        let mut schedule = self.allocator.amortize(request.budget, month_count)?;
        let settings = self.load_settings().await?;

        let roads = self.repos.road_repo.find_all()?;
        if roads.is_empty() {
            return Err(PlanningError::not_found("Road", "any"));
        }
        let catalogue = EstimateCatalogue::build(&self.repos.estimate_repo.find_all()?)?;
        let optimizer = EstimateOptimizer::new(catalogue);

        let run = PlanRun {
            run_id: Uuid::new_v4().to_string(),
            start_year: start.year,
            start_month: start.month,
            year_count: request.year_count,
            month_count,
            budget: request.budget,
            config_snapshot_json: settings.config_snapshot.clone(),
            created_at: Local::now().naive_local(),
        };
        self.repos.run_repo.create(&run)?;

        info!(
            run_id = %run.run_id,
            start = %start,
            month_count,
            budget = request.budget,
            roads = roads.len(),
            levels = optimizer.catalogue().len(),
            parallel = settings.parallel_optimization,
            reconcile_order = settings.reconciler.order().as_str(),
            "开始生成养护计划"
        );

        // ==========================================
        // ComputeInitialConditions
        // ==========================================
        let observed = self.repos.condition_repo.find_observed()?;
        let mut current = self.tracker.initial_conditions(&roads, &observed, start)?;
        debug!(run_id = %run.run_id, roads = current.len(), "初始状况已确定");

        // ==========================================
        // PerMonthCycle
        // ==========================================
        let mut entries = Vec::new();
        let mut deferred_count = 0usize;
        let mut period = start;

        for month_index in 0..month_count {
            let ceiling = schedule.ceiling(month_index).unwrap_or(0.0);
            info!(run_id = %run.run_id, period = %period, month_index, ceiling, "处理月份");

            let (outcome, predicted) = self
                .plan_month(&run, &roads, &optimizer, &settings, period, &current, ceiling)
                .await
                .map_err(|e| {
                    warn!(run_id = %run.run_id, period = %period, error = %e, "月度计划失败，终止运行");
                    e
                })?;
            let surplus = outcome.surplus;

            // Persist
            let (month_entries, next_conditions, deferred) =
                self.persist_month(&run, period, &current, outcome, predicted)?;
            deferred_count += deferred;

            // Advance
            if schedule.carry_surplus(month_index, surplus) {
                debug!(period = %period, surplus, "结余滚入下月");
            } else {
                info!(period = %period, surplus, "最后一个月结余不滚动，计入总结余");
            }

            entries.extend(month_entries);
            current = next_conditions;
            period = period.next();
        }

        // ==========================================
        // Done
        // ==========================================
        let summary = self.allocator.financial_summary(request.budget, &entries);
        info!(
            run_id = %run.run_id,
            entries = entries.len(),
            expenses = summary.expenses,
            balance = summary.balance,
            deferred_count,
            "养护计划生成完成"
        );

        Ok(PlanResult {
            run,
            entries,
            summary,
            deferred_count,
        })
    }

    /// 单月: Predict → ComputeDelta → Optimize → Reconcile
    ///
    /// 返回 (处理结果, 规范化后的预测)
    #[allow(clippy::too_many_arguments)]
    async fn plan_month(
        &self,
        run: &PlanRun,
        roads: &[Road],
        optimizer: &EstimateOptimizer,
        settings: &RunSettings,
        period: PlanPeriod,
        current: &RoadConditionMap,
        ceiling: f64,
    ) -> PlanningResult<(ReconcileOutcome, RoadConditionMap)> {
        // Predict
        let history = self.repos.condition_repo.find_history_for_run(&run.run_id)?;
        let raw = tokio::time::timeout(
            settings.predictor_timeout,
            self.predictor.predict(period, current, &history),
        )
        .await
        .map_err(|_| {
            PlanningError::PredictionUnavailable(format!(
                "预测超时（{} 秒）",
                settings.predictor_timeout.as_secs()
            ))
        })??;
        let predicted = self.tracker.normalize_predictions(roads, &raw)?;
        debug!(period = %period, "预测完成");

        // ComputeDelta
        let deltas = self.tracker.compute_deltas(roads, current, &predicted)?;
        deltas
            .ensure_complete(roads)
            .map_err(|road_id| PlanningError::not_found("RequiredChange", road_id))?;
        debug!(period = %period, "所需改善量计算完成");

        // Optimize
        let plan = if settings.parallel_optimization {
            optimizer.optimize_parallel(period, &deltas).await?
        } else {
            optimizer.optimize(period, &deltas)?
        };
        debug!(period = %period, "组合优化完成");

        // Reconcile
        let outcome = settings.reconciler.reconcile(plan, roads, ceiling)?;
        debug!(
            period = %period,
            total_cost = outcome.total_cost,
            surplus = outcome.surplus,
            deferred = outcome.deferred.len(),
            "预算处理完成"
        );

        Ok((outcome, predicted))
    }

    /// 落库：被剔除道路的预测值回退未满足的改善量，再与计划条目同事务提交
    ///
    /// 返回 (本月条目, 下月初始状况, 剔除道路数)
    fn persist_month(
        &self,
        run: &PlanRun,
        period: PlanPeriod,
        current: &RoadConditionMap,
        outcome: ReconcileOutcome,
        mut predicted: RoadConditionMap,
    ) -> PlanningResult<(Vec<PlanEntry>, RoadConditionMap, usize)> {
        for deferred in &outcome.deferred {
            if let Some(value) = predicted.get_mut(deferred.road_id) {
                *value = round_to_tenth((*value - deferred.unmet_change).clamp(MIN_CONDITION, MAX_CONDITION));
                debug!(
                    road_id = %deferred.road_id,
                    from = ?current.get(deferred.road_id),
                    to = *value,
                    "剔除道路状况回退"
                );
            }
        }

        let month_entries: Vec<PlanEntry> = outcome
            .plan
            .values()
            .map(|allocation| PlanEntry::from_allocation(&run.run_id, period, allocation))
            .collect();
        let records: Vec<ConditionRecord> = predicted
            .iter()
            .map(|(road_id, value)| ConditionRecord::new(road_id, period, value))
            .collect();

        self.repos
            .entry_repo
            .commit_month(&run.run_id, &month_entries, &records)?;
        debug!(period = %period, entries = month_entries.len(), "月度计划已提交");

        Ok((month_entries, predicted, outcome.deferred.len()))
    }
}
