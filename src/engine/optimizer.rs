// ==========================================
// 道路养护计划系统 - 预算书组合优化
// ==========================================
// 职责: 为每条道路挑选总费用最低的工作等级多重集，
//       使等级之和精确等于所需改善量
// 规则:
// - 每个等级只保留最便宜的预算书（同价取 ID 最小）
// - 等级按升序枚举，组合内下标不减（允许重复）
// - 费用相同时先找到的组合胜出
// 红线: 以整数"十分位"比较，精确相等才算命中
// ==========================================

use crate::domain::condition::RoadConditionMap;
use crate::domain::estimate::Estimate;
use crate::domain::plan::RoadAllocation;
use crate::domain::types::{
    from_tenths, is_on_tenth_grid, to_tenths, PlanPeriod, RoadId, MAX_CHANGE,
};
use crate::engine::error::{PlanningError, PlanningResult};
use futures::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument};

// ==========================================
// EstimateCatalogue - 搜索用预算书目录
// ==========================================

/// 目录中的一个工作等级
#[derive(Debug, Clone)]
pub struct CatalogueLevel {
    pub tenths: i64,        // 工作等级（十分位）
    pub estimate: Estimate, // 该等级最便宜的预算书
}

impl CatalogueLevel {
    pub fn level(&self) -> f64 {
        from_tenths(self.tenths)
    }

    pub fn cost(&self) -> f64 {
        self.estimate.cost
    }
}

/// 去重后的工作等级目录（按等级升序）
#[derive(Debug, Clone, Default)]
pub struct EstimateCatalogue {
    levels: Vec<CatalogueLevel>,
}

impl EstimateCatalogue {
    /// 由全部预算书构建目录
    ///
    /// # 错误
    /// - `InvalidCatalogue`: 等级 ≤ 0、超过 5.0、不在 0.1 网格上，或费用为负/非有限数
    pub fn build(estimates: &[Estimate]) -> PlanningResult<Self> {
        let mut cheapest: HashMap<i64, Estimate> = HashMap::new();

        for estimate in estimates {
            let level = estimate.level_of_works;
            if !level.is_finite() || level <= 0.0 || level > MAX_CHANGE + 1e-9 {
                return Err(PlanningError::InvalidCatalogue(format!(
                    "预算书 {} 的工作等级越界: {}",
                    estimate.id, level
                )));
            }
            if !is_on_tenth_grid(level) {
                return Err(PlanningError::InvalidCatalogue(format!(
                    "预算书 {} 的工作等级不是 0.1 的整数倍: {}",
                    estimate.id, level
                )));
            }
            if !estimate.cost.is_finite() || estimate.cost < 0.0 {
                return Err(PlanningError::InvalidCatalogue(format!(
                    "预算书 {} 的费用非法: {}",
                    estimate.id, estimate.cost
                )));
            }

            let tenths = to_tenths(level);
            match cheapest.get(&tenths) {
                Some(current)
                    if current.cost < estimate.cost
                        || (current.cost == estimate.cost && current.id <= estimate.id) => {}
                _ => {
                    cheapest.insert(tenths, estimate.clone());
                }
            }
        }

        let mut levels: Vec<CatalogueLevel> = cheapest
            .into_iter()
            .map(|(tenths, estimate)| CatalogueLevel { tenths, estimate })
            .collect();
        levels.sort_by_key(|l| l.tenths);

        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[CatalogueLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

// ==========================================
// 单目标搜索
// ==========================================

/// 搜索结果：选中的预算书（按等级升序，可重复）与总费用
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    pub estimates: Vec<Estimate>,
    pub cost: f64,
}

impl Combination {
    pub fn empty() -> Self {
        Self {
            estimates: Vec::new(),
            cost: 0.0,
        }
    }
}

/// 深度优先搜索的栈帧（每帧拥有自己的已选列表）
struct Frame {
    start: usize,
    sum: i64,
    cost: f64,
    chosen: Vec<usize>,
}

/// 最低费用的精确组合
///
/// # 参数
/// - `target`: 所需改善量（一位小数）
/// - `catalogue`: 预算书目录
///
/// # 返回
/// - `Ok(Combination::empty())`: target 为 0
/// - `Err(NoExactCombination)`: 没有任何多重集精确命中
pub fn best_combination(target: f64, catalogue: &EstimateCatalogue) -> PlanningResult<Combination> {
    let target_tenths = to_tenths(target);
    if target_tenths <= 0 {
        return Ok(Combination::empty());
    }

    let levels = catalogue.levels();
    let mut best: Option<(f64, Vec<usize>)> = None;
    let mut stack = vec![Frame {
        start: 0,
        sum: 0,
        cost: 0.0,
        chosen: Vec::new(),
    }];

    while let Some(frame) = stack.pop() {
        if frame.sum == target_tenths {
            // 严格更低才替换：费用相同保留先找到的组合
            if best.as_ref().map_or(true, |(cost, _)| frame.cost < *cost) {
                best = Some((frame.cost, frame.chosen));
            }
            continue;
        }

        // 逆序压栈，保证低下标先出栈（与递归枚举顺序一致）
        for index in (frame.start..levels.len()).rev() {
            let level = &levels[index];
            let sum = frame.sum + level.tenths;
            if sum > target_tenths {
                continue;
            }
            let cost = frame.cost + level.cost();
            if let Some((best_cost, _)) = &best {
                if cost >= *best_cost {
                    continue;
                }
            }
            let mut chosen = frame.chosen.clone();
            chosen.push(index);
            stack.push(Frame {
                start: index,
                sum,
                cost,
                chosen,
            });
        }
    }

    match best {
        Some((cost, chosen)) => Ok(Combination {
            estimates: chosen
                .into_iter()
                .map(|i| levels[i].estimate.clone())
                .collect(),
            cost,
        }),
        None => Err(PlanningError::NoExactCombination { target }),
    }
}

// ==========================================
// EstimateOptimizer - 逐路优化
// ==========================================
#[derive(Debug, Clone)]
pub struct EstimateOptimizer {
    catalogue: Arc<EstimateCatalogue>,
}

impl EstimateOptimizer {
    pub fn new(catalogue: EstimateCatalogue) -> Self {
        Self {
            catalogue: Arc::new(catalogue),
        }
    }

    pub fn catalogue(&self) -> &EstimateCatalogue {
        &self.catalogue
    }

    /// 串行优化：每条道路一个精确组合
    ///
    /// # 错误
    /// - `OptimizationFailed`: 某条道路的改善量无法精确组合（第一条失败的道路）
    #[instrument(skip(self, period, deltas), fields(period = %period, roads = deltas.len()))]
    pub fn optimize(
        &self,
        period: PlanPeriod,
        deltas: &RoadConditionMap,
    ) -> PlanningResult<BTreeMap<RoadId, RoadAllocation>> {
        let mut plan = BTreeMap::new();
        for (road_id, target) in deltas.iter() {
            let combination = best_combination(target, &self.catalogue)
                .map_err(|e| Self::attach_road(e, road_id, period))?;
            debug!(road_id = %road_id, target, cost = combination.cost, "组合完成");
            plan.insert(road_id, Self::to_allocation(road_id, target, combination));
        }
        Ok(plan)
    }

    /// 并行优化：每条道路一个阻塞任务，结果按 RoadId 合并
    #[instrument(skip(self, period, deltas), fields(period = %period, roads = deltas.len()))]
    pub async fn optimize_parallel(
        &self,
        period: PlanPeriod,
        deltas: &RoadConditionMap,
    ) -> PlanningResult<BTreeMap<RoadId, RoadAllocation>> {
        let tasks = deltas.iter().map(|(road_id, target)| {
            let catalogue = Arc::clone(&self.catalogue);
            async move {
                let joined =
                    tokio::task::spawn_blocking(move || best_combination(target, &catalogue)).await;
                (road_id, target, joined)
            }
        });

        let mut plan = BTreeMap::new();
        // join_all 保持输入顺序（即 RoadId 升序），失败时报告第一条失败的道路
        for (road_id, target, joined) in join_all(tasks).await {
            let combination = joined
                .map_err(|e| PlanningError::TaskFailed(format!("道路 {}: {}", road_id, e)))?
                .map_err(|e| Self::attach_road(e, road_id, period))?;
            plan.insert(road_id, Self::to_allocation(road_id, target, combination));
        }
        Ok(plan)
    }

    fn attach_road(err: PlanningError, road_id: RoadId, period: PlanPeriod) -> PlanningError {
        match err {
            PlanningError::NoExactCombination { target } => PlanningError::OptimizationFailed {
                road_id,
                period,
                target,
            },
            other => other,
        }
    }

    fn to_allocation(road_id: RoadId, target: f64, combination: Combination) -> RoadAllocation {
        RoadAllocation {
            road_id,
            required_change: target,
            estimates: combination.estimates,
            cost: combination.cost,
        }
    }
}
