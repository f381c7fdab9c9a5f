// ==========================================
// 道路养护计划系统 - 预算超限处理
// ==========================================
// 职责: 月度计划总费用超过当月预算时，逐条清空道路分配直至不超限
// 规则:
// - 只清空非空分配
// - 剔除顺序由 ReconcileOrder 决定（默认高优先级先剔除），
//   同优先级按费用升序，再按 RoadId 升序
// - 被剔除道路保留空计划条目，其改善量记为未满足
// 红线: 结束时总费用 ≤ 预算
// ==========================================

use crate::domain::plan::RoadAllocation;
use crate::domain::road::Road;
use crate::domain::types::RoadId;
use crate::engine::error::{PlanningError, PlanningResult};
use crate::engine::strategy::ReconcileOrder;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// 被剔除的道路
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredRoad {
    pub road_id: RoadId,
    pub unmet_change: f64,  // 未满足的改善量
    pub released_cost: f64, // 释放的费用
}

/// 处理结果
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub plan: BTreeMap<RoadId, RoadAllocation>,
    pub total_cost: f64,
    pub surplus: f64,
    pub deferred: Vec<DeferredRoad>,
}

// ==========================================
// OverflowReconciler - 预算超限处理器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct OverflowReconciler {
    order: ReconcileOrder,
}

impl OverflowReconciler {
    pub fn new(order: ReconcileOrder) -> Self {
        Self { order }
    }

    pub fn order(&self) -> ReconcileOrder {
        self.order
    }

    /// 裁剪月度计划直至不超过预算
    ///
    /// # 参数
    /// - `plan`: 优化器产出的分配（按 RoadId 索引）
    /// - `roads`: 道路主数据（取优先级）
    /// - `budget`: 当月预算上限
    pub fn reconcile(
        &self,
        mut plan: BTreeMap<RoadId, RoadAllocation>,
        roads: &[Road],
        budget: f64,
    ) -> PlanningResult<ReconcileOutcome> {
        let priorities: HashMap<RoadId, f64> = roads.iter().map(|r| (r.id, r.priority)).collect();

        let mut total_cost = total_of(&plan);
        let mut deferred = Vec::new();

        if total_cost > budget {
            let mut candidates = Vec::new();
            for allocation in plan.values().filter(|a| !a.is_empty()) {
                let priority = priorities
                    .get(&allocation.road_id)
                    .copied()
                    .ok_or_else(|| PlanningError::not_found("Road", allocation.road_id))?;
                candidates.push((allocation.road_id, priority, allocation.cost));
            }
            candidates.sort_by(|a, b| self.compare(a, b));

            for (road_id, _, _) in candidates {
                if total_cost <= budget {
                    break;
                }
                let Some(allocation) = plan.get_mut(&road_id) else {
                    continue;
                };
                let released_cost = allocation.cost;
                let unmet_change = allocation.required_change;
                allocation.clear();
                // 每次重新求和，避免逐次相减的累计误差
                total_cost = total_of(&plan);

                warn!(
                    road_id = %road_id,
                    unmet_change,
                    released_cost,
                    budget,
                    order = self.order.as_str(),
                    "预算超限，剔除道路本月作业"
                );
                deferred.push(DeferredRoad {
                    road_id,
                    unmet_change,
                    released_cost,
                });
            }
        }

        Ok(ReconcileOutcome {
            plan,
            total_cost,
            surplus: budget - total_cost,
            deferred,
        })
    }

    fn compare(&self, a: &(RoadId, f64, f64), b: &(RoadId, f64, f64)) -> Ordering {
        let by_priority = match self.order {
            ReconcileOrder::HighestPriorityFirst => b.1.total_cmp(&a.1),
            ReconcileOrder::LowestPriorityFirst => a.1.total_cmp(&b.1),
        };
        by_priority
            .then_with(|| a.2.total_cmp(&b.2))
            .then_with(|| a.0.cmp(&b.0))
    }
}

fn total_of(plan: &BTreeMap<RoadId, RoadAllocation>) -> f64 {
    plan.values().map(|a| a.cost).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::estimate::Estimate;
    use proptest::collection::vec as prop_vec;
    use proptest::prelude::{prop_assert, proptest};

    fn allocation(road: i64, change: f64, cost: f64) -> RoadAllocation {
        RoadAllocation {
            road_id: RoadId(road),
            required_change: change,
            estimates: vec![Estimate::new(road * 100, change, cost, road)],
            cost,
        }
    }

    fn plan_of(items: Vec<RoadAllocation>) -> BTreeMap<RoadId, RoadAllocation> {
        items.into_iter().map(|a| (a.road_id, a)).collect()
    }

    #[test]
    fn test_within_budget_untouched() {
        let roads = vec![Road::new(1, "R1", 1.0), Road::new(2, "R2", 3.0)];
        let plan = plan_of(vec![allocation(1, 0.2, 10.0), allocation(2, 0.4, 20.0)]);

        let outcome = OverflowReconciler::default().reconcile(plan, &roads, 30.0).unwrap();
        assert!(outcome.deferred.is_empty());
        assert_eq!(outcome.total_cost, 30.0);
        assert_eq!(outcome.surplus, 0.0);
    }

    #[test]
    fn test_highest_priority_removed_first() {
        let roads = vec![Road::new(1, "R1", 1.0), Road::new(2, "R2", 3.0)];
        let plan = plan_of(vec![allocation(1, 0.2, 20_000.0), allocation(2, 0.9, 20_000.0)]);

        let outcome = OverflowReconciler::default()
            .reconcile(plan, &roads, 30_000.0)
            .unwrap();
        assert_eq!(outcome.deferred.len(), 1);
        assert_eq!(outcome.deferred[0].road_id, RoadId(2));
        assert_eq!(outcome.deferred[0].unmet_change, 0.9);
        assert!(outcome.plan[&RoadId(2)].is_empty());
        assert_eq!(outcome.total_cost, 20_000.0);
        assert_eq!(outcome.surplus, 10_000.0);
    }

    #[test]
    fn test_lowest_priority_order() {
        let roads = vec![Road::new(1, "R1", 1.0), Road::new(2, "R2", 3.0)];
        let plan = plan_of(vec![allocation(1, 0.2, 20_000.0), allocation(2, 0.9, 20_000.0)]);

        let outcome = OverflowReconciler::new(ReconcileOrder::LowestPriorityFirst)
            .reconcile(plan, &roads, 30_000.0)
            .unwrap();
        assert_eq!(outcome.deferred[0].road_id, RoadId(1));
    }

    #[test]
    fn test_equal_priority_cheaper_first_then_id() {
        let roads = vec![
            Road::new(1, "R1", 2.0),
            Road::new(2, "R2", 2.0),
            Road::new(3, "R3", 2.0),
        ];
        let plan = plan_of(vec![
            allocation(1, 0.5, 50.0),
            allocation(2, 0.1, 10.0),
            allocation(3, 0.1, 10.0),
        ]);

        let outcome = OverflowReconciler::default().reconcile(plan, &roads, 55.0).unwrap();
        let removed: Vec<RoadId> = outcome.deferred.iter().map(|d| d.road_id).collect();
        assert_eq!(removed, vec![RoadId(2), RoadId(3)]);
        assert_eq!(outcome.total_cost, 50.0);
    }

    #[test]
    fn test_empty_allocations_never_deferred() {
        let roads = vec![Road::new(1, "R1", 9.0), Road::new(2, "R2", 1.0)];
        let plan = plan_of(vec![RoadAllocation::empty(RoadId(1), 0.0), allocation(2, 0.3, 40.0)]);

        let outcome = OverflowReconciler::default().reconcile(plan, &roads, 10.0).unwrap();
        assert_eq!(outcome.deferred.len(), 1);
        assert_eq!(outcome.deferred[0].road_id, RoadId(2));
        assert_eq!(outcome.total_cost, 0.0);
        assert_eq!(outcome.plan.len(), 2);
    }

    #[test]
    fn test_tiny_overrun_is_not_tolerated() {
        let roads = vec![Road::new(1, "R1", 1.0)];
        let plan = plan_of(vec![allocation(1, 0.1, 5e-7)]);

        let outcome = OverflowReconciler::default().reconcile(plan, &roads, 0.0).unwrap();
        assert_eq!(outcome.deferred.len(), 1);
        assert_eq!(outcome.total_cost, 0.0);
        assert_eq!(outcome.surplus, 0.0);
    }

    #[test]
    fn test_unknown_road_is_not_found() {
        let plan = plan_of(vec![allocation(5, 0.3, 40.0)]);
        let err = OverflowReconciler::default().reconcile(plan, &[], 10.0).unwrap_err();
        assert!(matches!(err, PlanningError::NotFound { .. }));
    }

    proptest! {
        #[test]
        fn prop_reconcile_fits_budget(
            costs in prop_vec((0u32..10_000, 0u32..5), 1..12),
            budget in 0u32..50_000,
        ) {
            let roads: Vec<Road> = costs
                .iter()
                .enumerate()
                .map(|(i, (_, p))| Road::new(i as i64 + 1, format!("R{}", i + 1), *p as f64))
                .collect();
            let plan = plan_of(
                costs
                    .iter()
                    .enumerate()
                    .map(|(i, (c, _))| allocation(i as i64 + 1, 0.1, *c as f64))
                    .collect(),
            );

            let outcome = OverflowReconciler::default()
                .reconcile(plan, &roads, budget as f64)
                .unwrap();
            prop_assert!(outcome.total_cost <= budget as f64);
            prop_assert!(outcome.surplus >= 0.0);
            prop_assert!(outcome.plan.len() == costs.len());
        }
    }
}
