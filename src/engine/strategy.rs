// ==========================================
// 道路养护计划系统 - 策略定义
// ==========================================
// 用途：
// - ReconcileOrder: 预算超限时剔除道路的顺序
// - PredictorKind: 技术状况预测器的实现选择
// ==========================================

use serde::{Deserialize, Serialize};

/// 预算超限剔除顺序
///
/// 默认值保留现行规则：优先级最高的道路先被剔除（待业务确认是否应反转）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOrder {
    HighestPriorityFirst,
    LowestPriorityFirst,
}

impl ReconcileOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOrder::HighestPriorityFirst => "highest_priority_first",
            ReconcileOrder::LowestPriorityFirst => "lowest_priority_first",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            ReconcileOrder::HighestPriorityFirst => "高优先级先剔除",
            ReconcileOrder::LowestPriorityFirst => "低优先级先剔除",
        }
    }
}

impl Default for ReconcileOrder {
    fn default() -> Self {
        ReconcileOrder::HighestPriorityFirst
    }
}

impl std::str::FromStr for ReconcileOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "highest_priority_first" | "highest-priority-first" => {
                Ok(ReconcileOrder::HighestPriorityFirst)
            }
            "lowest_priority_first" | "lowest-priority-first" => {
                Ok(ReconcileOrder::LowestPriorityFirst)
            }
            other => Err(format!("未知剔除顺序: {}", other)),
        }
    }
}

/// 预测器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorKind {
    /// 内置多项式回归
    Regression,
    /// 外部脚本（stdin/stdout JSON 协议）
    Script,
}

impl PredictorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictorKind::Regression => "regression",
            PredictorKind::Script => "script",
        }
    }
}

impl Default for PredictorKind {
    fn default() -> Self {
        PredictorKind::Regression
    }
}

impl std::str::FromStr for PredictorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regression" => Ok(PredictorKind::Regression),
            "script" => Ok(PredictorKind::Script),
            other => Err(format!("未知预测器类型: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_order_parse() {
        assert_eq!(
            "highest-priority-first".parse::<ReconcileOrder>().unwrap(),
            ReconcileOrder::HighestPriorityFirst
        );
        assert_eq!(
            " LOWEST_PRIORITY_FIRST ".parse::<ReconcileOrder>().unwrap(),
            ReconcileOrder::LowestPriorityFirst
        );
        assert!("random".parse::<ReconcileOrder>().is_err());
        assert_eq!(ReconcileOrder::default(), ReconcileOrder::HighestPriorityFirst);
    }

    #[test]
    fn test_predictor_kind_parse() {
        assert_eq!("script".parse::<PredictorKind>().unwrap(), PredictorKind::Script);
        assert_eq!(PredictorKind::default().as_str(), "regression");
    }
}
