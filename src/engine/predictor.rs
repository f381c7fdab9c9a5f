// ==========================================
// 道路养护计划系统 - 技术状况预测器
// ==========================================
// 职责: 给定当前状况与历史记录，预测下一个月每条道路的评分
// 实现:
// - RegressionPredictor: 内置最小二乘多项式外推
// - ScriptPredictor: 外部进程（stdin 写入 JSON，stdout 读取 {"road_id": score}）
// 说明: 输出由 ConditionTracker 统一规范化，预测器本身不截断
// ==========================================

use crate::domain::condition::{ConditionRecord, RoadConditionMap};
use crate::domain::types::{PlanPeriod, RoadId};
use crate::engine::error::{PlanningError, PlanningResult};
use crate::engine::strategy::PredictorKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

// ==========================================
// ConditionPredictor Trait
// ==========================================
#[async_trait]
pub trait ConditionPredictor: Send + Sync {
    /// 预测 `period` 月末每条道路的技术状况
    ///
    /// # 参数
    /// - `period`: 被预测的月份
    /// - `current`: 当前（月初）状况
    /// - `history`: 本次运行可见的历史记录（按道路、年、月排序）
    async fn predict(
        &self,
        period: PlanPeriod,
        current: &RoadConditionMap,
        history: &[ConditionRecord],
    ) -> PlanningResult<RoadConditionMap>;

    /// 预测器名称（日志用）
    fn name(&self) -> &'static str;
}

/// 按配置构建预测器
pub fn build_predictor(
    kind: PredictorKind,
    command: Option<&str>,
    regression_degree: usize,
) -> PlanningResult<Arc<dyn ConditionPredictor>> {
    match kind {
        PredictorKind::Regression => Ok(Arc::new(RegressionPredictor::new(regression_degree))),
        PredictorKind::Script => {
            let command = command.ok_or_else(|| {
                PlanningError::ConfigError("predictor_kind=script 但未配置 predictor_command".to_string())
            })?;
            Ok(Arc::new(ScriptPredictor::from_command_line(command)?))
        }
    }
}

/// 按道路收集 `period` 之前的评分序列（时间升序）
fn series_before(history: &[ConditionRecord], period: PlanPeriod) -> BTreeMap<RoadId, Vec<f64>> {
    series_by_road(history.iter().filter(|r| r.period().map_or(false, |p| p < period)))
}

fn series_by_road<'a>(records: impl Iterator<Item = &'a ConditionRecord>) -> BTreeMap<RoadId, Vec<f64>> {
    let mut sorted: Vec<&ConditionRecord> = records.collect();
    sorted.sort_by_key(|r| (r.road_id, r.year, r.month));

    let mut series: BTreeMap<RoadId, Vec<f64>> = BTreeMap::new();
    for record in sorted {
        series.entry(record.road_id).or_default().push(record.condition);
    }
    series
}

/// 回归次数的检验结果
///
/// 每条道路留出最后一个点作为检验值，用其余点拟合并外推一步。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionMethodScore {
    pub degree: usize,
    pub samples: usize, // 参与检验的道路数
    pub mse: f64,
    pub mae: f64,
}

// ==========================================
// RegressionPredictor - 多项式回归外推
// ==========================================
#[derive(Debug, Clone)]
pub struct RegressionPredictor {
    degree: usize,
}

impl RegressionPredictor {
    /// 次数限定在 1..=2
    pub fn new(degree: usize) -> Self {
        Self {
            degree: degree.clamp(1, 2),
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// 以下标 0..n 为自变量拟合，返回在 x = n 处的外推值
    ///
    /// 点数不足 degree+1 时返回 None
    pub fn extrapolate(&self, values: &[f64]) -> Option<f64> {
        (1..=self.degree)
            .rev()
            .find_map(|degree| extrapolate_with_degree(values, degree))
    }

    /// 比较 1 次与 2 次回归在历史数据上的误差
    ///
    /// 点数不足以按某一次数拟合的道路不计入该次数；没有任何样本的次数不返回。
    pub fn compare_degrees(history: &[ConditionRecord]) -> Vec<PredictionMethodScore> {
        let series = series_by_road(history.iter());

        (1..=2)
            .filter_map(|degree| {
                let errors: Vec<f64> = series
                    .values()
                    .filter_map(|values| {
                        let (actual, train) = values.split_last()?;
                        extrapolate_with_degree(train, degree).map(|predicted| predicted - actual)
                    })
                    .collect();
                if errors.is_empty() {
                    return None;
                }

                let n = errors.len() as f64;
                let score = PredictionMethodScore {
                    degree,
                    samples: errors.len(),
                    mse: errors.iter().map(|e| e * e).sum::<f64>() / n,
                    mae: errors.iter().map(|e| e.abs()).sum::<f64>() / n,
                };
                debug!(degree, samples = score.samples, mse = score.mse, mae = score.mae, "回归检验");
                Some(score)
            })
            .collect()
    }
}

/// 按固定次数拟合并在 x = n 处外推；点数不足或矩阵奇异时返回 None
fn extrapolate_with_degree(values: &[f64], degree: usize) -> Option<f64> {
    if values.len() <= degree {
        return None;
    }
    let coeffs = fit_polynomial(values, degree)?;
    let x = values.len() as f64;
    Some(coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c))
}

impl Default for RegressionPredictor {
    fn default() -> Self {
        Self::new(2)
    }
}

/// 最小二乘多项式拟合（正规方程 + 高斯消元）
///
/// 返回系数 [c0, c1, ..., c_degree]；矩阵奇异时返回 None
fn fit_polynomial(values: &[f64], degree: usize) -> Option<Vec<f64>> {
    let size = degree + 1;
    let mut matrix = vec![vec![0.0f64; size + 1]; size];

    for (i, y) in values.iter().enumerate() {
        let x = i as f64;
        let powers: Vec<f64> = (0..=2 * degree).map(|p| x.powi(p as i32)).collect();
        for row in 0..size {
            for col in 0..size {
                matrix[row][col] += powers[row + col];
            }
            matrix[row][size] += powers[row] * y;
        }
    }

    for pivot in 0..size {
        let best = (pivot..size).max_by(|a, b| matrix[*a][pivot].abs().total_cmp(&matrix[*b][pivot].abs()))?;
        if matrix[best][pivot].abs() < 1e-12 {
            return None;
        }
        matrix.swap(pivot, best);
        for row in 0..size {
            if row == pivot {
                continue;
            }
            let factor = matrix[row][pivot] / matrix[pivot][pivot];
            for col in pivot..=size {
                matrix[row][col] -= factor * matrix[pivot][col];
            }
        }
    }

    Some((0..size).map(|i| matrix[i][size] / matrix[i][i]).collect())
}

#[async_trait]
impl ConditionPredictor for RegressionPredictor {
    async fn predict(
        &self,
        period: PlanPeriod,
        current: &RoadConditionMap,
        history: &[ConditionRecord],
    ) -> PlanningResult<RoadConditionMap> {
        let series = series_before(history, period);
        let mut predicted = RoadConditionMap::new();

        for (road_id, current_value) in current.iter() {
            let values = series.get(&road_id).map(Vec::as_slice).unwrap_or(&[]);
            let value = match self.extrapolate(values) {
                Some(v) => v,
                None => {
                    debug!(road_id = %road_id, points = values.len(), "历史点数不足，沿用最近值");
                    values.last().copied().unwrap_or(current_value)
                }
            };
            predicted.insert(road_id, value);
        }
        Ok(predicted)
    }

    fn name(&self) -> &'static str {
        "regression"
    }
}

// ==========================================
// ScriptPredictor - 外部脚本预测
// ==========================================

/// 写入脚本 stdin 的请求体
#[derive(Debug, Serialize)]
struct ScriptRequest<'a> {
    period: PlanPeriod,
    current: &'a RoadConditionMap,
    history: &'a [ConditionRecord],
}

#[derive(Debug, Clone)]
pub struct ScriptPredictor {
    program: String,
    args: Vec<String>,
}

impl ScriptPredictor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// 按空白切分命令行（首段为程序，其余为参数）
    pub fn from_command_line(command: &str) -> PlanningResult<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| PlanningError::ConfigError("predictor_command 为空".to_string()))?;
        Ok(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl ConditionPredictor for ScriptPredictor {
    async fn predict(
        &self,
        period: PlanPeriod,
        current: &RoadConditionMap,
        history: &[ConditionRecord],
    ) -> PlanningResult<RoadConditionMap> {
        let payload = serde_json::to_vec(&ScriptRequest {
            period,
            current,
            history,
        })
        .map_err(|e| PlanningError::PredictionUnavailable(format!("请求序列化失败: {}", e)))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PlanningError::PredictionUnavailable(format!("无法启动 {}: {}", self.program, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&payload)
                .await
                .map_err(|e| PlanningError::PredictionUnavailable(format!("写入 stdin 失败: {}", e)))?;
            // 关闭 stdin，脚本据此结束读取
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| PlanningError::PredictionUnavailable(format!("等待脚本结束失败: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(program = %self.program, status = %output.status, stderr = %stderr.trim(), "预测脚本异常退出");
            return Err(PlanningError::PredictionUnavailable(format!(
                "脚本退出状态 {}",
                output.status
            )));
        }

        let predicted: RoadConditionMap = serde_json::from_slice(&output.stdout).map_err(|e| {
            PlanningError::PredictionUnavailable(format!("脚本输出不是合法的 JSON 映射: {}", e))
        })?;
        debug!(program = %self.program, roads = predicted.len(), "脚本预测完成");
        Ok(predicted)
    }

    fn name(&self) -> &'static str {
        "script"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(road: i64, values: &[f64]) -> Vec<ConditionRecord> {
        let mut period = PlanPeriod::new(2023, 1).unwrap();
        values
            .iter()
            .map(|v| {
                let record = ConditionRecord::new(RoadId(road), period, *v);
                period = period.next();
                record
            })
            .collect()
    }

    #[test]
    fn test_fit_linear_exact() {
        let predictor = RegressionPredictor::new(1);
        let v = predictor.extrapolate(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!((v - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_quadratic_exact() {
        let predictor = RegressionPredictor::new(2);
        // y = x^2
        let v = predictor.extrapolate(&[0.0, 1.0, 4.0, 9.0]).unwrap();
        assert!((v - 16.0).abs() < 1e-6);
    }

    #[test]
    fn test_extrapolate_falls_back_to_lower_degree() {
        let predictor = RegressionPredictor::new(2);
        // 两个点只能拟合直线
        let v = predictor.extrapolate(&[2.0, 3.0]).unwrap();
        assert!((v - 4.0).abs() < 1e-9);
        assert!(predictor.extrapolate(&[2.0]).is_none());
        assert!(predictor.extrapolate(&[]).is_none());
    }

    #[test]
    fn test_compare_degrees_leaves_last_point_out() {
        // 道路 1 严格线性，道路 2 严格二次，道路 3 点数不足
        let mut history = history_of(1, &[5.0, 4.5, 4.0, 3.5]);
        history.extend(history_of(2, &[0.0, 1.0, 4.0, 9.0]));
        history.extend(history_of(3, &[2.0, 2.5]));

        let scores = RegressionPredictor::compare_degrees(&history);
        assert_eq!(scores.len(), 2);

        let linear = &scores[0];
        assert_eq!(linear.degree, 1);
        assert_eq!(linear.samples, 2);
        // 道路 2: 直线拟合 [0, 1, 4] 得 y = -1/3 + 2x，x=3 处为 17/3，误差 -10/3
        let road_2_error: f64 = 17.0 / 3.0 - 9.0;
        assert!((linear.mae - road_2_error.abs() / 2.0).abs() < 1e-9);
        assert!((linear.mse - road_2_error * road_2_error / 2.0).abs() < 1e-9);

        let quadratic = &scores[1];
        assert_eq!(quadratic.degree, 2);
        assert_eq!(quadratic.samples, 2);
        assert!(quadratic.mse < 1e-9);
        assert!(quadratic.mae < 1e-6);
    }

    #[test]
    fn test_compare_degrees_without_enough_history() {
        let history = history_of(1, &[3.0, 2.9]);
        let scores = RegressionPredictor::compare_degrees(&history);
        // 留一后只剩 1 个点，两种次数都无法拟合
        assert!(scores.is_empty());
        assert!(RegressionPredictor::compare_degrees(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_regression_predict_uses_history_before_period() {
        let predictor = RegressionPredictor::new(1);
        let mut history = history_of(1, &[4.0, 3.5, 3.0]);
        // 2023-04 及之后的记录不参与 2023-04 的预测
        history.push(ConditionRecord::new(RoadId(1), PlanPeriod::new(2023, 4).unwrap(), 1.0));

        let current: RoadConditionMap = [(RoadId(1), 3.0), (RoadId(2), 2.2)].into_iter().collect();
        let predicted = predictor
            .predict(PlanPeriod::new(2023, 4).unwrap(), &current, &history)
            .await
            .unwrap();

        assert!((predicted.get(RoadId(1)).unwrap() - 2.5).abs() < 1e-9);
        // 无历史 → 沿用当前状况
        assert_eq!(predicted.get(RoadId(2)), Some(2.2));
    }

    #[test]
    fn test_build_predictor() {
        assert_eq!(
            build_predictor(PredictorKind::Regression, None, 2).unwrap().name(),
            "regression"
        );
        assert!(matches!(
            build_predictor(PredictorKind::Script, None, 2),
            Err(PlanningError::ConfigError(_))
        ));
        let script = build_predictor(PredictorKind::Script, Some("python3 predict.py"), 2).unwrap();
        assert_eq!(script.name(), "script");
    }

    #[test]
    fn test_script_command_line_parsing() {
        let script = ScriptPredictor::from_command_line("  python3  -u predict.py ").unwrap();
        assert_eq!(script.program(), "python3");
        assert_eq!(script.args, vec!["-u".to_string(), "predict.py".to_string()]);
        assert!(ScriptPredictor::from_command_line("   ").is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_script_predictor_reads_stdout_json() {
        let script = ScriptPredictor::new(
            "sh",
            vec![
                "-c".to_string(),
                r#"cat > /dev/null; echo '{"1": 2.04, "2": 3.5}'"#.to_string(),
            ],
        );
        let current: RoadConditionMap = [(RoadId(1), 3.0), (RoadId(2), 2.0)].into_iter().collect();
        let predicted = script
            .predict(PlanPeriod::new(2024, 1).unwrap(), &current, &[])
            .await
            .unwrap();
        assert_eq!(predicted.get(RoadId(1)), Some(2.04));
        assert_eq!(predicted.get(RoadId(2)), Some(3.5));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_script_predictor_failure_is_prediction_unavailable() {
        let script = ScriptPredictor::new("sh", vec!["-c".to_string(), "exit 3".to_string()]);
        let err = script
            .predict(PlanPeriod::new(2024, 1).unwrap(), &RoadConditionMap::new(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, PlanningError::PredictionUnavailable(_)));

        let missing = ScriptPredictor::new("definitely-not-a-real-binary-xyz", vec![]);
        assert!(missing
            .predict(PlanPeriod::new(2024, 1).unwrap(), &RoadConditionMap::new(), &[])
            .await
            .is_err());
    }
}
