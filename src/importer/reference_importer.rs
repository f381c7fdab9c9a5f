// ==========================================
// 道路养护计划系统 - 基础数据导入
// ==========================================
// 文件:
// - roads.csv:      id, number, priority, link
// - estimates.csv:  id, name, level_of_work, cost, link, road_id
// - conditions.csv: road_id, year, month, condition（月份可为数字或英文月名）
// 流程: 解析 → 逐行校验（失败即返回，带行号）→ 单事务写入
// ==========================================

use crate::domain::condition::ConditionRecord;
use crate::domain::estimate::Estimate;
use crate::domain::road::Road;
use crate::domain::types::{
    is_on_tenth_grid, parse_month, EstimateId, PlanPeriod, RoadId, MAX_CHANGE, MAX_CONDITION,
    MIN_CONDITION,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{CsvParser, FileParser, RawRecord};
use crate::repository::{ConditionRecordRepository, EstimateRepository, RoadRepository};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// 目录导入时的标准文件名
pub const ROADS_FILE: &str = "roads.csv";
pub const ESTIMATES_FILE: &str = "estimates.csv";
pub const CONDITIONS_FILE: &str = "conditions.csv";

/// 单个文件的导入结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub entity: String,
    pub rows_read: usize,
    pub rows_written: usize,
}

// ==========================================
// 字段读取辅助
// ==========================================

fn required<'a>(record: &'a RawRecord, names: &[&str]) -> ImportResult<&'a str> {
    record.get(names).ok_or_else(|| ImportError::MissingField {
        row: record.row,
        field: names[0].to_string(),
    })
}

fn parse_i64(record: &RawRecord, names: &[&str]) -> ImportResult<i64> {
    let raw = required(record, names)?;
    raw.parse::<i64>().map_err(|e| ImportError::TypeConversionError {
        row: record.row,
        field: names[0].to_string(),
        message: format!("'{}' 不是整数: {}", raw, e),
    })
}

fn parse_f64(record: &RawRecord, names: &[&str]) -> ImportResult<f64> {
    let raw = required(record, names)?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ImportError::TypeConversionError {
            row: record.row,
            field: names[0].to_string(),
            message: format!("'{}' 不是有效数字", raw),
        }),
    }
}

fn check_range(row: usize, field: &str, value: f64, min: f64, max: f64) -> ImportResult<()> {
    if value < min || value > max {
        return Err(ImportError::ValueRangeError {
            row,
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

// ==========================================
// 行 → 领域对象
// ==========================================

fn map_road(record: &RawRecord) -> ImportResult<Road> {
    let id = parse_i64(record, &["id", "road_id"])?;
    let number = required(record, &["number"])?.to_string();
    let priority = parse_f64(record, &["priority"])?;
    check_range(record.row, "priority", priority, 0.0, f64::MAX)?;

    Ok(Road {
        id: RoadId(id),
        number,
        priority,
        link_to_passport: record
            .get(&["link", "link_to_passport"])
            .unwrap_or_default()
            .to_string(),
    })
}

fn map_estimate(record: &RawRecord) -> ImportResult<Estimate> {
    let id = parse_i64(record, &["id", "estimate_id"])?;
    let level = parse_f64(record, &["level_of_work", "level_of_works"])?;
    check_range(record.row, "level_of_work", level, 0.1, MAX_CHANGE)?;
    if !is_on_tenth_grid(level) {
        return Err(ImportError::OffGridValue {
            row: record.row,
            field: "level_of_work".to_string(),
            value: level,
        });
    }
    let cost = parse_f64(record, &["cost"])?;
    check_range(record.row, "cost", cost, 0.0, f64::MAX)?;
    let road_id = parse_i64(record, &["road_id"])?;

    Ok(Estimate {
        id: EstimateId(id),
        name: record
            .get(&["name"])
            .map(str::to_string)
            .unwrap_or_else(|| format!("Estimate #{}", id)),
        level_of_works: level,
        cost,
        link: record.get(&["link"]).unwrap_or_default().to_string(),
        road_id: RoadId(road_id),
    })
}

fn map_condition(record: &RawRecord) -> ImportResult<ConditionRecord> {
    let road_id = parse_i64(record, &["road_id"])?;
    let year = parse_i64(record, &["year"])?;
    let year = i32::try_from(year).map_err(|_| ImportError::TypeConversionError {
        row: record.row,
        field: "year".to_string(),
        message: format!("年份越界: {}", year),
    })?;
    let raw_month = required(record, &["month"])?;
    let month = parse_month(raw_month).ok_or_else(|| ImportError::TypeConversionError {
        row: record.row,
        field: "month".to_string(),
        message: format!("无法识别的月份: {}", raw_month),
    })?;
    let condition = parse_f64(record, &["condition", "technical_condition"])?;
    check_range(record.row, "condition", condition, MIN_CONDITION, MAX_CONDITION)?;

    let period = PlanPeriod { year, month };
    Ok(ConditionRecord::new(RoadId(road_id), period, condition))
}

/// 逐行映射，并检查主键在文件内不重复
fn map_unique<T, K, F, G>(records: &[RawRecord], map: F, key: G) -> ImportResult<Vec<T>>
where
    F: Fn(&RawRecord) -> ImportResult<T>,
    G: Fn(&T) -> K,
    K: std::hash::Hash + Eq + std::fmt::Display,
{
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(records.len());
    for record in records {
        let item = map(record)?;
        let k = key(&item);
        let label = k.to_string();
        if !seen.insert(k) {
            return Err(ImportError::DuplicateKey {
                row: record.row,
                key: label,
            });
        }
        items.push(item);
    }
    Ok(items)
}

// ==========================================
// ReferenceDataImporter - 基础数据导入器
// ==========================================
pub struct ReferenceDataImporter<P = CsvParser>
where
    P: FileParser,
{
    road_repo: Arc<RoadRepository>,
    estimate_repo: Arc<EstimateRepository>,
    condition_repo: Arc<ConditionRecordRepository>,
    parser: P,
}

impl ReferenceDataImporter<CsvParser> {
    pub fn new(
        road_repo: Arc<RoadRepository>,
        estimate_repo: Arc<EstimateRepository>,
        condition_repo: Arc<ConditionRecordRepository>,
    ) -> Self {
        Self::with_parser(road_repo, estimate_repo, condition_repo, CsvParser)
    }
}

impl<P> ReferenceDataImporter<P>
where
    P: FileParser,
{
    pub fn with_parser(
        road_repo: Arc<RoadRepository>,
        estimate_repo: Arc<EstimateRepository>,
        condition_repo: Arc<ConditionRecordRepository>,
        parser: P,
    ) -> Self {
        Self {
            road_repo,
            estimate_repo,
            condition_repo,
            parser,
        }
    }

    /// 导入道路（按 id upsert）
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn import_roads<Q: AsRef<Path>>(&self, path: Q) -> ImportResult<ImportSummary> {
        let records = self.parser.parse_to_raw_records(path.as_ref())?;
        let roads = map_unique(&records, map_road, |r: &Road| r.id)?;
        let written = self.road_repo.batch_upsert(&roads)?;

        info!(rows = records.len(), written, "道路导入完成");
        Ok(ImportSummary {
            entity: "road".to_string(),
            rows_read: records.len(),
            rows_written: written,
        })
    }

    /// 导入预算书（按 id upsert；所属道路必须已存在）
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn import_estimates<Q: AsRef<Path>>(&self, path: Q) -> ImportResult<ImportSummary> {
        let records = self.parser.parse_to_raw_records(path.as_ref())?;
        let estimates = map_unique(&records, map_estimate, |e: &Estimate| e.id)?;
        let written = self.estimate_repo.batch_upsert(&estimates)?;

        info!(rows = records.len(), written, "预算书导入完成");
        Ok(ImportSummary {
            entity: "estimate".to_string(),
            rows_read: records.len(),
            rows_written: written,
        })
    }

    /// 导入实测技术状况（只追加）
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn import_conditions<Q: AsRef<Path>>(&self, path: Q) -> ImportResult<ImportSummary> {
        let records = self.parser.parse_to_raw_records(path.as_ref())?;
        let conditions = records
            .iter()
            .map(map_condition)
            .collect::<ImportResult<Vec<ConditionRecord>>>()?;
        let written = self.condition_repo.batch_insert_observed(&conditions)?;

        info!(rows = records.len(), written, "技术状况导入完成");
        Ok(ImportSummary {
            entity: "condition_record".to_string(),
            rows_read: records.len(),
            rows_written: written,
        })
    }

    /// 导入目录下的标准文件（按 道路 → 预算书 → 技术状况 顺序，缺失的文件跳过）
    pub fn import_directory<Q: AsRef<Path>>(&self, dir: Q) -> ImportResult<Vec<ImportSummary>> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ImportError::FileNotFound(dir.display().to_string()));
        }

        let mut summaries = Vec::new();
        let roads = dir.join(ROADS_FILE);
        if roads.exists() {
            summaries.push(self.import_roads(&roads)?);
        }
        let estimates = dir.join(ESTIMATES_FILE);
        if estimates.exists() {
            summaries.push(self.import_estimates(&estimates)?);
        }
        let conditions = dir.join(CONDITIONS_FILE);
        if conditions.exists() {
            summaries.push(self.import_conditions(&conditions)?);
        }
        Ok(summaries)
    }
}
