// ==========================================
// 道路养护计划系统 - 文件解析器
// ==========================================
// 支持: CSV (.csv)
// 输出: 行记录（表头 → 值），保留物理行号供错误定位
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// 原始行记录
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub row: usize,                     // 物理行号（表头为第 1 行）
    pub fields: HashMap<String, String>,// 列名（小写）→ 去空白后的值
}

impl RawRecord {
    /// 按候选列名取值（空串视为缺失）
    pub fn get(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|name| self.fields.get(*name))
            .map(String::as_str)
            .find(|v| !v.is_empty())
    }
}

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRecord>>;
}

// ==========================================
// CSV Parser 实现
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRecord>> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(ext.to_string_lossy().to_string()));
            }
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        // 表头统一小写，列名匹配不区分大小写
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
            .collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(records.len() + 2);

            let mut fields = HashMap::new();
            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    fields.insert(header.clone(), value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if fields.values().all(|v| v.is_empty()) {
                continue;
            }

            records.push(RawRecord { row, fields });
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let temp_file = csv_file(&["Id,Number,Priority", "1,M-01,2.5", "2,M-02,3.0"]);

        let records = CsvParser.parse_to_raw_records(temp_file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].row, 2);
        assert_eq!(records[0].get(&["number"]), Some("M-01"));
        assert_eq!(records[1].get(&["priority"]), Some("3.0"));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_raw_records(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_rejects_other_extensions() {
        let temp_file = Builder::new().suffix(".xlsx").tempfile().unwrap();
        let result = CsvParser.parse_to_raw_records(temp_file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_csv_parser_skip_empty_rows_keeps_line_numbers() {
        let temp_file = csv_file(&["id,number", "1,A", ",", "3,C"]);

        let records = CsvParser.parse_to_raw_records(temp_file.path()).unwrap();

        // 应跳过空行
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].row, 4);
    }

    #[test]
    fn test_get_with_aliases() {
        let temp_file = csv_file(&["level_of_works", "0.4"]);
        let records = CsvParser.parse_to_raw_records(temp_file.path()).unwrap();
        assert_eq!(records[0].get(&["level_of_work", "level_of_works"]), Some("0.4"));
        assert_eq!(records[0].get(&["missing"]), None);
    }
}
