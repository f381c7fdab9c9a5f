// ==========================================
// 道路养护计划系统 - 技术状况记录仓储
// ==========================================
// 红线: 记录只追加，不提供 update/delete
// 说明:
// - run_id 为空的记录是实测数据
// - run_id 非空的记录由某次计划运行模拟写入，只对该运行可见
// ==========================================

use crate::domain::condition::ConditionRecord;
use crate::domain::types::RoadId;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// ConditionRecordRepository - 技术状况记录仓储
// ==========================================
pub struct ConditionRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ConditionRecordRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<ConditionRecord> {
        Ok(ConditionRecord {
            road_id: RoadId(row.get(0)?),
            year: row.get(1)?,
            month: row.get(2)?,
            condition: row.get(3)?,
        })
    }

    /// 查询全部实测记录（按道路、年、月排序）
    pub fn find_observed(&self) -> RepositoryResult<Vec<ConditionRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT road_id, year, month, condition
               FROM condition_record
               WHERE run_id IS NULL
               ORDER BY road_id, year, month, record_id"#,
        )?;
        let records = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<ConditionRecord>>>()?;
        Ok(records)
    }

    /// 查询某条道路的实测记录
    pub fn find_observed_by_road(&self, road_id: RoadId) -> RepositoryResult<Vec<ConditionRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT road_id, year, month, condition
               FROM condition_record
               WHERE run_id IS NULL AND road_id = ?1
               ORDER BY year, month, record_id"#,
        )?;
        let records = stmt
            .query_map(params![road_id.0], Self::map_row)?
            .collect::<SqliteResult<Vec<ConditionRecord>>>()?;
        Ok(records)
    }

    /// 查询某次运行可见的全部历史（实测 + 该运行已写入的模拟记录）
    pub fn find_history_for_run(&self, run_id: &str) -> RepositoryResult<Vec<ConditionRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT road_id, year, month, condition
               FROM condition_record
               WHERE run_id IS NULL OR run_id = ?1
               ORDER BY road_id, year, month, record_id"#,
        )?;
        let records = stmt
            .query_map(params![run_id], Self::map_row)?
            .collect::<SqliteResult<Vec<ConditionRecord>>>()?;
        Ok(records)
    }

    /// 批量追加实测记录（单事务）
    pub fn batch_insert_observed(&self, records: &[ConditionRecord]) -> RepositoryResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let count = Self::insert_in_tx(&tx, records, None)?;
        tx.commit()?;
        Ok(count)
    }

    /// 在调用方事务中追加记录
    pub(crate) fn insert_in_tx(
        tx: &Transaction<'_>,
        records: &[ConditionRecord],
        run_id: Option<&str>,
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"INSERT INTO condition_record (road_id, year, month, condition, run_id)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
        )?;
        for r in records {
            stmt.execute(params![r.road_id.0, r.year, r.month, r.condition, run_id])?;
        }
        Ok(records.len())
    }
}
