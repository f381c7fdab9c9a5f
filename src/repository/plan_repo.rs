// ==========================================
// 道路养护计划系统 - 作业计划数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 月度计划与该月新状况记录在同一事务内提交（失败月份不留残迹）
// ==========================================

use crate::domain::condition::ConditionRecord;
use crate::domain::plan::{PlanEntry, PlanRun};
use crate::domain::types::{EstimateId, RoadId};
use crate::repository::condition_repo::ConditionRecordRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// PlanRunRepository - 计划运行仓储
// ==========================================
pub struct PlanRunRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanRunRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<PlanRun> {
        let created_at_raw: String = row.get(7)?;
        let created_at = NaiveDateTime::parse_from_str(&created_at_raw, DATETIME_FORMAT)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
            })?;
        Ok(PlanRun {
            run_id: row.get(0)?,
            start_year: row.get(1)?,
            start_month: row.get(2)?,
            year_count: row.get(3)?,
            month_count: row.get::<_, i64>(4)? as usize,
            budget: row.get(5)?,
            config_snapshot_json: row.get(6)?,
            created_at,
        })
    }

    /// 创建运行记录
    pub fn create(&self, run: &PlanRun) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO plan_run (
                run_id, start_year, start_month, year_count, month_count,
                budget, config_snapshot_json, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
            params![
                run.run_id,
                run.start_year,
                run.start_month,
                run.year_count,
                run.month_count as i64,
                run.budget,
                run.config_snapshot_json,
                run.created_at.format(DATETIME_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 按 ID 查询运行
    pub fn find_by_id(&self, run_id: &str) -> RepositoryResult<Option<PlanRun>> {
        let conn = self.get_conn()?;
        let run = conn
            .query_row(
                r#"SELECT run_id, start_year, start_month, year_count, month_count,
                          budget, config_snapshot_json, created_at
                   FROM plan_run WHERE run_id = ?1"#,
                params![run_id],
                Self::map_row,
            )
            .optional()?;
        Ok(run)
    }

    /// 查询全部运行（最新在前）
    pub fn list(&self) -> RepositoryResult<Vec<PlanRun>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT run_id, start_year, start_month, year_count, month_count,
                      budget, config_snapshot_json, created_at
               FROM plan_run ORDER BY created_at DESC, run_id"#,
        )?;
        let runs = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<PlanRun>>>()?;
        Ok(runs)
    }
}

// ==========================================
// PlanEntryRepository - 月度计划条目仓储
// ==========================================
pub struct PlanEntryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanEntryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 提交一个月的计划
    ///
    /// # 参数
    /// - `run_id`: 所属运行
    /// - `entries`: 该月全部道路的计划条目
    /// - `conditions`: 该月写入的新技术状况记录
    ///
    /// # 返回
    /// - `Ok(count)`: 写入的计划条目数
    ///
    /// # 红线
    /// - 必须在事务中完成：条目、条目-预算书关联、状况记录要么全部写入，要么全部不写
    pub fn commit_month(
        &self,
        run_id: &str,
        entries: &[PlanEntry],
        conditions: &[ConditionRecord],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        {
            let mut entry_stmt = tx.prepare(
                r#"INSERT INTO plan_entry (run_id, year, month, road_id, cost, required_change)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            )?;
            let mut link_stmt = tx.prepare(
                r#"INSERT INTO plan_entry_estimate (entry_id, seq_no, estimate_id)
                   VALUES (?1, ?2, ?3)"#,
            )?;

            for entry in entries {
                entry_stmt.execute(params![
                    run_id,
                    entry.year,
                    entry.month,
                    entry.road_id.0,
                    entry.cost,
                    entry.required_change,
                ])?;
                let entry_id = tx.last_insert_rowid();

                for (seq_no, estimate_id) in entry.estimate_ids.iter().enumerate() {
                    link_stmt.execute(params![entry_id, seq_no as i64, estimate_id.0])?;
                }
            }
        }

        ConditionRecordRepository::insert_in_tx(&tx, conditions, Some(run_id))?;

        tx.commit()?;
        Ok(entries.len())
    }

    /// 查询某次运行的全部计划条目（按年、月、道路排序）
    pub fn find_by_run(&self, run_id: &str) -> RepositoryResult<Vec<PlanEntry>> {
        let conn = self.get_conn()?;

        // 1. 条目 → 预算书ID列表
        let mut links: HashMap<i64, Vec<EstimateId>> = HashMap::new();
        {
            let mut stmt = conn.prepare(
                r#"SELECT pe.entry_id, pee.estimate_id
                   FROM plan_entry_estimate pee
                   JOIN plan_entry pe ON pe.entry_id = pee.entry_id
                   WHERE pe.run_id = ?1
                   ORDER BY pee.entry_id, pee.seq_no"#,
            )?;
            let rows = stmt.query_map(params![run_id], |row| {
                Ok((row.get::<_, i64>(0)?, EstimateId(row.get(1)?)))
            })?;
            for row in rows {
                let (entry_id, estimate_id) = row?;
                links.entry(entry_id).or_default().push(estimate_id);
            }
        }

        // 2. 条目本体
        let mut stmt = conn.prepare(
            r#"SELECT entry_id, run_id, year, month, road_id, cost, required_change
               FROM plan_entry
               WHERE run_id = ?1
               ORDER BY year, month, road_id"#,
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                let entry_id: i64 = row.get(0)?;
                Ok(PlanEntry {
                    run_id: row.get(1)?,
                    year: row.get(2)?,
                    month: row.get(3)?,
                    road_id: RoadId(row.get(4)?),
                    estimate_ids: links.remove(&entry_id).unwrap_or_default(),
                    cost: row.get(5)?,
                    required_change: row.get(6)?,
                })
            })?
            .collect::<SqliteResult<Vec<PlanEntry>>>()?;

        Ok(entries)
    }

    /// 查询某条道路在某次运行中的计划条目
    pub fn find_by_run_and_road(&self, run_id: &str, road_id: RoadId) -> RepositoryResult<Vec<PlanEntry>> {
        Ok(self
            .find_by_run(run_id)?
            .into_iter()
            .filter(|e| e.road_id == road_id)
            .collect())
    }
}
