// ==========================================
// 道路养护计划系统 - 预算书数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑（最便宜等级筛选在引擎层完成）
// ==========================================

use crate::domain::estimate::Estimate;
use crate::domain::types::{EstimateId, RoadId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str =
    "SELECT estimate_id, name, level_of_works, cost, link, road_id FROM estimate";

// ==========================================
// EstimateRepository - 预算书仓储
// ==========================================
pub struct EstimateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EstimateRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<Estimate> {
        Ok(Estimate {
            id: EstimateId(row.get(0)?),
            name: row.get(1)?,
            level_of_works: row.get(2)?,
            cost: row.get(3)?,
            link: row.get(4)?,
            road_id: RoadId(row.get(5)?),
        })
    }

    /// 查询全部预算书
    pub fn find_all(&self) -> RepositoryResult<Vec<Estimate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY estimate_id", SELECT_COLUMNS))?;
        let estimates = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<Estimate>>>()?;
        Ok(estimates)
    }

    /// 查询某条道路的预算书
    pub fn find_by_road(&self, road_id: RoadId) -> RepositoryResult<Vec<Estimate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE road_id = ?1 ORDER BY estimate_id",
            SELECT_COLUMNS
        ))?;
        let estimates = stmt
            .query_map(params![road_id.0], Self::map_row)?
            .collect::<SqliteResult<Vec<Estimate>>>()?;
        Ok(estimates)
    }

    /// 插入单条预算书
    pub fn insert(&self, estimate: &Estimate) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO estimate (estimate_id, name, level_of_works, cost, link, road_id)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                estimate.id.0,
                estimate.name,
                estimate.level_of_works,
                estimate.cost,
                estimate.link,
                estimate.road_id.0,
            ],
        )?;
        Ok(())
    }

    /// 批量插入或更新预算书（单事务）
    pub fn batch_upsert(&self, estimates: &[Estimate]) -> RepositoryResult<usize> {
        if estimates.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO estimate (estimate_id, name, level_of_works, cost, link, road_id)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                   ON CONFLICT(estimate_id) DO UPDATE SET
                       name = excluded.name,
                       level_of_works = excluded.level_of_works,
                       cost = excluded.cost,
                       link = excluded.link,
                       road_id = excluded.road_id"#,
            )?;
            for e in estimates {
                stmt.execute(params![e.id.0, e.name, e.level_of_works, e.cost, e.link, e.road_id.0])?;
            }
        }
        tx.commit()?;
        Ok(estimates.len())
    }
}
