// ==========================================
// 道路养护计划系统 - 道路数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::road::Road;
use crate::domain::types::RoadId;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// RoadRepository - 道路仓储
// ==========================================

/// 道路仓储
/// 职责: 管理 road 表的读写
pub struct RoadRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RoadRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<Road> {
        Ok(Road {
            id: RoadId(row.get(0)?),
            number: row.get(1)?,
            priority: row.get(2)?,
            link_to_passport: row.get(3)?,
        })
    }

    /// 查询全部道路（按 road_id 排序）
    pub fn find_all(&self) -> RepositoryResult<Vec<Road>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT road_id, number, priority, link_to_passport FROM road ORDER BY road_id",
        )?;
        let roads = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<Road>>>()?;
        Ok(roads)
    }

    /// 按 ID 查询道路
    ///
    /// # 返回
    /// - Ok(Some(Road)): 找到
    /// - Ok(None): 未找到
    pub fn find_by_id(&self, road_id: RoadId) -> RepositoryResult<Option<Road>> {
        let conn = self.get_conn()?;
        let road = conn
            .query_row(
                "SELECT road_id, number, priority, link_to_passport FROM road WHERE road_id = ?1",
                params![road_id.0],
                Self::map_row,
            )
            .optional()?;
        Ok(road)
    }

    /// 插入单条道路
    pub fn insert(&self, road: &Road) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO road (road_id, number, priority, link_to_passport) VALUES (?1, ?2, ?3, ?4)",
            params![road.id.0, road.number, road.priority, road.link_to_passport],
        )?;
        Ok(())
    }

    /// 批量插入或更新道路（单事务）
    pub fn batch_upsert(&self, roads: &[Road]) -> RepositoryResult<usize> {
        if roads.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO road (road_id, number, priority, link_to_passport)
                   VALUES (?1, ?2, ?3, ?4)
                   ON CONFLICT(road_id) DO UPDATE SET
                       number = excluded.number,
                       priority = excluded.priority,
                       link_to_passport = excluded.link_to_passport"#,
            )?;
            for road in roads {
                stmt.execute(params![road.id.0, road.number, road.priority, road.link_to_passport])?;
            }
        }
        tx.commit()?;
        Ok(roads.len())
    }

    /// 道路数量
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM road", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}
