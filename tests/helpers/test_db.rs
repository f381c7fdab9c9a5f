// ==========================================
// 测试数据库辅助函数
// ==========================================
// 职责: 临时数据库初始化、仓储集合构建
// ==========================================

use road_works_dss::db::open_shared_connection;
use road_works_dss::engine::PlanningRepositories;
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 临时测试数据库
///
/// temp_file 需要保持存活，drop 后文件被删除
pub struct TestDb {
    pub temp_file: NamedTempFile,
    pub db_path: String,
    pub conn: Arc<Mutex<Connection>>,
    pub repos: PlanningRepositories,
}

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    // 建表（连接随即关闭）
    open_shared_connection(&db_path)?;

    Ok((temp_file, db_path))
}

/// 创建临时数据库，并基于同一共享连接构建全部仓储
pub fn setup_test_db() -> TestDb {
    let (temp_file, db_path) = create_test_db().expect("无法创建测试数据库");
    let conn = open_shared_connection(&db_path).expect("无法打开测试数据库");
    let repos = PlanningRepositories::from_connection(conn.clone());

    TestDb {
        temp_file,
        db_path,
        conn,
        repos,
    }
}

/// 统计表行数
pub fn count_rows(conn: &Arc<Mutex<Connection>>, table: &str) -> i64 {
    let conn = conn.lock().unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}
