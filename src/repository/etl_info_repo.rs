// ==========================================
// ERP → 数据仓库同步 - ETL 运行戳仓储
// ==========================================
// 表: etl_info (etl 名称 → 最近处理时间)
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{Local, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// 在给定连接/事务上写入运行戳
///
/// 事实表写入方在同一事务内调用, 保证数据与运行戳一起提交
pub fn stamp_process_date(conn: &Connection, etl_name: &str) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO etl_info (etl, process_date) VALUES (?1, ?2)
        ON CONFLICT(etl) DO UPDATE SET process_date = excluded.process_date
        "#,
        params![etl_name, Local::now().naive_local()],
    )?;
    Ok(())
}

pub struct EtlInfoRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EtlInfoRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 仅更新运行戳（无数据写入的运行）
    pub fn touch(&self, etl_name: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        stamp_process_date(&conn, etl_name)?;
        Ok(())
    }

    /// 最近处理时间
    pub fn last_processed(&self, etl_name: &str) -> RepositoryResult<Option<NaiveDateTime>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT process_date FROM etl_info WHERE etl = ?1",
                params![etl_name],
                |row| row.get::<_, Option<NaiveDateTime>>(0),
            )
            .optional()?;
        Ok(value.flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_warehouse_schema;

    #[test]
    fn test_touch_upserts_process_date() {
        let conn = Connection::open_in_memory().unwrap();
        init_warehouse_schema(&conn).unwrap();
        let repo = EtlInfoRepository::from_connection(Arc::new(Mutex::new(conn)));

        assert_eq!(repo.last_processed("AvailabilityCalculationFact").unwrap(), None);

        repo.touch("AvailabilityCalculationFact").unwrap();
        let first = repo.last_processed("AvailabilityCalculationFact").unwrap();
        assert!(first.is_some());

        repo.touch("AvailabilityCalculationFact").unwrap();
        let second = repo.last_processed("AvailabilityCalculationFact").unwrap();
        assert!(second >= first);
    }
}
