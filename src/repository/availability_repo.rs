// ==========================================
// ERP → 数据仓库同步 - 可用量计算事实仓储
// ==========================================
// 表: availability_calculation_fact
// 语义: 每次运行全量替换 (清空 + 批量写入 + 运行戳 同一事务)
// ==========================================

use crate::domain::allocation::{AllocationRecord, AllocationSource};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::etl_info_repo::stamp_process_date;
use crate::repository::qty_to_sql;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct AvailabilityRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AvailabilityRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 全量替换事实表
    ///
    /// 任一语句失败则整体回滚（Transaction drop 时回滚）
    ///
    /// # 返回
    /// - 写入行数
    pub fn replace_all(&self, records: &[AllocationRecord], etl_name: &str) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let deleted = tx.execute("DELETE FROM availability_calculation_fact", [])?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO availability_calculation_fact (
                    sales_id, material_id, cust_id, goods_issue_date, qty_confirmed,
                    supply_order_id_primary, supply_order_id_secondary, supply_qty,
                    release_date, finish_date, batch_number, location, allocation_kind
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
            )?;

            for record in records {
                let supply = match &record.source {
                    AllocationSource::Supply(supply) => Some(supply),
                    AllocationSource::Shortage | AllocationSource::Stock => None,
                };
                stmt.execute(params![
                    record.demand_id,
                    record.material_id,
                    record.customer_id,
                    record.due_date,
                    qty_to_sql(record.allocated_qty),
                    supply.map(|s| s.primary_order_id.as_str()),
                    supply.and_then(|s| s.secondary_order_id.as_deref()),
                    supply.map(|s| qty_to_sql(s.supply_qty)),
                    supply.and_then(|s| s.release_date),
                    supply.and_then(|s| s.finish_date),
                    supply.and_then(|s| s.batch.as_deref()),
                    supply.and_then(|s| s.location.as_deref()),
                    record.source.kind().as_str(),
                ])?;
            }
        }

        stamp_process_date(&tx, etl_name)?;
        tx.commit()?;

        info!(deleted, inserted = records.len(), "可用量事实表已全量替换");
        Ok(records.len())
    }

    /// 事实表行数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM availability_calculation_fact",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_warehouse_schema;
    use crate::domain::allocation::SupplyRef;
    use crate::domain::demand::DemandLine;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn demand() -> DemandLine {
        DemandLine {
            demand_id: "S1".to_string(),
            material_id: 1,
            customer_id: 10,
            due_date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            qty_ordered: Decimal::from(10),
            qty_confirmed: Decimal::from(10),
        }
    }

    fn setup() -> (Arc<Mutex<Connection>>, AvailabilityRepository) {
        let conn = Connection::open_in_memory().unwrap();
        init_warehouse_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (conn.clone(), AvailabilityRepository::from_connection(conn))
    }

    #[test]
    fn test_replace_all_writes_supply_and_shortage_rows() {
        let (conn, repo) = setup();
        let supply = SupplyRef {
            primary_order_id: "O1".to_string(),
            secondary_order_id: None,
            supply_qty: Decimal::new(60000, 4),
            release_date: NaiveDate::from_ymd_opt(2026, 10, 17),
            finish_date: None,
            batch: Some("B1".to_string()),
            location: None,
        };
        let records = vec![
            AllocationRecord::new(&demand(), Decimal::from(6), AllocationSource::Supply(supply)),
            AllocationRecord::new(&demand(), Decimal::from(4), AllocationSource::Shortage),
        ];

        assert_eq!(repo.replace_all(&records, "AvailabilityCalculationFact").unwrap(), 2);

        let conn = conn.lock().unwrap();
        let rows: Vec<(String, f64, Option<String>, Option<String>)> = conn
            .prepare(
                "SELECT allocation_kind, qty_confirmed, supply_order_id_primary, release_date
                 FROM availability_calculation_fact ORDER BY rowid",
            )
            .unwrap()
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(rows[0], ("SUPPLY".to_string(), 6.0, Some("O1".to_string()), Some("2026-10-17".to_string())));
        assert_eq!(rows[1], ("SHORTAGE".to_string(), 4.0, None, None));

        let stamped: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM etl_info WHERE etl = 'AvailabilityCalculationFact'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(stamped, 1);
    }

    #[test]
    fn test_replace_all_truncates_previous_snapshot() {
        let (_conn, repo) = setup();
        let records = vec![AllocationRecord::new(&demand(), Decimal::from(10), AllocationSource::Shortage)];
        repo.replace_all(&records, "AvailabilityCalculationFact").unwrap();
        repo.replace_all(&records, "AvailabilityCalculationFact").unwrap();
        assert_eq!(repo.count().unwrap(), 1);

        repo.replace_all(&[], "AvailabilityCalculationFact").unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }
}
