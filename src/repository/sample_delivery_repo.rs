// ==========================================
// ERP → 数据仓库同步 - 样品交货事实仓储
// ==========================================
// 表: sample_delivery_fact (自然键 sales_id, 一个自然键可对应多行)
// 语义: 按对账结果 删除 + 重新插入 + 运行戳 同一事务
// ==========================================

use crate::domain::delivery::SampleDeliveryRow;
use crate::engine::reconciliation::ReconciliationPlan;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::etl_info_repo::stamp_process_date;
use crate::repository::{date_from_sql, qty_from_sql, qty_to_sql};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use tracing::info;

/// 对账写入统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub cleared_ids: usize,  // 删除语句涉及的自然键数
    pub deleted_rows: usize, // 实际删除行数
    pub inserted_rows: usize,
}

pub struct SampleDeliveryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SampleDeliveryRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 仓库窗口内的自然键集合（created_date >= window_start）
    pub fn sales_ids_since(&self, window_start: NaiveDate) -> RepositoryResult<BTreeSet<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT sales_id FROM sample_delivery_fact WHERE created_date >= ?1",
        )?;
        let ids = stmt
            .query_map(params![window_start], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(ids)
    }

    /// 应用对账结果
    ///
    /// 删除键集合 = deletions ∪ touched, 随后插入当日增量
    pub fn apply_plan(
        &self,
        plan: &ReconciliationPlan<SampleDeliveryRow>,
        etl_name: &str,
    ) -> RepositoryResult<ApplyStats> {
        let ids_to_clear = plan.ids_to_clear();

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let mut stats = ApplyStats {
            cleared_ids: ids_to_clear.len(),
            ..ApplyStats::default()
        };

        {
            let mut delete = tx.prepare("DELETE FROM sample_delivery_fact WHERE sales_id = ?1")?;
            for sales_id in &ids_to_clear {
                stats.deleted_rows += delete.execute(params![sales_id])?;
            }

            let mut insert = tx.prepare(
                r#"
                INSERT INTO sample_delivery_fact (
                    delivery_id, delivery_type, goods_issue_date, real_goods_issue_date,
                    status, modified_date, cust_id, material_id, sales_organization,
                    sales_id, qty, qty_ordered, created_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
            )?;
            for row in &plan.upserts {
                stats.inserted_rows += insert.execute(params![
                    row.delivery_id,
                    row.delivery_type,
                    row.goods_issue_date,
                    row.real_goods_issue_date,
                    row.status,
                    row.modified_date,
                    row.customer_id,
                    row.material_id,
                    row.sales_organization,
                    row.sales_id,
                    qty_to_sql(row.qty),
                    qty_to_sql(row.qty_ordered),
                    row.created_date,
                ])?;
            }
        }

        stamp_process_date(&tx, etl_name)?;
        tx.commit()?;

        info!(
            cleared_ids = stats.cleared_ids,
            deleted_rows = stats.deleted_rows,
            inserted_rows = stats.inserted_rows,
            "样品交货事实表对账写入完成"
        );
        Ok(stats)
    }

    /// 按自然键查询
    pub fn find_by_sales_id(&self, sales_id: &str) -> RepositoryResult<Vec<SampleDeliveryRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT delivery_id, delivery_type, goods_issue_date, real_goods_issue_date,
                   status, modified_date, cust_id, material_id, sales_organization,
                   sales_id, qty, qty_ordered, created_date
            FROM sample_delivery_fact
            WHERE sales_id = ?1
            ORDER BY rowid
            "#,
        )?;
        let rows = stmt
            .query_map(params![sales_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &Row) -> rusqlite::Result<SampleDeliveryRow> {
        Ok(SampleDeliveryRow {
            delivery_id: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
            delivery_type: row.get(1)?,
            goods_issue_date: date_from_sql(row.get(2)?),
            real_goods_issue_date: date_from_sql(row.get(3)?),
            status: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            modified_date: date_from_sql(row.get(5)?),
            customer_id: row.get::<_, Option<i64>>(6)?.unwrap_or_default(),
            material_id: row.get::<_, Option<i64>>(7)?.unwrap_or_default(),
            sales_organization: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
            sales_id: row.get(9)?,
            qty: qty_from_sql(row.get(10)?),
            qty_ordered: qty_from_sql(row.get(11)?),
            created_date: date_from_sql(row.get(12)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_warehouse_schema;
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn delivery(sales_id: &str, created: NaiveDate) -> SampleDeliveryRow {
        SampleDeliveryRow {
            delivery_id: format!("V-{sales_id}"),
            delivery_type: Some("ZLF".to_string()),
            goods_issue_date: Some(created),
            real_goods_issue_date: None,
            status: "A".to_string(),
            modified_date: Some(created),
            customer_id: 10,
            material_id: 1,
            sales_organization: "1000".to_string(),
            sales_id: sales_id.to_string(),
            qty: Decimal::new(15, 1),
            qty_ordered: Decimal::from(2),
            created_date: Some(created),
        }
    }

    fn setup() -> SampleDeliveryRepository {
        let conn = Connection::open_in_memory().unwrap();
        init_warehouse_schema(&conn).unwrap();
        SampleDeliveryRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_sales_ids_since_is_inclusive() {
        let repo = setup();
        let plan = ReconciliationPlan {
            deletions: BTreeSet::new(),
            upserts: vec![
                delivery("S1", date(2025, 9, 30)),
                delivery("S2", date(2025, 10, 1)),
                delivery("S3", date(2026, 1, 5)),
            ],
        };
        repo.apply_plan(&plan, "SampleDeliveryFact").unwrap();

        let ids = repo.sales_ids_since(date(2025, 10, 1)).unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["S2", "S3"]);
    }

    #[test]
    fn test_apply_plan_deletes_and_replaces() {
        let repo = setup();
        let seed = ReconciliationPlan {
            deletions: BTreeSet::new(),
            upserts: vec![
                delivery("S1", date(2026, 1, 1)),
                delivery("S1", date(2026, 1, 1)),
                delivery("S2", date(2026, 1, 2)),
            ],
        };
        repo.apply_plan(&seed, "SampleDeliveryFact").unwrap();

        let mut updated = delivery("S2", date(2026, 1, 2));
        updated.status = "C".to_string();
        let plan = ReconciliationPlan {
            deletions: ["S1".to_string()].into_iter().collect(),
            upserts: vec![updated.clone()],
        };
        let stats = repo.apply_plan(&plan, "SampleDeliveryFact").unwrap();

        assert_eq!(
            stats,
            ApplyStats {
                cleared_ids: 2,
                deleted_rows: 3,
                inserted_rows: 1,
            }
        );
        assert!(repo.find_by_sales_id("S1").unwrap().is_empty());
        assert_eq!(repo.find_by_sales_id("S2").unwrap(), vec![updated]);
    }
}
