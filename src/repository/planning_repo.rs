// ==========================================
// ERP → 数据仓库同步 - 分配输入仓储
// ==========================================
// 职责: 读取下周需求流与当日库存快照
// 红线: Repository 不含业务逻辑 (仅做类型强制转换)
// ==========================================

use crate::domain::demand::{DemandLine, StockSnapshot};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{date_from_sql, qty_from_sql};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

// ==========================================
// PlanningRepository - 需求 / 库存 只读仓储
// ==========================================
pub struct PlanningRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanningRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 下周需求流
    ///
    /// 排序: 发货日期升序, 确认数量升序, 插入顺序兜底
    ///
    /// 物料/客户/日期缺失的行被丢弃 (warn), 数量 NULL → 0
    pub fn next_week_demand(&self) -> RepositoryResult<Vec<DemandLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT sales_id, material_id, cust_id, goods_issue_date, qty_ordered, qty_confirmed
            FROM dw_next_week_sales
            ORDER BY goods_issue_date ASC, COALESCE(qty_confirmed, 0) ASC, rowid ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, Option<i64>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<f64>>(4)?,
                row.get::<_, Option<f64>>(5)?,
            ))
        })?;

        let mut demand = Vec::new();
        let mut dropped: Vec<String> = Vec::new();
        for row in rows {
            let (sales_id, material_id, customer_id, due_date, qty_ordered, qty_confirmed) = row?;
            match (material_id, customer_id, date_from_sql(due_date)) {
                (Some(material_id), Some(customer_id), Some(due_date)) => {
                    demand.push(DemandLine {
                        demand_id: sales_id,
                        material_id,
                        customer_id,
                        due_date,
                        qty_ordered: qty_from_sql(qty_ordered),
                        qty_confirmed: qty_from_sql(qty_confirmed),
                    });
                }
                _ => dropped.push(sales_id),
            }
        }

        if !dropped.is_empty() {
            warn!(
                dropped = dropped.len(),
                sales_ids = ?dropped,
                "需求行缺少物料/客户/日期, 已丢弃"
            );
        }
        debug!(lines = demand.len(), "下周需求加载完成");
        Ok(demand)
    }

    /// 指定工厂、指定日期的非限制库存（按物料求和）
    pub fn stock_snapshot(&self, plant: &str, stock_date: NaiveDate) -> RepositoryResult<StockSnapshot> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT material_id, SUM(COALESCE(unrestricted_stock, 0))
            FROM dw_daily_stock
            WHERE stock_date = ?1 AND plant = ?2 AND material_id IS NOT NULL
            GROUP BY material_id
            ORDER BY material_id
            "#,
        )?;

        let snapshot = stmt
            .query_map(params![stock_date, plant], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, Option<f64>>(1)?))
            })?
            .map(|row| row.map(|(material_id, qty)| (material_id, qty_from_sql(qty))))
            .collect::<Result<StockSnapshot, _>>()?;

        debug!(plant, %stock_date, materials = snapshot.len(), "库存快照加载完成");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_warehouse_schema;
    use rust_decimal::Decimal;

    fn setup() -> PlanningRepository {
        let conn = Connection::open_in_memory().unwrap();
        init_warehouse_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO dw_next_week_sales VALUES ('S3', 1, 10, '2026-10-20', 5, 5);
            INSERT INTO dw_next_week_sales VALUES ('S2', 1, 10, '2026-10-19', 8, 8);
            INSERT INTO dw_next_week_sales VALUES ('S1', 1, 10, '2026-10-19', 2, 2.5);
            INSERT INTO dw_next_week_sales VALUES ('S4', NULL, 10, '2026-10-19', 1, 1);
            INSERT INTO dw_next_week_sales VALUES ('S5', 2, 11, '2026-10-21', NULL, NULL);

            INSERT INTO dw_daily_stock VALUES (1, '1000', '2026-10-16', 3, 3);
            INSERT INTO dw_daily_stock VALUES (1, '1000', '2026-10-16', 4.25, 4.25);
            INSERT INTO dw_daily_stock VALUES (2, '2000', '2026-10-16', 9, 9);
            INSERT INTO dw_daily_stock VALUES (2, '1000', '2026-10-15', 9, 9);
            "#,
        )
        .unwrap();
        PlanningRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_next_week_demand_order_and_coercion() {
        let repo = setup();
        let demand = repo.next_week_demand().unwrap();

        let ids: Vec<_> = demand.iter().map(|d| d.demand_id.as_str()).collect();
        assert_eq!(ids, vec!["S1", "S2", "S3", "S5"]);
        assert_eq!(demand[0].qty_confirmed, Decimal::new(25, 1));
        assert_eq!(demand[3].qty_confirmed, Decimal::ZERO);
        assert_eq!(demand[3].qty_ordered, Decimal::ZERO);
    }

    #[test]
    fn test_stock_snapshot_sums_per_material() {
        let repo = setup();
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let snapshot = repo.stock_snapshot("1000", date).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.available(1), Decimal::new(725, 2));
        assert_eq!(snapshot.available(2), Decimal::ZERO);
    }
}
