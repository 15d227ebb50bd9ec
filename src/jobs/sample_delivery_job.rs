// ==========================================
// ERP → 数据仓库同步 - 样品交货增量作业
// ==========================================
// 流程: 窗口 → 仓库自然键 + 源系统自然键 → 当日增量 → 类型映射 → 对账 → 写入
// 红线: 对账窗口与增量日期只从 SyncWindow 取得
// ==========================================

use crate::domain::delivery::SampleDeliveryRow;
use crate::domain::types::Dimension;
use crate::engine::reconciliation::ReconciliationEngine;
use crate::engine::window::SyncWindow;
use crate::extract::records::SampleOrderRow;
use crate::extract::traits::ErpSource;
use crate::jobs::error::JobResult;
use crate::jobs::job::{EtlJob, JobReport};
use crate::repository::{
    lookup_customer, DimensionLookupCache, EtlInfoRepository, LookupMap, SampleDeliveryRepository,
};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, warn};

/// etl_info 中的作业标识
pub const SAMPLE_DELIVERY_ETL_NAME: &str = "process_sample_deliveries";

/// 缺省交货状态
pub const DEFAULT_DELIVERY_STATUS: &str = "A";

/// 维度查找未命中
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupMiss {
    #[error("物料未命中: {0}")]
    Material(String),
    #[error("客户未命中: {0}")]
    Customer(String),
}

// ==========================================
// DeliveryRowMapper - 源系统行 → 事实行
// ==========================================
// 纯函数: 只依赖传入的维度映射快照
pub struct DeliveryRowMapper<'a> {
    pub materials: &'a LookupMap,
    pub customers: &'a LookupMap,
    pub default_channel: &'a str,
}

impl DeliveryRowMapper<'_> {
    pub fn map(&self, order: &SampleOrderRow) -> Result<SampleDeliveryRow, LookupMiss> {
        let customer_id = lookup_customer(
            self.customers,
            &order.sales_organization,
            &order.channel,
            &order.division,
            &order.customer_code,
            self.default_channel,
        )
        .ok_or_else(|| LookupMiss::Customer(order.customer_code.clone()))?;

        let material_id = self
            .materials
            .get(&order.material_code)
            .copied()
            .ok_or_else(|| LookupMiss::Material(order.material_code.clone()))?;

        Ok(SampleDeliveryRow {
            delivery_id: order.delivery_id.clone(),
            delivery_type: order.delivery_type.clone(),
            goods_issue_date: order.goods_issue_date,
            real_goods_issue_date: order.real_goods_issue_date,
            status: order
                .status
                .clone()
                .unwrap_or_else(|| DEFAULT_DELIVERY_STATUS.to_string()),
            modified_date: order.modified_date.or(order.created_date),
            customer_id,
            material_id,
            sales_organization: order.sales_organization.clone(),
            sales_id: order.sales_id.clone(),
            qty: order.qty,
            qty_ordered: order.qty_ordered,
            created_date: order.created_date,
        })
    }
}

// ==========================================
// SampleDeliveryJob
// ==========================================
pub struct SampleDeliveryJob {
    deliveries: SampleDeliveryRepository,
    etl_info: EtlInfoRepository,
    source: Arc<dyn ErpSource>,
    lookup: Arc<DimensionLookupCache>,
    engine: ReconciliationEngine,
    sales_organization: String,
    default_channel: String,
}

impl SampleDeliveryJob {
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        source: Arc<dyn ErpSource>,
        lookup: Arc<DimensionLookupCache>,
        sales_organization: impl Into<String>,
        default_channel: impl Into<String>,
    ) -> Self {
        Self {
            deliveries: SampleDeliveryRepository::from_connection(conn.clone()),
            etl_info: EtlInfoRepository::from_connection(conn),
            source,
            lookup,
            engine: ReconciliationEngine::new(),
            sales_organization: sales_organization.into(),
            default_channel: default_channel.into(),
        }
    }

    fn map_delta(&self, delta: &[SampleOrderRow]) -> JobResult<(Vec<SampleDeliveryRow>, usize)> {
        if delta.is_empty() {
            return Ok((Vec::new(), 0));
        }

        let materials = self.lookup.map(Dimension::Material)?;
        let customers = self.lookup.map(Dimension::Customer)?;
        let mapper = DeliveryRowMapper {
            materials: &materials,
            customers: &customers,
            default_channel: &self.default_channel,
        };

        let mut rows = Vec::with_capacity(delta.len());
        let mut misses = Vec::new();
        for order in delta {
            match mapper.map(order) {
                Ok(row) => rows.push(row),
                Err(miss) => misses.push(format!("{}: {}", order.sales_id, miss)),
            }
        }
        if !misses.is_empty() {
            warn!(dropped = misses.len(), misses = ?misses, "增量行维度查找未命中, 已丢弃");
        }
        Ok((rows, misses.len()))
    }
}

impl EtlJob for SampleDeliveryJob {
    fn name(&self) -> &'static str {
        "sample_delivery"
    }

    fn run(&self, run_date: NaiveDate) -> JobResult<JobReport> {
        let window = SyncWindow::for_run_date(run_date);
        let mut report = JobReport::new(self.name(), run_date);

        let warehouse_ids = self.deliveries.sales_ids_since(window.window_start)?;
        let source_ids = self
            .source
            .sample_order_ids(&self.sales_organization, window.window_start)?;
        let delta = self
            .source
            .sample_orders_modified_on(&self.sales_organization, window.delta_date)?;
        info!(
            window_start = %window.window_start,
            delta_date = %window.delta_date,
            warehouse_ids = warehouse_ids.len(),
            source_ids = source_ids.len(),
            delta_rows = delta.len(),
            "样品交货对账输入加载完成"
        );

        let (rows, dropped) = self.map_delta(&delta)?;
        report.rows_read = delta.len();
        report.rows_dropped = dropped;

        let plan = self.engine.reconcile(&source_ids, &warehouse_ids, rows);
        if plan.is_empty() {
            info!("无需更新或删除的样品交货记录");
            self.etl_info.touch(SAMPLE_DELIVERY_ETL_NAME)?;
            return Ok(report);
        }

        let stats = self.deliveries.apply_plan(&plan, SAMPLE_DELIVERY_ETL_NAME)?;
        report.rows_deleted = stats.deleted_rows;
        report.rows_written = stats.inserted_rows;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn order() -> SampleOrderRow {
        SampleOrderRow {
            sales_id: "S1".to_string(),
            delivery_id: "V1".to_string(),
            delivery_type: None,
            material_code: "MA".to_string(),
            goods_issue_date: None,
            real_goods_issue_date: None,
            status: None,
            customer_code: "C1".to_string(),
            sales_organization: "1000".to_string(),
            division: "01".to_string(),
            channel: "30".to_string(),
            qty: Decimal::from(2),
            qty_ordered: Decimal::from(2),
            modified_date: None,
            created_date: NaiveDate::from_ymd_opt(2026, 9, 1),
        }
    }

    fn maps() -> (LookupMap, LookupMap) {
        let materials = [("MA".to_string(), 1)].into_iter().collect();
        let customers = [("10001001C1".to_string(), 10)].into_iter().collect();
        (materials, customers)
    }

    #[test]
    fn test_mapper_applies_defaults_and_channel_fallback() {
        let (materials, customers) = maps();
        let mapper = DeliveryRowMapper {
            materials: &materials,
            customers: &customers,
            default_channel: "10",
        };

        let row = mapper.map(&order()).unwrap();

        assert_eq!(row.customer_id, 10);
        assert_eq!(row.material_id, 1);
        assert_eq!(row.status, "A");
        assert_eq!(row.modified_date, NaiveDate::from_ymd_opt(2026, 9, 1));
    }

    #[test]
    fn test_mapper_reports_lookup_miss() {
        let (materials, customers) = maps();
        let mapper = DeliveryRowMapper {
            materials: &materials,
            customers: &customers,
            default_channel: "10",
        };

        let mut unknown_material = order();
        unknown_material.material_code = "MZ".to_string();
        assert_eq!(
            mapper.map(&unknown_material),
            Err(LookupMiss::Material("MZ".to_string()))
        );

        let mut unknown_customer = order();
        unknown_customer.customer_code = "C9".to_string();
        assert_eq!(
            mapper.map(&unknown_customer),
            Err(LookupMiss::Customer("C9".to_string()))
        );
    }
}
