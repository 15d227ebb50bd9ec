// ==========================================
// ERP → 数据仓库同步 - 可用量计算作业
// ==========================================
// 流程: 需求 + 库存 (仓库) → 供给 (ERP) → 物料查找 → 分配 → 全量替换事实表
// ==========================================

use crate::domain::supply::SupplyLine;
use crate::domain::types::{round_qty, Dimension};
use crate::engine::allocation::{AllocationEngine, AllocationOptions};
use crate::engine::window::SyncWindow;
use crate::extract::records::ReleasedOrderRow;
use crate::extract::traits::ErpSource;
use crate::jobs::error::JobResult;
use crate::jobs::job::{EtlJob, JobReport};
use crate::repository::{
    AvailabilityRepository, DimensionLookupCache, LookupMap, PlanningRepository,
};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// etl_info 中的作业标识
pub const AVAILABILITY_ETL_NAME: &str = "process_availability_materials";

/// 供给行映射结果
#[derive(Debug, Default)]
pub struct SupplyMapping {
    pub lines: Vec<SupplyLine>,
    /// 查找未命中的物料代码（去重）
    pub unknown_materials: BTreeSet<String>,
    pub dropped: usize,
}

/// 已下达订单 → 供给行 (物料代码解析为代理键)
///
/// 输入顺序保持不变; 未命中物料的行被丢弃
/// 剩余数量按仓库精度取整, 保证分配切片之和与需求数量一致
pub fn map_supply_lines(orders: &[ReleasedOrderRow], materials: &LookupMap) -> SupplyMapping {
    let mut mapping = SupplyMapping::default();
    for order in orders {
        match materials.get(&order.material_code) {
            Some(material_id) => mapping.lines.push(SupplyLine {
                primary_order_id: order.primary_order_id.clone(),
                secondary_order_id: order.secondary_order_id.clone(),
                material_id: *material_id,
                remaining_qty: round_qty(order.remaining_qty()),
                release_date: order.release_date,
                finish_date: order.finish_date,
                batch: order.batch.clone(),
                location: order.location.clone(),
            }),
            None => {
                mapping.dropped += 1;
                mapping.unknown_materials.insert(order.material_code.clone());
            }
        }
    }
    mapping
}

// ==========================================
// AvailabilityCalculationJob
// ==========================================
pub struct AvailabilityCalculationJob {
    planning: PlanningRepository,
    availability: AvailabilityRepository,
    source: Arc<dyn ErpSource>,
    lookup: Arc<DimensionLookupCache>,
    engine: AllocationEngine,
    plant: String,
    supply_horizon_days: u64,
}

impl AvailabilityCalculationJob {
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        source: Arc<dyn ErpSource>,
        lookup: Arc<DimensionLookupCache>,
        options: AllocationOptions,
        plant: impl Into<String>,
        supply_horizon_days: u64,
    ) -> Self {
        Self {
            planning: PlanningRepository::from_connection(conn.clone()),
            availability: AvailabilityRepository::from_connection(conn),
            source,
            lookup,
            engine: AllocationEngine::new(options),
            plant: plant.into(),
            supply_horizon_days,
        }
    }
}

impl EtlJob for AvailabilityCalculationJob {
    fn name(&self) -> &'static str {
        "availability"
    }

    fn run(&self, run_date: NaiveDate) -> JobResult<JobReport> {
        let window = SyncWindow::with_supply_horizon(run_date, self.supply_horizon_days);
        let mut report = JobReport::new(self.name(), run_date);

        let demand = self.planning.next_week_demand()?;
        let stock = self.planning.stock_snapshot(&self.plant, run_date)?;
        let orders = self.source.released_orders(window.supply_horizon_end)?;
        info!(
            demand_lines = demand.len(),
            stock_materials = stock.len(),
            supply_orders = orders.len(),
            horizon_end = %window.supply_horizon_end,
            "分配输入加载完成"
        );

        let materials = self.lookup.map(Dimension::Material)?;
        let supply = map_supply_lines(&orders, &materials);
        if supply.dropped > 0 {
            warn!(
                dropped = supply.dropped,
                material_codes = ?supply.unknown_materials,
                "供给行物料代码未命中, 已丢弃"
            );
        }

        let (records, summary) = self.engine.allocate_with_summary(&demand, &stock, &supply.lines);
        if records.is_empty() {
            info!("无分配记录, 事实表将被清空");
        }

        report.rows_read = demand.len() + orders.len();
        report.rows_dropped = supply.dropped;
        report.rows_written = self.availability.replace_all(&records, AVAILABILITY_ETL_NAME)?;
        info!(
            shortage_records = summary.shortage_records,
            shortage_qty = %summary.shortage_qty,
            "可用量计算完成"
        );
        Ok(report)
    }
}
