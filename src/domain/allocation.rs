// ==========================================
// ERP → 数据仓库同步 - 分配结果领域模型
// ==========================================
// 用途: 分配引擎输出, 一行对应事实表一行
// ==========================================

use crate::domain::demand::DemandLine;
use crate::domain::supply::SupplyLine;
use crate::domain::types::AllocationKind;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 被占用供给的引用（拷贝自分配开始时的供给行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyRef {
    pub primary_order_id: String,
    pub secondary_order_id: Option<String>,
    pub supply_qty: Decimal, // 本次运行开始时的剩余数量
    pub release_date: Option<NaiveDate>,
    pub finish_date: Option<NaiveDate>,
    pub batch: Option<String>,
    pub location: Option<String>,
}

impl SupplyRef {
    pub fn from_line(line: &SupplyLine) -> Self {
        Self {
            primary_order_id: line.primary_order_id.clone(),
            secondary_order_id: line.secondary_order_id.clone(),
            supply_qty: line.remaining_qty,
            release_date: line.release_date,
            finish_date: line.finish_date,
            batch: line.batch.clone(),
            location: line.location.clone(),
        }
    }
}

/// 分配来源
///
/// `Shortage` 与 `Stock` 不携带任何供给字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AllocationSource {
    Supply(SupplyRef),
    Shortage,
    Stock,
}

impl AllocationSource {
    pub fn kind(&self) -> AllocationKind {
        match self {
            AllocationSource::Supply(_) => AllocationKind::Supply,
            AllocationSource::Shortage => AllocationKind::Shortage,
            AllocationSource::Stock => AllocationKind::Stock,
        }
    }

    pub fn supply_ref(&self) -> Option<&SupplyRef> {
        match self {
            AllocationSource::Supply(supply) => Some(supply),
            _ => None,
        }
    }
}

// ==========================================
// AllocationRecord - 分配明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub demand_id: String,
    pub material_id: i64,
    pub customer_id: i64,
    pub due_date: NaiveDate,
    pub allocated_qty: Decimal,
    pub source: AllocationSource,
}

impl AllocationRecord {
    pub fn new(demand: &DemandLine, allocated_qty: Decimal, source: AllocationSource) -> Self {
        Self {
            demand_id: demand.demand_id.clone(),
            material_id: demand.material_id,
            customer_id: demand.customer_id,
            due_date: demand.due_date,
            allocated_qty,
            source,
        }
    }

    pub fn is_shortage(&self) -> bool {
        matches!(self.source, AllocationSource::Shortage)
    }
}
