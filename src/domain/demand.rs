// ==========================================
// ERP → 数据仓库同步 - 需求与库存领域模型
// ==========================================
// 用途: 分配引擎输入 (只读)
// ==========================================

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// DemandLine - 客户需求行
// ==========================================
// 顺序: 发货日期升序, 再按确认数量升序 (由加载器保证)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandLine {
    pub demand_id: String,       // 销售单号 (SalesId)
    pub material_id: i64,        // 物料代理键
    pub customer_id: i64,        // 客户代理键
    pub due_date: NaiveDate,     // 计划发货日期
    pub qty_ordered: Decimal,    // 订单数量
    pub qty_confirmed: Decimal,  // 确认数量 (>= 0)
}

// ==========================================
// StockSnapshot - 当日非限制库存快照
// ==========================================
// BTreeMap 保证迭代顺序稳定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot(BTreeMap<i64, Decimal>);

impl StockSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累加某物料库存（同物料多行时求和）
    pub fn add(&mut self, material_id: i64, qty: Decimal) {
        *self.0.entry(material_id).or_insert(Decimal::ZERO) += qty;
    }

    /// 物料可用库存，未知物料视为 0
    pub fn available(&self, material_id: i64) -> Decimal {
        self.0.get(&material_id).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(i64, Decimal)> for StockSnapshot {
    fn from_iter<T: IntoIterator<Item = (i64, Decimal)>>(iter: T) -> Self {
        let mut snapshot = StockSnapshot::new();
        for (material_id, qty) in iter {
            snapshot.add(material_id, qty);
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_snapshot_sums_duplicates() {
        let snapshot: StockSnapshot = vec![
            (1, Decimal::from(40)),
            (1, Decimal::from(60)),
            (2, Decimal::from(5)),
        ]
        .into_iter()
        .collect();

        assert_eq!(snapshot.available(1), Decimal::from(100));
        assert_eq!(snapshot.available(2), Decimal::from(5));
        assert_eq!(snapshot.available(99), Decimal::ZERO);
        assert_eq!(snapshot.len(), 2);
    }
}
