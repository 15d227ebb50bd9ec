// ==========================================
// ERP → 数据仓库同步 - 供给领域模型
// ==========================================
// 用途: 已下达的生产/采购订单（未来供给）
// ==========================================

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// SupplyLine - 待入库供给行
// ==========================================
// remaining_qty 在单次分配中单调递减,不会为负
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyLine {
    pub primary_order_id: String,           // 成品订单号
    pub secondary_order_id: Option<String>, // 半成品订单号
    pub material_id: i64,                   // 物料代理键
    pub remaining_qty: Decimal,             // 计划数量 - 已收货数量
    pub release_date: Option<NaiveDate>,    // 下达/计划开始日期
    pub finish_date: Option<NaiveDate>,     // 计划完工日期
    pub batch: Option<String>,              // 批次
    pub location: Option<String>,           // 库存地点
}
