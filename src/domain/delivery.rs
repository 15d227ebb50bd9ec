// ==========================================
// ERP → 数据仓库同步 - 样品交货领域模型
// ==========================================
// 用途: 增量对账实体 (sample_delivery_fact)
// 自然键: sales_id
// ==========================================

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Trait: DeltaRecord
// ==========================================
// 用途: 对账引擎按自然键识别增量行
pub trait DeltaRecord {
    /// 自然键（源系统业务标识）
    fn natural_id(&self) -> &str;
}

// ==========================================
// SampleDeliveryRow - 样品交货事实行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleDeliveryRow {
    pub delivery_id: String,
    pub delivery_type: Option<String>,
    pub goods_issue_date: Option<NaiveDate>,
    pub real_goods_issue_date: Option<NaiveDate>,
    pub status: String,                    // 缺省 'A'
    pub modified_date: Option<NaiveDate>,  // 修改日期, 缺失时取创建日期
    pub customer_id: i64,
    pub material_id: i64,
    pub sales_organization: String,
    pub sales_id: String,
    pub qty: Decimal,
    pub qty_ordered: Decimal,
    pub created_date: Option<NaiveDate>,
}

impl DeltaRecord for SampleDeliveryRow {
    fn natural_id(&self) -> &str {
        &self.sales_id
    }
}
