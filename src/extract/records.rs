// ==========================================
// ERP → 数据仓库同步 - 源系统行结构
// ==========================================
// 用途: 字段映射后的强类型中间结构 (已完成强制转换)
// ==========================================

use chrono::NaiveDate;
use rust_decimal::Decimal;

// ==========================================
// ReleasedOrderRow - 已下达订单 (供给)
// ==========================================
// 来源列: AUFNR_ZPA, AUFNR_ZSEM, MATNR_ZPA, GAMNG, WEMNG, GLTRS, GLTRI, CHARG, LGORT
#[derive(Debug, Clone, PartialEq)]
pub struct ReleasedOrderRow {
    pub primary_order_id: String,           // AUFNR_ZPA
    pub secondary_order_id: Option<String>, // AUFNR_ZSEM
    pub material_code: String,              // MATNR_ZPA
    pub planned_qty: Decimal,               // GAMNG
    pub received_qty: Decimal,              // WEMNG
    pub release_date: Option<NaiveDate>,    // GLTRS
    pub finish_date: Option<NaiveDate>,     // GLTRI
    pub batch: Option<String>,              // CHARG
    pub location: Option<String>,           // LGORT
}

impl ReleasedOrderRow {
    pub fn remaining_qty(&self) -> Decimal {
        self.planned_qty - self.received_qty
    }
}

// ==========================================
// SampleOrderRow - 样品订单交货行
// ==========================================
// 来源列: LFART, VBELN, MATNR, WADAT, WADAT_IST, WBSTK, KUNNR, VKORG, SPART,
//         VTWEG, SALESID, LFIMG, AEDAT, ERDAT, LSMENG
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOrderRow {
    pub sales_id: String,                        // SALESID (自然键)
    pub delivery_id: String,                     // VBELN
    pub delivery_type: Option<String>,           // LFART
    pub material_code: String,                   // MATNR
    pub goods_issue_date: Option<NaiveDate>,     // WADAT
    pub real_goods_issue_date: Option<NaiveDate>, // WADAT_IST
    pub status: Option<String>,                  // WBSTK
    pub customer_code: String,                   // KUNNR
    pub sales_organization: String,              // VKORG
    pub division: String,                        // SPART
    pub channel: String,                         // VTWEG
    pub qty: Decimal,                            // LFIMG
    pub qty_ordered: Decimal,                    // LSMENG
    pub modified_date: Option<NaiveDate>,        // AEDAT
    pub created_date: Option<NaiveDate>,         // ERDAT
}
