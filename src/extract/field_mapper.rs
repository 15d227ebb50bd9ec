// ==========================================
// ERP → 数据仓库同步 - 字段映射器
// ==========================================
// 职责: 原始行 (小写列名) → 强类型源系统行
// 约定: 自然键缺失的行报错, 其余字段按清洗规则强制转换
// ==========================================

use crate::extract::data_cleaner::DataCleaner;
use crate::extract::error::{ExtractError, ExtractResult};
use crate::extract::records::{ReleasedOrderRow, SampleOrderRow};
use crate::extract::traits::RawRow;

pub struct FieldMapper {
    cleaner: DataCleaner,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldMapper {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }

    /// 已下达订单行映射
    pub fn map_released_order(&self, row: &RawRow, row_number: usize) -> ExtractResult<ReleasedOrderRow> {
        Ok(ReleasedOrderRow {
            primary_order_id: self.required(row, "aufnr_zpa", row_number)?,
            secondary_order_id: self.optional(row, "aufnr_zsem"),
            // 物料代码缺失按空串处理, 由维度查找阶段丢弃
            material_code: self.optional(row, "matnr_zpa").unwrap_or_default(),
            planned_qty: self.cleaner.parse_decimal(self.raw(row, "gamng")),
            received_qty: self.cleaner.parse_decimal(self.raw(row, "wemng")),
            release_date: self.cleaner.parse_sap_date(self.raw(row, "gltrs")),
            finish_date: self.cleaner.parse_sap_date(self.raw(row, "gltri")),
            batch: self.optional(row, "charg"),
            location: self.optional(row, "lgort"),
        })
    }

    /// 样品订单行映射
    pub fn map_sample_order(&self, row: &RawRow, row_number: usize) -> ExtractResult<SampleOrderRow> {
        Ok(SampleOrderRow {
            sales_id: self.required(row, "salesid", row_number)?,
            delivery_id: self.optional(row, "vbeln").unwrap_or_default(),
            delivery_type: self.optional(row, "lfart"),
            material_code: self.optional(row, "matnr").unwrap_or_default(),
            goods_issue_date: self.cleaner.parse_sap_date(self.raw(row, "wadat")),
            real_goods_issue_date: self.cleaner.parse_sap_date(self.raw(row, "wadat_ist")),
            status: self.optional(row, "wbstk"),
            customer_code: self.optional(row, "kunnr").unwrap_or_default(),
            sales_organization: self.optional(row, "vkorg").unwrap_or_default(),
            division: self.optional(row, "spart").unwrap_or_default(),
            channel: self.optional(row, "vtweg").unwrap_or_default(),
            qty: self.cleaner.parse_decimal(self.raw(row, "lfimg")),
            qty_ordered: self.cleaner.parse_decimal(self.raw(row, "lsmeng")),
            modified_date: self.cleaner.parse_sap_date(self.raw(row, "aedat")),
            created_date: self.cleaner.parse_sap_date(self.raw(row, "erdat")),
        })
    }

    fn raw<'a>(&self, row: &'a RawRow, key: &str) -> Option<&'a str> {
        row.get(key).map(String::as_str)
    }

    fn optional(&self, row: &RawRow, key: &str) -> Option<String> {
        self.cleaner.normalize_null(self.raw(row, key))
    }

    fn required(&self, row: &RawRow, key: &str, row_number: usize) -> ExtractResult<String> {
        self.optional(row, key).ok_or_else(|| ExtractError::MissingField {
            row: row_number,
            field: key.to_string(),
        })
    }
}
