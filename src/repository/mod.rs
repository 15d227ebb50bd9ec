// ==========================================
// ERP → 数据仓库同步 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供仓库读写接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 精度: 数量列以 REAL 存储, 写入前按 4 位小数取整
// ==========================================

pub mod availability_repo;
pub mod dimension_lookup;
pub mod error;
pub mod etl_info_repo;
pub mod planning_repo;
pub mod sample_delivery_repo;

// 重导出核心仓储
pub use availability_repo::AvailabilityRepository;
pub use dimension_lookup::{customer_key, lookup_customer, DimensionLookupCache, LookupMap};
pub use error::{RepositoryError, RepositoryResult};
pub use etl_info_repo::EtlInfoRepository;
pub use planning_repo::PlanningRepository;
pub use sample_delivery_repo::{ApplyStats, SampleDeliveryRepository};

use crate::domain::types::round_qty;
use crate::extract::DataCleaner;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Decimal → REAL
pub(crate) fn qty_to_sql(qty: Decimal) -> f64 {
    round_qty(qty).to_f64().unwrap_or_default()
}

/// REAL → Decimal（NULL / 非法值 → 0, 消除浮点尾差）
pub(crate) fn qty_from_sql(value: Option<f64>) -> Decimal {
    round_qty(DataCleaner.decimal_from_f64(value))
}

/// TEXT → 日期（非法值 → None）
pub(crate) fn date_from_sql(value: Option<String>) -> Option<NaiveDate> {
    DataCleaner.parse_sap_date(value.as_deref())
}
