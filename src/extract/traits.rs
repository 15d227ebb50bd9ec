// ==========================================
// ERP → 数据仓库同步 - 抽取层 Trait
// ==========================================
// 职责: 定义源系统读取接口（不包含实现）
// ==========================================

use crate::extract::error::ExtractResult;
use crate::extract::records::{ReleasedOrderRow, SampleOrderRow};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// 原始行记录（小写列名 → 值）
pub type RawRow = HashMap<String, String>;

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录
    fn parse_to_raw_records(&self, file_path: &Path) -> ExtractResult<Vec<RawRow>>;
}

// ==========================================
// ErpSource Trait
// ==========================================
// 用途: 源系统（ERP）读取接口, 过滤条件在实现内完成
// 实现者: CsvErpSource
pub trait ErpSource: Send + Sync {
    /// 已下达的生产/采购订单
    ///
    /// 仅返回 release_date <= horizon_end 的行, 按 (物料代码, 下达日期) 排序
    fn released_orders(&self, horizon_end: NaiveDate) -> ExtractResult<Vec<ReleasedOrderRow>>;

    /// 窗口内（created > created_after）源系统存在的样品订单自然键
    fn sample_order_ids(
        &self,
        sales_organization: &str,
        created_after: NaiveDate,
    ) -> ExtractResult<BTreeSet<String>>;

    /// 指定日期修改过的样品订单（完整行）
    fn sample_orders_modified_on(
        &self,
        sales_organization: &str,
        modified_on: NaiveDate,
    ) -> ExtractResult<Vec<SampleOrderRow>>;
}
