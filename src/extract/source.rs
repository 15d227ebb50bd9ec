// ==========================================
// ERP → 数据仓库同步 - 抽取文件源
// ==========================================
// 职责: 从 ERP 导出目录读取抽取文件, 在内存中完成过滤与排序
// 文件: released_orders.(csv|xlsx) / sample_orders.(csv|xlsx)
// ==========================================

use crate::extract::error::{ExtractError, ExtractResult};
use crate::extract::field_mapper::FieldMapper;
use crate::extract::file_parser::UniversalFileParser;
use crate::extract::records::{ReleasedOrderRow, SampleOrderRow};
use crate::extract::traits::{ErpSource, FileParser};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 已下达订单抽取文件名（不含扩展名）
pub const RELEASED_ORDERS_FILE: &str = "released_orders";
/// 样品订单抽取文件名（不含扩展名）
pub const SAMPLE_ORDERS_FILE: &str = "sample_orders";

const SUPPORTED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

// ==========================================
// FileExtractSource - 基于抽取文件的 ERP 源
// ==========================================
pub struct FileExtractSource {
    extract_dir: PathBuf,
    parser: Box<dyn FileParser>,
    mapper: FieldMapper,
}

impl FileExtractSource {
    pub fn new<P: AsRef<Path>>(extract_dir: P) -> Self {
        Self {
            extract_dir: extract_dir.as_ref().to_path_buf(),
            parser: Box::new(UniversalFileParser),
            mapper: FieldMapper::new(),
        }
    }

    /// 按扩展名优先级定位抽取文件
    fn resolve_file(&self, stem: &str) -> ExtractResult<PathBuf> {
        SUPPORTED_EXTENSIONS
            .iter()
            .map(|ext| self.extract_dir.join(format!("{}.{}", stem, ext)))
            .find(|path| path.exists())
            .ok_or_else(|| {
                ExtractError::FileNotFound(self.extract_dir.join(stem).display().to_string())
            })
    }

    fn load_sample_orders(&self) -> ExtractResult<Vec<SampleOrderRow>> {
        let path = self.resolve_file(SAMPLE_ORDERS_FILE)?;
        let raw_rows = self.parser.parse_to_raw_records(&path)?;
        debug!(file = %path.display(), rows = raw_rows.len(), "读取样品订单抽取文件");

        let mut orders = Vec::with_capacity(raw_rows.len());
        let mut skipped = 0usize;
        for (idx, row) in raw_rows.iter().enumerate() {
            match self.mapper.map_sample_order(row, idx + 2) {
                Ok(order) => orders.push(order),
                Err(e) => {
                    skipped += 1;
                    warn!(error = %e, "样品订单行无法映射, 跳过");
                }
            }
        }
        if skipped > 0 {
            warn!(skipped, "样品订单抽取存在无效行");
        }

        Ok(orders)
    }
}

impl ErpSource for FileExtractSource {
    fn released_orders(&self, horizon_end: NaiveDate) -> ExtractResult<Vec<ReleasedOrderRow>> {
        let path = self.resolve_file(RELEASED_ORDERS_FILE)?;
        let raw_rows = self.parser.parse_to_raw_records(&path)?;
        debug!(file = %path.display(), rows = raw_rows.len(), "读取已下达订单抽取文件");

        let mut orders = Vec::with_capacity(raw_rows.len());
        let mut skipped = 0usize;
        for (idx, row) in raw_rows.iter().enumerate() {
            // 表头占第 1 行
            match self.mapper.map_released_order(row, idx + 2) {
                Ok(order) => orders.push(order),
                Err(e) => {
                    skipped += 1;
                    warn!(error = %e, "已下达订单行无法映射, 跳过");
                }
            }
        }
        if skipped > 0 {
            warn!(skipped, "已下达订单抽取存在无效行");
        }

        // 无下达日期的行保留在视界内, 分配时排在最后
        orders.retain(|o| o.release_date.map_or(true, |d| d <= horizon_end));
        orders.sort_by_key(|o| {
            (
                o.material_code.clone(),
                o.release_date.is_none(),
                o.release_date,
            )
        });

        Ok(orders)
    }

    fn sample_order_ids(
        &self,
        sales_organization: &str,
        created_after: NaiveDate,
    ) -> ExtractResult<BTreeSet<String>> {
        Ok(self
            .load_sample_orders()?
            .into_iter()
            .filter(|o| o.sales_organization == sales_organization)
            .filter(|o| o.created_date.is_some_and(|d| d > created_after))
            .map(|o| o.sales_id)
            .collect())
    }

    fn sample_orders_modified_on(
        &self,
        sales_organization: &str,
        modified_on: NaiveDate,
    ) -> ExtractResult<Vec<SampleOrderRow>> {
        Ok(self
            .load_sample_orders()?
            .into_iter()
            .filter(|o| o.sales_organization == sales_organization)
            .filter(|o| o.modified_date == Some(modified_on))
            .collect())
    }
}
