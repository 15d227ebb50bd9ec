// ==========================================
// ERP → 数据仓库同步 - 维度缓存失效作业
// ==========================================
// 每日凌晨执行, 使夜间维度表变更在后续作业中生效
// ==========================================

use crate::jobs::error::JobResult;
use crate::jobs::job::{EtlJob, JobReport};
use crate::repository::DimensionLookupCache;
use chrono::NaiveDate;
use std::sync::Arc;

pub struct CacheInvalidationJob {
    lookup: Arc<DimensionLookupCache>,
}

impl CacheInvalidationJob {
    pub fn new(lookup: Arc<DimensionLookupCache>) -> Self {
        Self { lookup }
    }
}

impl EtlJob for CacheInvalidationJob {
    fn name(&self) -> &'static str {
        "invalidate_cache"
    }

    fn run(&self, run_date: NaiveDate) -> JobResult<JobReport> {
        // 已清空的维度数由 invalidate() 记录日志, 不计入行数
        self.lookup.invalidate()?;
        Ok(JobReport::new(self.name(), run_date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_warehouse_schema;
    use crate::domain::types::Dimension;
    use rusqlite::Connection;
    use std::sync::Mutex;

    #[test]
    fn test_invalidate_clears_cache_without_row_counts() {
        let conn = Connection::open_in_memory().unwrap();
        init_warehouse_schema(&conn).unwrap();
        let lookup = Arc::new(DimensionLookupCache::new(Arc::new(Mutex::new(conn))));
        lookup.map(Dimension::Material).unwrap();
        lookup.map(Dimension::Customer).unwrap();

        let job = CacheInvalidationJob::new(lookup.clone());
        let report = job
            .run(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
            .unwrap();

        assert!(lookup.loaded_dimensions().unwrap().is_empty());
        assert_eq!(report.rows_deleted, 0);
        assert_eq!(report.rows_written, 0);
    }
}
