// ==========================================
// ERP → 数据仓库同步 - 应用状态
// ==========================================
// 职责: 组装共享连接、维度缓存、ERP 源与全部作业
// 守护进程与手动运行入口共用
// ==========================================

use crate::config::{ConfigManager, EtlConfig};
use crate::db::{init_warehouse_schema, open_shared_connection, SharedConnection};
use crate::engine::allocation::AllocationOptions;
use crate::extract::{ErpSource, FileExtractSource};
use crate::jobs::{
    AvailabilityCalculationJob, CacheInvalidationJob, EtlJob, JobError, JobResult,
    SampleDeliveryJob, Scheduler,
};
use crate::repository::{DimensionLookupCache, RepositoryError};
use std::sync::Arc;
use std::time::Duration;

/// 应用状态
pub struct AppState {
    /// 生效配置（已叠加 config_kv 覆写）
    pub config: EtlConfig,
    pub conn: SharedConnection,
    pub lookup: Arc<DimensionLookupCache>,
    pub cache_invalidation_job: Arc<dyn EtlJob>,
    pub availability_job: Arc<dyn EtlJob>,
    pub sample_delivery_job: Arc<dyn EtlJob>,
}

impl AppState {
    /// 打开仓库连接并组装作业
    pub fn new(config: EtlConfig) -> JobResult<Self> {
        tracing::info!(db_path = %config.database_path, "初始化AppState");

        let conn = open_shared_connection(&config.database_path).map_err(RepositoryError::from)?;
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            init_warehouse_schema(&guard).map_err(RepositoryError::from)?;
        }

        let config = ConfigManager::from_connection(conn.clone()).apply_overrides(config)?;
        let source: Arc<dyn ErpSource> = Arc::new(FileExtractSource::new(&config.extract_dir));

        Ok(Self::with_source(config, conn, source))
    }

    /// 以给定连接与 ERP 源组装（测试注入）
    pub fn with_source(config: EtlConfig, conn: SharedConnection, source: Arc<dyn ErpSource>) -> Self {
        let lookup = Arc::new(DimensionLookupCache::new(conn.clone()));

        let cache_invalidation_job: Arc<dyn EtlJob> =
            Arc::new(CacheInvalidationJob::new(lookup.clone()));
        let availability_job: Arc<dyn EtlJob> = Arc::new(AvailabilityCalculationJob::new(
            conn.clone(),
            source.clone(),
            lookup.clone(),
            AllocationOptions {
                emit_stock_covered: config.emit_stock_covered,
            },
            config.plant.clone(),
            config.supply_horizon_days,
        ));
        let sample_delivery_job: Arc<dyn EtlJob> = Arc::new(SampleDeliveryJob::new(
            conn.clone(),
            source,
            lookup.clone(),
            config.sales_organization.clone(),
            config.default_channel.clone(),
        ));

        Self {
            config,
            conn,
            lookup,
            cache_invalidation_job,
            availability_job,
            sample_delivery_job,
        }
    }

    /// 全部作业（注册顺序即同一时刻的执行顺序）
    pub fn jobs(&self) -> Vec<Arc<dyn EtlJob>> {
        vec![
            self.cache_invalidation_job.clone(),
            self.availability_job.clone(),
            self.sample_delivery_job.clone(),
        ]
    }

    /// 按名称查找作业
    pub fn job_by_name(&self, name: &str) -> JobResult<Arc<dyn EtlJob>> {
        self.jobs()
            .into_iter()
            .find(|job| job.name() == name)
            .ok_or_else(|| JobError::UnknownJob(name.to_string()))
    }

    /// 按配置时间构建每日调度
    pub fn scheduler(&self) -> Scheduler {
        let schedule = &self.config.schedule;
        let mut scheduler = Scheduler::new();
        scheduler
            .every_day_at(schedule.cache_invalidation_at, self.cache_invalidation_job.clone())
            .every_day_at(schedule.availability_at, self.availability_job.clone())
            .every_day_at(schedule.sample_delivery_at, self.sample_delivery_job.clone());
        scheduler
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.poll_interval_secs)
    }
}
