// ==========================================
// ERP → 数据仓库同步 - 作业层
// ==========================================
// 职责: 编排 抽取 → 引擎 → 仓储, 每日调度
// ==========================================

pub mod availability_job;
pub mod cache_invalidation_job;
pub mod error;
pub mod job;
pub mod sample_delivery_job;
pub mod scheduler;

pub use availability_job::{AvailabilityCalculationJob, AVAILABILITY_ETL_NAME};
pub use cache_invalidation_job::CacheInvalidationJob;
pub use error::{JobError, JobResult};
pub use job::{run_etl_job, run_job, EtlJob, JobReport};
pub use sample_delivery_job::{DeliveryRowMapper, SampleDeliveryJob, SAMPLE_DELIVERY_ETL_NAME};
pub use scheduler::{JobRun, Scheduler};
