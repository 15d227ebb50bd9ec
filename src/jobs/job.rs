// ==========================================
// ERP → 数据仓库同步 - 作业抽象与监督
// ==========================================
// 职责: 定义作业接口, 统一记录开始/耗时/结果
// 红线: 作业失败只记录日志, 不向调度器传播, 不中断进程
// ==========================================

use crate::jobs::error::{JobError, JobResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{error, info, info_span};
use uuid::Uuid;

// ==========================================
// Trait: EtlJob
// ==========================================
pub trait EtlJob: Send + Sync {
    /// 作业名（日志与手动触发使用）
    fn name(&self) -> &'static str;

    /// 以指定运行日期执行一次
    fn run(&self, run_date: NaiveDate) -> JobResult<JobReport>;
}

// ==========================================
// JobReport - 单次运行结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    pub run_id: Uuid,
    pub job: String,
    pub run_date: NaiveDate,
    pub rows_read: usize,    // 读取的输入行
    pub rows_written: usize, // 写入仓库的行
    pub rows_deleted: usize, // 从仓库删除的行
    pub rows_dropped: usize, // 因查找未命中等原因丢弃的行
    pub elapsed: Duration,
}

impl JobReport {
    pub fn new(job: &str, run_date: NaiveDate) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            job: job.to_string(),
            run_date,
            rows_read: 0,
            rows_written: 0,
            rows_deleted: 0,
            rows_dropped: 0,
            elapsed: Duration::ZERO,
        }
    }
}

/// 作业监督执行
///
/// 记录开始、耗时、成功计数或失败原因; panic 转换为 `JobError::Panicked`
pub fn run_job<F>(name: &str, f: F) -> JobResult<JobReport>
where
    F: FnOnce() -> JobResult<JobReport>,
{
    let run_id = Uuid::new_v4();
    let span = info_span!("job", job = name, %run_id);
    let _enter = span.enter();

    info!("作业开始");
    let started = Instant::now();

    let outcome = catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(JobError::Panicked(message))
    });

    let elapsed = started.elapsed();
    match outcome {
        Ok(mut report) => {
            report.run_id = run_id;
            report.elapsed = elapsed;
            info!(
                elapsed_ms = elapsed.as_millis() as u64,
                rows_read = report.rows_read,
                rows_written = report.rows_written,
                rows_deleted = report.rows_deleted,
                rows_dropped = report.rows_dropped,
                "作业完成"
            );
            Ok(report)
        }
        Err(e) => {
            error!(
                job = name,
                error = %e,
                elapsed_ms = elapsed.as_millis() as u64,
                "作业失败"
            );
            Err(e)
        }
    }
}

/// 以监督方式执行作业
pub fn run_etl_job(job: &dyn EtlJob, run_date: NaiveDate) -> JobResult<JobReport> {
    run_job(job.name(), || job.run(run_date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryError;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_run_job_stamps_run_id_and_elapsed() {
        let report = run_job("demo", || {
            let mut report = JobReport::new("demo", date());
            report.rows_written = 3;
            Ok(report)
        })
        .unwrap();

        assert_eq!(report.job, "demo");
        assert_eq!(report.rows_written, 3);
        assert!(!report.run_id.is_nil());
    }

    #[test]
    fn test_run_job_returns_error() {
        let result = run_job("demo", || {
            Err(JobError::Repository(RepositoryError::LockError("poisoned".into())))
        });
        assert!(matches!(result, Err(JobError::Repository(_))));
    }

    #[test]
    fn test_run_job_converts_panic() {
        let result = run_job("demo", || panic!("boom"));
        assert!(matches!(result, Err(JobError::Panicked(ref m)) if m == "boom"));
    }
}
