// ==========================================
// ERP → 数据仓库同步 - 每日调度器
// ==========================================
// 语义: 每个作业每天在 HH:MM 之后运行一次
// 并发: 同一时刻只运行一个作业, 到期作业按注册顺序串行执行
// 红线: 作业失败不影响调度循环
// ==========================================

use crate::jobs::error::JobResult;
use crate::jobs::job::{run_etl_job, EtlJob, JobReport};
use chrono::{Days, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// 调度条目
struct ScheduledJob {
    job: Arc<dyn EtlJob>,
    at: NaiveTime,
    last_run: Option<NaiveDate>,
}

impl ScheduledJob {
    fn is_due(&self, now: NaiveDateTime) -> bool {
        now.time() >= self.at && self.last_run.map_or(true, |d| d < now.date())
    }
}

/// 单次到期运行的结果
#[derive(Debug)]
pub struct JobRun {
    pub job: &'static str,
    pub outcome: JobResult<JobReport>,
}

#[derive(Default)]
pub struct Scheduler {
    entries: Vec<ScheduledJob>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册每日作业
    pub fn every_day_at(&mut self, at: NaiveTime, job: Arc<dyn EtlJob>) -> &mut Self {
        info!(job = job.name(), at = %at.format("%H:%M"), "注册每日作业");
        self.entries.push(ScheduledJob {
            job,
            at,
            last_run: None,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 启动时调用: 当天已过点的作业顺延到次日
    pub fn skip_elapsed(&mut self, now: NaiveDateTime) {
        for entry in &mut self.entries {
            if entry.is_due(now) {
                debug!(job = entry.job.name(), "启动时已过点, 顺延到次日");
                entry.last_run = Some(now.date());
            }
        }
    }

    /// 下一个到点时间（已到期的作业返回 now）
    pub fn next_run(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        self.entries
            .iter()
            .map(|entry| {
                if entry.is_due(now) {
                    now
                } else if now.time() < entry.at {
                    now.date().and_time(entry.at)
                } else {
                    // 今日已运行
                    (now.date() + Days::new(1)).and_time(entry.at)
                }
            })
            .min()
    }

    /// 运行所有到期作业（每个作业每个自然日至多一次）
    pub fn run_pending(&mut self, now: NaiveDateTime) -> Vec<JobRun> {
        let mut runs = Vec::new();
        for entry in self.entries.iter_mut().filter(|e| e.is_due(now)) {
            let outcome = run_etl_job(entry.job.as_ref(), now.date());
            entry.last_run = Some(now.date());
            runs.push(JobRun {
                job: entry.job.name(),
                outcome,
            });
        }
        runs
    }

    /// 轮询直到进程退出
    pub async fn run_forever(self, poll_interval: Duration) {
        self.run_until(poll_interval, std::future::pending::<()>())
            .await
    }

    /// 轮询直到 shutdown 完成
    ///
    /// 作业在阻塞线程池中执行, 轮询间隔内不重入
    pub async fn run_until<F>(mut self, poll_interval: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(jobs = self.entries.len(), poll_secs = poll_interval.as_secs(), "调度器启动");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("调度器收到停止信号");
                    break;
                }
                _ = ticker.tick() => {
                    let now = Local::now().naive_local();
                    self.run_pending_blocking(now).await;
                }
            }
        }
    }

    async fn run_pending_blocking(&mut self, now: NaiveDateTime) {
        for entry in self.entries.iter_mut().filter(|e| e.is_due(now)) {
            let job = Arc::clone(&entry.job);
            let run_date = now.date();
            let joined =
                tokio::task::spawn_blocking(move || run_etl_job(job.as_ref(), run_date)).await;
            entry.last_run = Some(run_date);
            if let Err(e) = joined {
                error!(job = entry.job.name(), error = %e, "作业线程异常退出");
            }
        }
    }
}
