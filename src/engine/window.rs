// ==========================================
// ERP → 数据仓库同步 - 同步时间窗口
// ==========================================
// 职责: 由同一个运行日期派生对账窗口、增量日期、供给视界
// 约束: 对账窗口与增量回看只在本模块定义, 不得分散在各作业中
// ==========================================

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// 对账窗口长度（月）, 从运行当月 1 日起往前
pub const RECONCILIATION_WINDOW_MONTHS: u32 = 12;

/// 增量回看天数（源系统按日记录修改日期）
pub const DELTA_LOOKBACK_DAYS: u64 = 1;

/// 默认供给视界（天）
pub const DEFAULT_SUPPLY_HORIZON_DAYS: u64 = 7;

/// 单次运行的时间窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWindow {
    pub run_date: NaiveDate,
    /// 对账窗口起点: 源系统 created > start, 仓库 created >= start
    pub window_start: NaiveDate,
    /// 增量日期: 源系统 last_modified = delta_date
    pub delta_date: NaiveDate,
    /// 供给视界: release_date <= supply_horizon_end
    pub supply_horizon_end: NaiveDate,
}

impl SyncWindow {
    pub fn for_run_date(run_date: NaiveDate) -> Self {
        Self::with_supply_horizon(run_date, DEFAULT_SUPPLY_HORIZON_DAYS)
    }

    pub fn with_supply_horizon(run_date: NaiveDate, supply_horizon_days: u64) -> Self {
        let first_of_month = run_date.with_day(1).unwrap_or(run_date);
        let window_start = first_of_month
            .checked_sub_months(Months::new(RECONCILIATION_WINDOW_MONTHS))
            .unwrap_or(NaiveDate::MIN);
        let delta_date = run_date
            .checked_sub_days(Days::new(DELTA_LOOKBACK_DAYS))
            .unwrap_or(run_date);
        let supply_horizon_end = run_date
            .checked_add_days(Days::new(supply_horizon_days))
            .unwrap_or(NaiveDate::MAX);

        Self {
            run_date,
            window_start,
            delta_date,
            supply_horizon_end,
        }
    }

    /// 源系统侧窗口判定（严格大于）
    pub fn source_contains(&self, created: Option<NaiveDate>) -> bool {
        created.is_some_and(|d| d > self.window_start)
    }
}
