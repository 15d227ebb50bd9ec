// ==========================================
// ERP → 数据仓库同步 - 运行配置
// ==========================================
// 来源: .env 文件 + 进程环境变量
// 约定: 配置显式构造后传入各作业, 不使用全局单例
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::engine::window::DEFAULT_SUPPLY_HORIZON_DAYS;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// 环境变量名
pub mod env_keys {
    pub const DATABASE_PATH: &str = "DW_DATABASE_PATH";
    pub const EXTRACT_DIR: &str = "ERP_EXTRACT_DIR";
    pub const PLANT: &str = "ETL_PLANT";
    pub const SALES_ORGANIZATION: &str = "ETL_SALES_ORGANIZATION";
    pub const DEFAULT_CHANNEL: &str = "ETL_DEFAULT_CHANNEL";
    pub const SUPPLY_HORIZON_DAYS: &str = "ETL_SUPPLY_HORIZON_DAYS";
    pub const POLL_INTERVAL_SECS: &str = "ETL_POLL_INTERVAL_SECS";
    pub const EMIT_STOCK_COVERED: &str = "ETL_EMIT_STOCK_COVERED";
    pub const CACHE_INVALIDATION_AT: &str = "ETL_CACHE_INVALIDATION_AT";
    pub const AVAILABILITY_AT: &str = "ETL_AVAILABILITY_AT";
    pub const SAMPLE_DELIVERY_AT: &str = "ETL_SAMPLE_DELIVERY_AT";
}

pub const DEFAULT_PLANT: &str = "1000";
pub const DEFAULT_SALES_ORGANIZATION: &str = "1000";
pub const DEFAULT_CHANNEL: &str = "10";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// 调度时间格式
pub const SCHEDULE_TIME_FORMAT: &str = "%H:%M";

// ==========================================
// ScheduleConfig - 每日作业时间
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub cache_invalidation_at: NaiveTime,
    pub availability_at: NaiveTime,
    pub sample_delivery_at: NaiveTime,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cache_invalidation_at: NaiveTime::from_hms_opt(1, 0, 0).unwrap_or_default(),
            availability_at: NaiveTime::from_hms_opt(3, 0, 0).unwrap_or_default(),
            sample_delivery_at: NaiveTime::from_hms_opt(3, 0, 0).unwrap_or_default(),
        }
    }
}

// ==========================================
// EtlConfig - 同步作业配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtlConfig {
    pub database_path: String,
    pub extract_dir: PathBuf,
    pub plant: String,              // 库存快照工厂
    pub sales_organization: String, // 样品订单销售组织
    pub default_channel: String,    // 客户查找回退渠道
    pub supply_horizon_days: u64,
    pub poll_interval_secs: u64,
    pub emit_stock_covered: bool,
    pub schedule: ScheduleConfig,
}

impl EtlConfig {
    /// 以必需项构造, 其余取默认值
    pub fn new(database_path: impl Into<String>, extract_dir: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            extract_dir: extract_dir.into(),
            plant: DEFAULT_PLANT.to_string(),
            sales_organization: DEFAULT_SALES_ORGANIZATION.to_string(),
            default_channel: DEFAULT_CHANNEL.to_string(),
            supply_horizon_days: DEFAULT_SUPPLY_HORIZON_DAYS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            emit_stock_covered: false,
            schedule: ScheduleConfig::default(),
        }
    }

    /// 加载 .env 后从进程环境变量读取
    pub fn from_env() -> ConfigResult<Self> {
        // .env 缺失不是错误
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取（测试时注入）
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| get(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()));

        let mut config = Self::new(
            require(env_keys::DATABASE_PATH)?,
            require(env_keys::EXTRACT_DIR)?,
        );

        if let Some(v) = get(env_keys::PLANT) {
            config.plant = v;
        }
        if let Some(v) = get(env_keys::SALES_ORGANIZATION) {
            config.sales_organization = v;
        }
        if let Some(v) = get(env_keys::DEFAULT_CHANNEL) {
            config.default_channel = v;
        }
        if let Some(v) = get(env_keys::SUPPLY_HORIZON_DAYS) {
            config.supply_horizon_days = parse_value(env_keys::SUPPLY_HORIZON_DAYS, &v)?;
        }
        if let Some(v) = get(env_keys::POLL_INTERVAL_SECS) {
            config.poll_interval_secs = parse_value(env_keys::POLL_INTERVAL_SECS, &v)?;
        }
        if let Some(v) = get(env_keys::EMIT_STOCK_COVERED) {
            config.emit_stock_covered = parse_bool(env_keys::EMIT_STOCK_COVERED, &v)?;
        }
        if let Some(v) = get(env_keys::CACHE_INVALIDATION_AT) {
            config.schedule.cache_invalidation_at =
                parse_schedule_time(env_keys::CACHE_INVALIDATION_AT, &v)?;
        }
        if let Some(v) = get(env_keys::AVAILABILITY_AT) {
            config.schedule.availability_at = parse_schedule_time(env_keys::AVAILABILITY_AT, &v)?;
        }
        if let Some(v) = get(env_keys::SAMPLE_DELIVERY_AT) {
            config.schedule.sample_delivery_at =
                parse_schedule_time(env_keys::SAMPLE_DELIVERY_AT, &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// 取值范围校验
    pub fn validate(&self) -> ConfigResult<()> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: env_keys::POLL_INTERVAL_SECS.to_string(),
                value: "0".to_string(),
                reason: "轮询间隔必须大于 0".to_string(),
            });
        }
        Ok(())
    }
}

pub(crate) fn parse_value<T>(key: &str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "应为 true/false".to_string(),
        }),
    }
}

pub(crate) fn parse_schedule_time(key: &str, value: &str) -> ConfigResult<NaiveTime> {
    NaiveTime::parse_from_str(value, SCHEDULE_TIME_FORMAT).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}
