// ==========================================
// ERP → 数据仓库同步 - 配置管理器
// ==========================================
// 职责: 在环境变量配置之上叠加仓库侧覆写
// 存储: config_kv 表 (scope_id = 'global')
// ==========================================
// 优先级: config_kv > 环境变量 > 默认值
// 连接参数 (数据库路径 / 抽取目录) 不可覆写
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::etl_config::{parse_bool, parse_schedule_time, parse_value, EtlConfig};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// config_kv 覆写键
pub mod config_keys {
    pub const PLANT: &str = "etl/plant";
    pub const SALES_ORGANIZATION: &str = "etl/sales_organization";
    pub const DEFAULT_CHANNEL: &str = "etl/default_channel";
    pub const SUPPLY_HORIZON_DAYS: &str = "etl/supply_horizon_days";
    pub const EMIT_STOCK_COVERED: &str = "etl/emit_stock_covered";
    pub const CACHE_INVALIDATION_AT: &str = "etl/schedule/cache_invalidation_at";
    pub const AVAILABILITY_AT: &str = "etl/schedule/availability_at";
    pub const SAMPLE_DELIVERY_AT: &str = "etl/schedule/sample_delivery_at";

    pub const ALL: [&str; 8] = [
        PLANT,
        SALES_ORGANIZATION,
        DEFAULT_CHANNEL,
        SUPPLY_HORIZON_DAYS,
        EMIT_STOCK_COVERED,
        CACHE_INVALIDATION_AT,
        AVAILABILITY_AT,
        SAMPLE_DELIVERY_AT,
    ];
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
    }

    /// 写入 global scope 的配置值
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 当前生效的覆写项（仅已知键）
    pub fn overrides(&self) -> ConfigResult<BTreeMap<&'static str, String>> {
        let mut overrides = BTreeMap::new();
        for key in config_keys::ALL {
            if let Some(value) = self.get_global_config_value(key)? {
                overrides.insert(key, value);
            }
        }
        Ok(overrides)
    }

    /// 叠加覆写后的配置
    ///
    /// 非法覆写值被忽略并记录 warn, 保留环境变量取值
    pub fn apply_overrides(&self, mut config: EtlConfig) -> ConfigResult<EtlConfig> {
        let overrides = self.overrides()?;

        for (key, value) in &overrides {
            if let Err(e) = Self::apply_one(&mut config, key, value) {
                warn!(config_key = key, raw_value = %value, error = %e, "配置覆写无效, 已忽略");
            }
        }

        if !overrides.is_empty() {
            info!(overrides = overrides.len(), "已应用仓库配置覆写");
        }
        Ok(config)
    }

    fn apply_one(config: &mut EtlConfig, key: &str, value: &str) -> ConfigResult<()> {
        match key {
            config_keys::PLANT => config.plant = value.to_string(),
            config_keys::SALES_ORGANIZATION => config.sales_organization = value.to_string(),
            config_keys::DEFAULT_CHANNEL => config.default_channel = value.to_string(),
            config_keys::SUPPLY_HORIZON_DAYS => {
                config.supply_horizon_days = parse_value(key, value)?
            }
            config_keys::EMIT_STOCK_COVERED => config.emit_stock_covered = parse_bool(key, value)?,
            config_keys::CACHE_INVALIDATION_AT => {
                config.schedule.cache_invalidation_at = parse_schedule_time(key, value)?
            }
            config_keys::AVAILABILITY_AT => {
                config.schedule.availability_at = parse_schedule_time(key, value)?
            }
            config_keys::SAMPLE_DELIVERY_AT => {
                config.schedule.sample_delivery_at = parse_schedule_time(key, value)?
            }
            _ => {}
        }
        Ok(())
    }
}
