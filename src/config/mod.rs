// ==========================================
// ERP → 数据仓库同步 - 配置层
// ==========================================
// 职责: 环境变量配置 + 仓库侧覆写
// 存储: .env / 进程环境, config_kv 表
// ==========================================

pub mod config_manager;
pub mod error;
pub mod etl_config;

pub use config_manager::{config_keys, ConfigManager};
pub use error::{ConfigError, ConfigResult};
pub use etl_config::{env_keys, EtlConfig, ScheduleConfig};
