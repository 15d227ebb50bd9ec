// ==========================================
// ERP → 数据仓库同步 - 配置层错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("缺少必需的环境变量: {0}")]
    MissingVar(String),

    #[error("配置值无效 (key={key}, value={value}): {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("配置锁获取失败: {0}")]
    LockError(String),

    #[error("配置读取失败: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
