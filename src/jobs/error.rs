// ==========================================
// ERP → 数据仓库同步 - 作业层错误类型
// ==========================================

use crate::config::ConfigError;
use crate::extract::ExtractError;
use crate::repository::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("源系统抽取失败: {0}")]
    Extract(#[from] ExtractError),

    #[error("仓库读写失败: {0}")]
    Repository(#[from] RepositoryError),

    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("未知作业: {0}")]
    UnknownJob(String),

    #[error("作业异常终止: {0}")]
    Panicked(String),
}

pub type JobResult<T> = Result<T, JobError>;
