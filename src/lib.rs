// ==========================================
// ERP → 数据仓库同步 - 核心库
// ==========================================
// 技术栈: Rust + SQLite (仓库) + 抽取文件 (ERP)
// 系统定位: 夜间批处理 (需求供给分配 + 增量对账)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 分配与对账
pub mod engine;

// 抽取层 - ERP 源数据
pub mod extract;

// 配置层 - 环境变量与覆写
pub mod config;

// 作业层 - 编排与调度
pub mod jobs;

// 应用层 - 运行时组装
pub mod app;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    AllocationKind, AllocationRecord, AllocationSource, DemandLine, DeltaRecord, Dimension,
    SampleDeliveryRow, StockSnapshot, SupplyLine, SupplyRef,
};

// 引擎
pub use engine::{
    AllocationEngine, AllocationOptions, ReconciliationEngine, ReconciliationPlan, SyncWindow,
};

// 作业
pub use jobs::{EtlJob, JobError, JobReport, Scheduler};

pub use app::AppState;
pub use config::EtlConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "ERP → 数据仓库同步";
