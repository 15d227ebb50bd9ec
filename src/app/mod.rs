// ==========================================
// ERP → 数据仓库同步 - 应用层
// ==========================================
// 职责: 组装运行时依赖, 供二进制入口使用
// ==========================================

pub mod state;

// 重导出
pub use state::AppState;
