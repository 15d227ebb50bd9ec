// ==========================================
// ERP → 数据仓库同步 - 引擎层
// ==========================================
// 职责: 纯内存计算 (分配 / 对账 / 时间窗口)
// 红线: Engine 不拼 SQL, 不读写文件
// ==========================================

pub mod allocation;
pub mod reconciliation;
pub mod window;

// 重导出核心引擎
pub use allocation::{AllocationEngine, AllocationOptions, AllocationSummary};
pub use reconciliation::{ReconciliationEngine, ReconciliationPlan};
pub use window::{SyncWindow, DELTA_LOOKBACK_DAYS, RECONCILIATION_WINDOW_MONTHS};
