// ==========================================
// ERP → 数据仓库同步 - 领域模型层
// ==========================================
// 职责: 定义单次运行内的内存实体
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod allocation;
pub mod delivery;
pub mod demand;
pub mod supply;
pub mod types;

// 重导出核心类型
pub use allocation::{AllocationRecord, AllocationSource, SupplyRef};
pub use delivery::{DeltaRecord, SampleDeliveryRow};
pub use demand::{DemandLine, StockSnapshot};
pub use supply::SupplyLine;
pub use types::{round_qty, AllocationKind, Dimension, QTY_SCALE};
