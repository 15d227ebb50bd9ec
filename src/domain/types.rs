// ==========================================
// ERP → 数据仓库同步 - 领域类型定义
// ==========================================
// 职责: 维度枚举、分配来源类别、数量精度常量
// ==========================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 仓库数量列精度 (decimal(15,4))
pub const QTY_SCALE: u32 = 4;

/// 按仓库精度截断数量（四舍五入到 4 位小数）
pub fn round_qty(qty: Decimal) -> Decimal {
    qty.round_dp(QTY_SCALE)
}

// ==========================================
// 维度 (Dimension)
// ==========================================
// 业务代码 → 代理键 的查找维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Dimension {
    Material, // 物料
    Customer, // 客户 (组织+渠道+产品组+客户号 组合代码)
    Vendor,   // 供应商
}

impl Dimension {
    /// 维度表及其 (代理键列, 业务代码列)
    pub fn table_columns(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            Dimension::Material => ("material_dim", "material_id", "material_code"),
            Dimension::Customer => ("customer_dim", "customer_id", "customer_code"),
            Dimension::Vendor => ("vendor_dim", "vendor_id", "vendor_code"),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Material => write!(f, "MATERIAL"),
            Dimension::Customer => write!(f, "CUSTOMER"),
            Dimension::Vendor => write!(f, "VENDOR"),
        }
    }
}

// ==========================================
// 分配类别 (Allocation Kind)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationKind {
    Supply,   // 由未来供给满足
    Shortage, // 缺口
    Stock,    // 由当日库存满足
}

impl AllocationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationKind::Supply => "SUPPLY",
            AllocationKind::Shortage => "SHORTAGE",
            AllocationKind::Stock => "STOCK",
        }
    }
}

impl fmt::Display for AllocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
