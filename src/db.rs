// ==========================================
// ERP → 数据仓库同步 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout, 减少并发写入时的偶发 busy 错误
// - 幂等建表 (仓库侧仅建本系统读写的列)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 共享连接句柄
pub type SharedConnection = Arc<Mutex<Connection>>;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// foreign_keys / busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开连接并包装为共享句柄
pub fn open_shared_connection(db_path: &str) -> rusqlite::Result<SharedConnection> {
    Ok(Arc::new(Mutex::new(open_sqlite_connection(db_path)?)))
}

/// 仓库 schema (幂等)
const WAREHOUSE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL DEFAULT 'global',
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS etl_info (
    etl TEXT PRIMARY KEY,
    process_date TEXT
);

-- 维度表
CREATE TABLE IF NOT EXISTS material_dim (
    material_id INTEGER PRIMARY KEY,
    material_code TEXT NOT NULL UNIQUE,
    material_name TEXT
);

-- 客户按 (销售组织, 渠道, 产品组, 客户号) 组合唯一
CREATE TABLE IF NOT EXISTS customer_dim (
    customer_id INTEGER PRIMARY KEY,
    customer_code TEXT NOT NULL,
    sales_organization TEXT NOT NULL,
    channel TEXT NOT NULL,
    division TEXT NOT NULL,
    customer_name TEXT,
    UNIQUE (sales_organization, channel, division, customer_code)
);

CREATE TABLE IF NOT EXISTS vendor_dim (
    vendor_id INTEGER PRIMARY KEY,
    vendor_code TEXT NOT NULL UNIQUE,
    vendor_name TEXT
);

-- 分配输入 (仓库侧视图的物化)
CREATE TABLE IF NOT EXISTS dw_next_week_sales (
    sales_id TEXT NOT NULL,
    material_id INTEGER,
    cust_id INTEGER,
    goods_issue_date TEXT,
    qty_ordered REAL,
    qty_confirmed REAL
);

CREATE TABLE IF NOT EXISTS dw_daily_stock (
    material_id INTEGER,
    plant TEXT NOT NULL,
    stock_date TEXT NOT NULL,
    unrestricted_stock REAL,
    qty_stock REAL
);

-- 事实表
CREATE TABLE IF NOT EXISTS availability_calculation_fact (
    sales_id TEXT NOT NULL,
    material_id INTEGER NOT NULL,
    cust_id INTEGER NOT NULL,
    goods_issue_date TEXT NOT NULL,
    qty_confirmed REAL NOT NULL,
    supply_order_id_primary TEXT,
    supply_order_id_secondary TEXT,
    supply_qty REAL,
    release_date TEXT,
    finish_date TEXT,
    batch_number TEXT,
    location TEXT,
    allocation_kind TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sample_delivery_fact (
    delivery_id TEXT,
    delivery_type TEXT,
    goods_issue_date TEXT,
    real_goods_issue_date TEXT,
    status TEXT,
    modified_date TEXT,
    cust_id INTEGER,
    material_id INTEGER,
    sales_organization TEXT,
    sales_id TEXT NOT NULL,
    qty REAL,
    qty_ordered REAL,
    created_date TEXT
);

CREATE INDEX IF NOT EXISTS idx_sample_delivery_sales_id
  ON sample_delivery_fact(sales_id);

CREATE INDEX IF NOT EXISTS idx_sample_delivery_created
  ON sample_delivery_fact(created_date);

CREATE INDEX IF NOT EXISTS idx_daily_stock_date_plant
  ON dw_daily_stock(stock_date, plant);
"#;

/// 初始化仓库 schema 并记录版本
pub fn init_warehouse_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(WAREHOUSE_SCHEMA)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_warehouse_schema(&conn).unwrap();
        init_warehouse_schema(&conn).unwrap();

        assert_eq!(
            read_schema_version(&conn).unwrap(),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }
}
