// ==========================================
// ERP → 数据仓库同步 - 维度查找缓存
// ==========================================
// 职责: 业务代码 → 代理键 的进程内缓存
// 生命周期: 按维度懒加载, 失效后下次访问重新加载
// 并发: RwLock 保护 Arc<HashMap> 整体替换, 读方持有快照不受失效影响
// ==========================================

use crate::domain::types::Dimension;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};

/// 单个维度的 代码 → 代理键 映射
pub type LookupMap = HashMap<String, i64>;

/// 客户组合键: 销售组织 + 渠道 + 产品组 + 客户号
pub fn customer_key(
    sales_organization: &str,
    channel: &str,
    division: &str,
    customer_code: &str,
) -> String {
    format!("{sales_organization}{channel}{division}{customer_code}")
}

/// 在客户映射中查找, 未命中时以默认渠道重试一次
pub fn lookup_customer(
    customers: &LookupMap,
    sales_organization: &str,
    channel: &str,
    division: &str,
    customer_code: &str,
    default_channel: &str,
) -> Option<i64> {
    customers
        .get(&customer_key(sales_organization, channel, division, customer_code))
        .or_else(|| {
            customers.get(&customer_key(
                sales_organization,
                default_channel,
                division,
                customer_code,
            ))
        })
        .copied()
}

pub struct DimensionLookupCache {
    conn: Arc<Mutex<Connection>>,
    maps: RwLock<HashMap<Dimension, Arc<LookupMap>>>,
}

impl DimensionLookupCache {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            maps: RwLock::new(HashMap::new()),
        }
    }

    /// 获取维度映射快照（未加载时从仓库加载）
    pub fn map(&self, dimension: Dimension) -> RepositoryResult<Arc<LookupMap>> {
        {
            let maps = self
                .maps
                .read()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            if let Some(map) = maps.get(&dimension) {
                return Ok(Arc::clone(map));
            }
        }

        let loaded = Arc::new(self.load(dimension)?);
        let mut maps = self
            .maps
            .write()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        // 并发加载时保留先写入者
        let entry = maps.entry(dimension).or_insert(loaded);
        Ok(Arc::clone(entry))
    }

    /// 按业务代码解析代理键, 未命中返回 None
    pub fn resolve(&self, dimension: Dimension, code: &str) -> RepositoryResult<Option<i64>> {
        Ok(self.map(dimension)?.get(code).copied())
    }

    /// 解析客户代理键
    pub fn resolve_customer(
        &self,
        sales_organization: &str,
        channel: &str,
        division: &str,
        customer_code: &str,
        default_channel: &str,
    ) -> RepositoryResult<Option<i64>> {
        let map = self.map(Dimension::Customer)?;
        Ok(lookup_customer(
            &map,
            sales_organization,
            channel,
            division,
            customer_code,
            default_channel,
        ))
    }

    /// 清空全部维度缓存
    pub fn invalidate(&self) -> RepositoryResult<()> {
        let mut maps = self
            .maps
            .write()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let cleared = maps.len();
        maps.clear();
        info!(cleared, "维度缓存已失效");
        Ok(())
    }

    /// 清空单个维度缓存
    pub fn invalidate_dimension(&self, dimension: Dimension) -> RepositoryResult<()> {
        let mut maps = self
            .maps
            .write()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        maps.remove(&dimension);
        debug!(%dimension, "单维度缓存已失效");
        Ok(())
    }

    /// 已加载的维度（按枚举顺序）
    pub fn loaded_dimensions(&self) -> RepositoryResult<Vec<Dimension>> {
        let maps = self
            .maps
            .read()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let mut loaded: Vec<Dimension> = maps.keys().copied().collect();
        loaded.sort();
        Ok(loaded)
    }

    fn load(&self, dimension: Dimension) -> RepositoryResult<LookupMap> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(&Self::load_sql(dimension))?;
        let map = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<LookupMap, _>>()?;

        info!(%dimension, entries = map.len(), "维度缓存加载完成");
        Ok(map)
    }

    fn load_sql(dimension: Dimension) -> String {
        let (table, id_column, code_column) = dimension.table_columns();
        let key_expr = match dimension {
            Dimension::Customer => {
                format!("sales_organization || channel || division || {code_column}")
            }
            Dimension::Material | Dimension::Vendor => code_column.to_string(),
        };
        format!("SELECT {key_expr}, {id_column} FROM {table} WHERE {key_expr} IS NOT NULL")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_warehouse_schema;

    fn setup() -> (Arc<Mutex<Connection>>, DimensionLookupCache) {
        let conn = Connection::open_in_memory().unwrap();
        init_warehouse_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO material_dim (material_id, material_code) VALUES (1, 'MA'), (2, 'MB');
            INSERT INTO customer_dim (customer_id, customer_code, sales_organization, channel, division)
              VALUES (10, 'C1', '1000', '20', '01'), (11, 'C2', '1000', '10', '01');
            "#,
        )
        .unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let cache = DimensionLookupCache::new(conn.clone());
        (conn, cache)
    }

    #[test]
    fn test_resolve_material() {
        let (_conn, cache) = setup();
        assert_eq!(cache.resolve(Dimension::Material, "MA").unwrap(), Some(1));
        assert_eq!(cache.resolve(Dimension::Material, "ZZ").unwrap(), None);
        assert_eq!(
            cache.loaded_dimensions().unwrap(),
            vec![Dimension::Material]
        );
    }

    #[test]
    fn test_resolve_customer_with_channel_fallback() {
        let (_conn, cache) = setup();
        // 精确命中
        assert_eq!(
            cache.resolve_customer("1000", "20", "01", "C1", "10").unwrap(),
            Some(10)
        );
        // 渠道 30 未命中, 回退到默认渠道 10
        assert_eq!(
            cache.resolve_customer("1000", "30", "01", "C2", "10").unwrap(),
            Some(11)
        );
        // 两次均未命中
        assert_eq!(
            cache.resolve_customer("2000", "20", "01", "C1", "10").unwrap(),
            None
        );
    }

    #[test]
    fn test_invalidate_reloads_on_next_access() {
        let (conn, cache) = setup();
        assert_eq!(cache.resolve(Dimension::Material, "MC").unwrap(), None);

        conn.lock()
            .unwrap()
            .execute(
                "INSERT INTO material_dim (material_id, material_code) VALUES (3, 'MC')",
                [],
            )
            .unwrap();

        // 缓存未失效前仍是旧快照
        assert_eq!(cache.resolve(Dimension::Material, "MC").unwrap(), None);

        cache.invalidate().unwrap();
        assert!(cache.loaded_dimensions().unwrap().is_empty());
        assert_eq!(cache.resolve(Dimension::Material, "MC").unwrap(), Some(3));
    }

    #[test]
    fn test_snapshot_survives_invalidation() {
        let (_conn, cache) = setup();
        let snapshot = cache.map(Dimension::Material).unwrap();
        cache.invalidate_dimension(Dimension::Material).unwrap();
        assert_eq!(snapshot.get("MB"), Some(&2));
    }
}
