// ==========================================
// ERP → 数据仓库同步 - 增量对账引擎
// ==========================================
// 职责: 识别源系统已物理删除的记录, 并合并当日增量
// 输入: 源系统自然键集合 + 仓库自然键集合 + 增量批次
// 输出: 删除集合 + 待写入行
// ==========================================
// 红线: 增量批次中的自然键永远不进入删除集合
// ==========================================

use crate::domain::DeltaRecord;
use std::collections::BTreeSet;
use tracing::{debug, info};

// ==========================================
// ReconciliationPlan - 对账结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationPlan<R> {
    /// 仓库存在、源系统已不存在、且不在当日增量中的自然键
    pub deletions: BTreeSet<String>,
    /// 当日增量（删除后重新插入）
    pub upserts: Vec<R>,
}

impl<R: DeltaRecord> ReconciliationPlan<R> {
    /// 增量批次涉及的自然键
    pub fn touched_ids(&self) -> BTreeSet<String> {
        self.upserts
            .iter()
            .map(|r| r.natural_id().to_string())
            .collect()
    }

    /// 删除语句的键集合: deletions ∪ touched
    pub fn ids_to_clear(&self) -> BTreeSet<String> {
        let mut ids = self.deletions.clone();
        ids.extend(self.touched_ids());
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty() && self.upserts.is_empty()
    }
}

// ==========================================
// ReconciliationEngine - 对账引擎
// ==========================================
#[derive(Debug, Default)]
pub struct ReconciliationEngine;

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self
    }

    /// 计算删除集合与写入集合
    ///
    /// deletions = warehouse_ids − source_ids − touched
    ///
    /// 窗口边界一致性由调用方保证（源系统 created > start, 仓库 created >= start）
    pub fn reconcile<R: DeltaRecord>(
        &self,
        source_ids: &BTreeSet<String>,
        warehouse_ids: &BTreeSet<String>,
        delta_batch: Vec<R>,
    ) -> ReconciliationPlan<R> {
        let touched: BTreeSet<&str> = delta_batch.iter().map(|r| r.natural_id()).collect();

        let deletions: BTreeSet<String> = warehouse_ids
            .iter()
            .filter(|id| !source_ids.contains(*id))
            .filter(|id| {
                let protected = touched.contains(id.as_str());
                if protected {
                    debug!(natural_id = %id, "源快照缺失但在当日增量中, 保留");
                }
                !protected
            })
            .cloned()
            .collect();

        info!(
            source_ids = source_ids.len(),
            warehouse_ids = warehouse_ids.len(),
            delta_rows = delta_batch.len(),
            touched_ids = touched.len(),
            deletions = deletions.len(),
            "增量对账完成"
        );

        ReconciliationPlan {
            deletions,
            upserts: delta_batch,
        }
    }
}
