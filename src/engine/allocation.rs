// ==========================================
// ERP → 数据仓库同步 - 需求供给分配引擎
// ==========================================
// 职责: 将未满足的客户需求按先到先得拆分到未来供给
// 输入: 需求行(已排序) + 当日库存快照 + 已下达供给
// 输出: 分配明细 (供给分配 / 缺口 / 可选的库存满足)
// ==========================================
// 红线: 引擎不访问数据库, 不修改调用方传入的供给
// ==========================================

use crate::domain::{
    AllocationRecord, AllocationSource, DemandLine, StockSnapshot, SupplyLine, SupplyRef,
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tracing::{info, instrument};

/// 分配选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationOptions {
    /// 库存已完全覆盖的需求是否输出 STOCK 记录（默认丢弃）
    pub emit_stock_covered: bool,
}

/// 单次分配统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationSummary {
    pub demand_lines: usize,
    pub stock_covered_lines: usize,
    pub processed_lines: usize,
    pub records: usize,
    pub shortage_records: usize,
    pub shortage_qty: Decimal,
}

// 单次 allocate 调用内的供给工作副本
struct WorkingSupply {
    reference: SupplyRef,
    remaining: Decimal,
}

// 单物料供给分区 + 低水位游标
#[derive(Default)]
struct SupplyPartition {
    lines: Vec<WorkingSupply>,
    cursor: usize,
}

// ==========================================
// AllocationEngine - 分配引擎
// ==========================================
pub struct AllocationEngine {
    options: AllocationOptions,
}

impl Default for AllocationEngine {
    fn default() -> Self {
        Self::new(AllocationOptions::default())
    }
}

impl AllocationEngine {
    pub fn new(options: AllocationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> AllocationOptions {
        self.options
    }

    /// 执行分配
    ///
    /// # 参数
    /// - `demand`: 需求行, 按发货日期、确认数量升序
    /// - `stock`: 当日库存快照
    /// - `supply`: 供给行, 按物料、下达日期排序（只读）
    ///
    /// # 返回
    /// 按需求行原始顺序输出的分配明细
    pub fn allocate(
        &self,
        demand: &[DemandLine],
        stock: &StockSnapshot,
        supply: &[SupplyLine],
    ) -> Vec<AllocationRecord> {
        self.allocate_with_summary(demand, stock, supply).0
    }

    /// 执行分配并返回统计
    #[instrument(skip_all, fields(
        demand_lines = demand.len(),
        stock_materials = stock.len(),
        supply_lines = supply.len()
    ))]
    pub fn allocate_with_summary(
        &self,
        demand: &[DemandLine],
        stock: &StockSnapshot,
        supply: &[SupplyLine],
    ) -> (Vec<AllocationRecord>, AllocationSummary) {
        let mut summary = AllocationSummary {
            demand_lines: demand.len(),
            ..AllocationSummary::default()
        };

        // 阶段 A: 库存预筛
        let covered = Self::stock_coverage(demand, stock);

        // 阶段 B: 供给分区
        let mut partitions = Self::partition_supply(supply);

        let mut records = Vec::new();
        for (line, is_covered) in demand.iter().zip(covered) {
            if is_covered {
                summary.stock_covered_lines += 1;
                if self.options.emit_stock_covered {
                    records.push(AllocationRecord::new(
                        line,
                        line.qty_confirmed,
                        AllocationSource::Stock,
                    ));
                }
                continue;
            }

            summary.processed_lines += 1;
            let need = Self::consume_supply(line, partitions.get_mut(&line.material_id), &mut records);

            if need > Decimal::ZERO {
                summary.shortage_records += 1;
                summary.shortage_qty += need;
                records.push(AllocationRecord::new(line, need, AllocationSource::Shortage));
            }
        }

        summary.records = records.len();
        info!(
            demand_lines = summary.demand_lines,
            stock_covered = summary.stock_covered_lines,
            processed = summary.processed_lines,
            records = summary.records,
            shortage_records = summary.shortage_records,
            shortage_qty = %summary.shortage_qty,
            "需求供给分配完成"
        );

        (records, summary)
    }

    // ==========================================
    // 阶段 A: 库存覆盖判定
    // ==========================================

    /// 按物料累计确认数量, 累计值 <= 可用库存 即视为库存覆盖
    fn stock_coverage(demand: &[DemandLine], stock: &StockSnapshot) -> Vec<bool> {
        let mut cumulative: HashMap<i64, Decimal> = HashMap::new();

        demand
            .iter()
            .map(|line| {
                let running = cumulative.entry(line.material_id).or_insert(Decimal::ZERO);
                *running += line.qty_confirmed;
                *running <= stock.available(line.material_id)
            })
            .collect()
    }

    // ==========================================
    // 阶段 B: 先到先得消耗供给
    // ==========================================

    /// 按物料分区, 分区内按下达日期升序（稳定排序, 无日期排最后）
    fn partition_supply(supply: &[SupplyLine]) -> BTreeMap<i64, SupplyPartition> {
        let mut partitions: BTreeMap<i64, SupplyPartition> = BTreeMap::new();

        for line in supply {
            partitions
                .entry(line.material_id)
                .or_default()
                .lines
                .push(WorkingSupply {
                    reference: SupplyRef::from_line(line),
                    remaining: line.remaining_qty,
                });
        }

        for partition in partitions.values_mut() {
            partition.lines.sort_by_key(|s| {
                let release = s.reference.release_date;
                (release.is_none(), release)
            });
        }

        partitions
    }

    /// 从物料分区消耗供给, 返回仍未满足的数量
    fn consume_supply(
        line: &DemandLine,
        partition: Option<&mut SupplyPartition>,
        records: &mut Vec<AllocationRecord>,
    ) -> Decimal {
        let mut need = line.qty_confirmed;

        let Some(partition) = partition else {
            return need;
        };

        while need > Decimal::ZERO && partition.cursor < partition.lines.len() {
            let supply = &mut partition.lines[partition.cursor];
            if supply.remaining <= Decimal::ZERO {
                partition.cursor += 1;
                continue;
            }

            let take = need.min(supply.remaining);
            records.push(AllocationRecord::new(
                line,
                take,
                AllocationSource::Supply(supply.reference.clone()),
            ));

            need -= take;
            supply.remaining -= take;

            if supply.remaining == Decimal::ZERO {
                partition.cursor += 1;
            }
        }

        need
    }
}
