// ==========================================
// 样品交货增量作业集成测试
// ==========================================
// 测试目标: 窗口对账 → 删除已消失记录 → 替换当日增量
// 运行日期 2026-10-16: 窗口起点 2025-10-01, 增量日期 2026-10-15
// ==========================================


use chrono::NaiveDate;
use erp_dw_sync::config::EtlConfig;
use erp_dw_sync::extract::{ErpSource, FileExtractSource};
use erp_dw_sync::jobs::{run_etl_job, SAMPLE_DELIVERY_ETL_NAME};
use erp_dw_sync::logging;
use erp_dw_sync::repository::{EtlInfoRepository, SampleDeliveryRepository};
use erp_dw_sync::AppState;
use rusqlite::{params, Connection};
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};
use test_helpers::*;

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn insert_delivery(conn: &Connection, sales_id: &str, created: &str, status: &str) {
    conn.execute(
        r#"
        INSERT INTO sample_delivery_fact
            (delivery_id, status, cust_id, material_id, sales_organization, sales_id, qty, qty_ordered, created_date)
        VALUES (?1, ?2, 10, 1, '1000', ?3, 1, 1, ?4)
        "#,
        params![format!("V-{sales_id}"), status, sales_id, created],
    )
    .unwrap();
}

fn sales_ids(state: &AppState) -> Vec<String> {
    let conn = state.conn.lock().unwrap();
    let mut stmt = conn
        .prepare("SELECT sales_id FROM sample_delivery_fact ORDER BY sales_id, rowid")
        .unwrap();
    stmt.query_map([], |r| r.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

fn setup(sample_orders: &[&str]) -> (NamedTempFile, TempDir, AppState) {
    logging::init_test();

    let (db_file, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();
    {
        let c = conn.lock().unwrap();
        seed_dimensions(&c).unwrap();
        insert_delivery(&c, "A", "2026-01-10", "A");
        insert_delivery(&c, "B", "2026-02-01", "A");
        insert_delivery(&c, "C", "2026-03-01", "A");
        // 恰好在窗口起点: 仓库侧计入窗口, 源系统侧 (严格大于) 不计入
        insert_delivery(&c, "E", "2025-10-01", "A");
        // 窗口之外, 永不参与对账
        insert_delivery(&c, "OLD", "2025-09-15", "A");
    }

    let extract_dir = TempDir::new().unwrap();
    let mut lines = vec![SAMPLE_ORDERS_HEADER];
    lines.extend_from_slice(sample_orders);
    write_extract(extract_dir.path(), "sample_orders.csv", &lines).unwrap();

    let config = EtlConfig::new(db_path, extract_dir.path());
    let source: Arc<dyn ErpSource> = Arc::new(FileExtractSource::new(extract_dir.path()));
    let state = AppState::with_source(config, conn, source);

    (db_file, extract_dir, state)
}

// SALESID,VBELN,LFART,MATNR,WADAT,WADAT_IST,WBSTK,KUNNR,VKORG,SPART,VTWEG,LFIMG,LSMENG,AEDAT,ERDAT
const SOURCE_ROWS: [&str; 6] = [
    "A,V-A,ZLF,M1,20260115,,A,C1,1000,01,10,1,1,20260101,20260110",
    "C,V-C,ZLF,M1,20260305,20260306,C,C1,1000,01,10,2,2,20261015,20260301",
    "E,V-E,ZLF,M2,20251005,,B,C2,1000,01,20,3,3,20261015,20251001",
    "N,V-N,ZLF,M2,20261020,,,C1,1000,01,30,4.5,5,20261015,20261015",
    "X,V-X,ZLF,M9,20261020,,,C1,1000,01,10,1,1,20261015,20261015",
    "Y,V-Y,ZLF,M1,20261020,,,C1,2000,01,10,1,1,20261015,20261015",
];

// ==========================================
// 测试用例
// ==========================================

#[test]
fn test_sample_delivery_job_reconciles_window() {
    let (_db, _dir, state) = setup(&SOURCE_ROWS);

    let report = run_etl_job(state.sample_delivery_job.as_ref(), run_date()).unwrap();

    // B 从源系统消失 → 删除; C/E 替换; N 新增; X 物料未命中; Y 其他销售组织
    assert_eq!(sales_ids(&state), vec!["A", "C", "E", "N", "OLD"]);
    assert_eq!(report.rows_read, 4);
    assert_eq!(report.rows_dropped, 1);
    assert_eq!(report.rows_written, 3);
    assert_eq!(report.rows_deleted, 3);

    let repo = SampleDeliveryRepository::from_connection(state.conn.clone());

    let c = repo.find_by_sales_id("C").unwrap();
    assert_eq!(c.len(), 1);
    assert_eq!(c[0].status, "C");
    assert_eq!(c[0].real_goods_issue_date, NaiveDate::from_ymd_opt(2026, 3, 6));

    // 渠道 30 未命中, 回退默认渠道 10 → 客户 10; 状态缺省 'A'
    let n = repo.find_by_sales_id("N").unwrap();
    assert_eq!(n[0].customer_id, 10);
    assert_eq!(n[0].material_id, 2);
    assert_eq!(n[0].status, "A");
    assert_eq!(n[0].qty, rust_decimal::Decimal::new(45, 1));

    let e = repo.find_by_sales_id("E").unwrap();
    assert_eq!(e[0].customer_id, 20);
    assert_eq!(e[0].status, "B");
}

#[test]
fn test_sample_delivery_job_rerun_is_stable() {
    let (_db, _dir, state) = setup(&SOURCE_ROWS);

    run_etl_job(state.sample_delivery_job.as_ref(), run_date()).unwrap();
    let first = sales_ids(&state);
    run_etl_job(state.sample_delivery_job.as_ref(), run_date()).unwrap();

    assert_eq!(sales_ids(&state), first);
}

#[test]
fn test_sample_delivery_job_without_changes_only_stamps() {
    let (_db, _dir, state) = setup(&[
        "A,V-A,ZLF,M1,20260115,,A,C1,1000,01,10,1,1,20260101,20260110",
        "B,V-B,ZLF,M1,20260115,,A,C1,1000,01,10,1,1,20260101,20260201",
        "C,V-C,ZLF,M1,20260115,,A,C1,1000,01,10,1,1,20260101,20260301",
        "E,V-E,ZLF,M1,20260115,,A,C1,1000,01,10,1,1,20260101,20251002",
    ]);

    let report = run_etl_job(state.sample_delivery_job.as_ref(), run_date()).unwrap();

    assert_eq!(report.rows_written, 0);
    assert_eq!(report.rows_deleted, 0);
    assert_eq!(sales_ids(&state), vec!["A", "B", "C", "E", "OLD"]);

    let etl_info = EtlInfoRepository::from_connection(state.conn.clone());
    assert!(etl_info
        .last_processed(SAMPLE_DELIVERY_ETL_NAME)
        .unwrap()
        .is_some());
    let stamped = count_rows(
        &state.conn.lock().unwrap(),
        "SELECT COUNT(*) FROM etl_info WHERE etl = 'process_sample_deliveries'",
    )
    .unwrap();
    assert_eq!(stamped, 1);
}
