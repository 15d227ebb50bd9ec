// ==========================================
// ERP → 数据仓库同步 - 守护进程入口
// ==========================================
// 流程: 配置 → 连接 → 维度缓存 → 作业 → 调度循环
// 停止: Ctrl+C
// ==========================================

use anyhow::Context;
use chrono::Local;
use erp_dw_sync::{logging, AppState, EtlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EtlConfig::from_env().context("加载配置失败")?;
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", erp_dw_sync::APP_NAME);
    tracing::info!("系统版本: {}", erp_dw_sync::VERSION);
    tracing::info!("==================================================");

    let state = AppState::new(config).context("初始化AppState失败")?;
    tracing::info!(
        extract_dir = %state.config.extract_dir.display(),
        plant = %state.config.plant,
        sales_organization = %state.config.sales_organization,
        "AppState初始化成功"
    );

    let mut scheduler = state.scheduler();
    let now = Local::now().naive_local();
    scheduler.skip_elapsed(now);
    if let Some(next) = scheduler.next_run(now) {
        tracing::info!(next_run = %next, "等待下一次作业");
    }

    scheduler
        .run_until(state.poll_interval(), async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "监听停止信号失败");
            }
        })
        .await;

    tracing::info!("守护进程退出");
    Ok(())
}
