// Manual one-shot runner: execute a single job immediately, outside the daily schedule.
//
// Usage:
//   cargo run --bin run_job -- <availability|sample_delivery|invalidate_cache> [YYYY-MM-DD]
//
// Configuration is read from the environment / .env like the daemon.

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use erp_dw_sync::jobs::run_etl_job;
use erp_dw_sync::{logging, AppState, EtlConfig};

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(job_name) = args.next() else {
        bail!("usage: run_job <availability|sample_delivery|invalidate_cache> [YYYY-MM-DD]");
    };
    let run_date = match args.next() {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .with_context(|| format!("invalid run date: {raw}"))?,
        None => Local::now().date_naive(),
    };

    let config = EtlConfig::from_env().context("failed to load configuration")?;
    logging::init();

    let state = AppState::new(config)?;
    let job = state.job_by_name(&job_name)?;
    let report = run_etl_job(job.as_ref(), run_date)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
