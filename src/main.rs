// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Context;
use carspec::config::settings::Settings;
use carspec::engines::playwright_engine::PlaywrightSession;
use carspec::infrastructure::storage::{prepare_output_dir, LocalStorage};
use carspec::infrastructure::unit_list::load_units;
use carspec::utils::telemetry;
use carspec::workers::{BatchRunner, UnitWorker};
use std::sync::Arc;
use tracing::info;

/// 主函数
///
/// 用法：`carspec [车型列表路径] [输出目录]`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting carspec...");

    carspec::infrastructure::metrics::init_metrics();

    // 2. Load configuration
    let mut settings = Settings::new()?;
    let mut args = std::env::args().skip(1);
    if let Some(path) = args.next() {
        settings.input.path = path;
    }
    if let Some(dir) = args.next() {
        settings.output.dir = Some(dir);
    }
    info!("Configuration loaded");

    // 3. Load unit list and prepare output
    let loaded = load_units(&settings.input.path).await?;
    let output_dir = prepare_output_dir(settings.output.dir.as_deref())?;
    info!("Output directory: {}", output_dir.display());

    // 4. Launch browser
    let session = PlaywrightSession::launch(&settings.browser, settings.readiness.poll_interval())
        .await
        .context("Failed to start browser session")?;

    // 5. Run batch
    let runner = BatchRunner::new(
        UnitWorker::from_settings(&settings),
        Arc::new(LocalStorage::new(output_dir)),
    )
    .with_workers(settings.batch.workers);
    let mut output = runner
        .run_with_session(Box::new(session), &loaded.units)
        .await
        .context("Failed to write aggregate dataset")?;

    output.report.skipped = loaded.skipped;
    output.report.log_summary();

    Ok(())
}
