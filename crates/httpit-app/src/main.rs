//! # httpit
//!
//! HTTP 벤치마크 CLI 진입점.
//! 프로파일/환경변수/플래그 병합, 로깅 초기화, 실행, 리포트 출력.

mod cli;
mod lifecycle;
mod report;

use anyhow::Result;
use clap::Parser;
use httpit_bench::coordinator::{Benchmark, RunOutcome};
use httpit_core::profile::load_profile;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::lifecycle::{spawn_interrupt_handler, spawn_progress_logger, PROGRESS_INTERVAL};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 리포트는 stdout, 로그는 stderr
    let log_filter = format!(
        "warn,httpit={0},httpit_app={0},httpit_core={0},httpit_network={0},httpit_bench={0}",
        cli.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let profile = load_profile(cli.config.as_deref())?;
    let config = cli.apply(profile);
    let bench = Arc::new(Benchmark::new(config)?);

    let debug = bench.config().debug;
    if !debug {
        println!(
            "{}",
            report::title(&bench.config().url, bench.config().connections)
        );
    }

    let interrupt = spawn_interrupt_handler(Arc::clone(&bench));
    let progress = (!debug).then(|| spawn_progress_logger(Arc::clone(&bench), PROGRESS_INTERVAL));

    let result = bench.run().await;

    interrupt.abort();
    if let Some(progress) = progress {
        progress.abort();
    }

    match result? {
        RunOutcome::Finished(snapshot) => print!("{}", report::render(&snapshot)),
        RunOutcome::Terminated(snapshot) => {
            info!("취소로 중단된 부분 결과 출력");
            print!("{}", report::render(&snapshot));
        }
        RunOutcome::Debug => {}
    }
    Ok(())
}
