//! 실행 중 백그라운드 작업.
//!
//! Ctrl+C 취소와 1초 주기 진행 로그. 둘 다 중단 신호가 닫히면 끝난다.

use httpit_bench::coordinator::Benchmark;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::report::progress_line;

/// 진행 로그 주기
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Ctrl+C 수신 시 벤치마크 취소
pub fn spawn_interrupt_handler(bench: Arc<Benchmark>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let stop = bench.stop_signal().clone();
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => {
                    info!("Ctrl+C 수신");
                    bench.cancel();
                }
                Err(e) => warn!("Ctrl+C 핸들러 등록 실패: {e}"),
            },
            _ = stop.stopped() => {}
        }
    })
}

/// 실행이 끝날 때까지 주기적으로 진행 상황 로그
pub fn spawn_progress_logger(bench: Arc<Benchmark>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let stop = bench.stop_signal().clone();
        let count = bench.config().count;
        let mut ticker = tokio::time::interval(interval);
        // 첫 tick은 즉시 완료
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let progress = bench.statistics().progress();
                    info!("{}", progress_line(&progress, count));
                }
                _ = stop.stopped() => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpit_core::config::BenchConfig;

    #[tokio::test]
    async fn background_tasks_end_with_run() {
        let mut config = BenchConfig::for_url("http://127.0.0.1:1/");
        config.duration = Duration::from_secs(60);
        let bench = Arc::new(Benchmark::new(config).unwrap());

        let progress = spawn_progress_logger(Arc::clone(&bench), Duration::from_millis(10));
        let interrupt = spawn_interrupt_handler(Arc::clone(&bench));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!progress.is_finished());

        assert!(bench.cancel());
        tokio::time::timeout(Duration::from_secs(1), progress)
            .await
            .unwrap()
            .unwrap();
        tokio::time::timeout(Duration::from_secs(1), interrupt)
            .await
            .unwrap()
            .unwrap();
    }
}
