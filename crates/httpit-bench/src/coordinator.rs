//! 벤치마크 코디네이터.
//!
//! `Idle → Running → Done` (외부 취소 시 `Running → Terminated`).
//! 워커 `connections`개를 띄우고, 집계기의 종료 판정이나 외부 취소로
//! 중단 신호가 닫히면 모든 워커를 합류시킨 뒤 최종 스냅샷을 돌려준다.

use httpit_core::config::BenchConfig;
use httpit_core::error::PitError;
use httpit_core::models::snapshot::Snapshot;
use httpit_core::models::throughput::ThroughputCounter;
use httpit_core::ports::requester::{DebugRequester, Requester};
use httpit_network::engine::HttpEngine;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::limiter::RateLimiter;
use crate::signal::{StopReason, StopSignal};
use crate::statistics::{Statistics, StopCondition};

/// 리미터 거부 시 재시도 간격
const LIMITER_BACKOFF: Duration = Duration::from_millis(1);

/// 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Done,
    Terminated,
}

/// 실행 결과
#[derive(Debug)]
pub enum RunOutcome {
    /// 요청 수/실행 시간 도달
    Finished(Snapshot),
    /// 외부 취소로 중단된 부분 결과
    Terminated(Snapshot),
    /// 디버그 원샷 (덤프는 sink에 기록됨)
    Debug,
}

impl RunOutcome {
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            RunOutcome::Finished(s) | RunOutcome::Terminated(s) => Some(s),
            RunOutcome::Debug => None,
        }
    }
}

pub struct Benchmark {
    config: BenchConfig,
    counter: ThroughputCounter,
    stop: StopSignal,
    statistics: Arc<Statistics>,
    state: Mutex<RunState>,
}

impl Benchmark {
    /// 설정 정규화 + 집계기 준비
    ///
    /// 엔진 생성은 `run` 시점에 한다.
    pub fn new(config: BenchConfig) -> Result<Self, PitError> {
        let config = config.normalize()?;
        let condition = match config.count {
            Some(count) => StopCondition::Count(count),
            None => StopCondition::Duration(config.duration),
        };
        let counter = ThroughputCounter::new();
        let stop = StopSignal::new();
        let statistics = Arc::new(Statistics::new(condition, counter.clone(), stop.clone()));

        Ok(Self {
            config,
            counter,
            stop,
            statistics,
            state: Mutex::new(RunState::Idle),
        })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    pub fn statistics(&self) -> &Arc<Statistics> {
        &self.statistics
    }

    /// 엔진과 집계기가 공유하는 바이트 카운터
    pub fn throughput(&self) -> &ThroughputCounter {
        &self.counter
    }

    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    /// 외부 취소. 이미 끝난 실행이면 `false`.
    pub fn cancel(&self) -> bool {
        let cancelled = self.statistics.terminate();
        if cancelled {
            info!("벤치마크 취소 요청");
        }
        cancelled
    }

    /// 표준 출력을 디버그 sink로 쓰는 `run_to`
    pub async fn run(&self) -> Result<RunOutcome, PitError> {
        let mut stdout = std::io::stdout();
        self.run_to(&mut stdout).await
    }

    /// 엔진을 만들어 실행
    ///
    /// 생성 시점 에러는 워커를 띄우기 전에 그대로 반환한다.
    pub async fn run_to(&self, sink: &mut (dyn Write + Send)) -> Result<RunOutcome, PitError> {
        self.ensure_idle()?;
        let engine = HttpEngine::new(&self.config, self.counter.clone()).await?;

        if self.config.debug {
            self.begin()?;
            let result = engine.issue_debug(sink).await;
            self.finish(RunState::Done);
            result?;
            return Ok(RunOutcome::Debug);
        }

        let limiter = RateLimiter::from_qps(self.config.qps);
        self.run_with(Arc::new(engine), Arc::new(limiter)).await
    }

    /// 주어진 요청기로 워커 풀 실행
    pub async fn run_with(
        &self,
        requester: Arc<dyn Requester>,
        limiter: Arc<RateLimiter>,
    ) -> Result<RunOutcome, PitError> {
        self.begin()?;
        info!(
            "벤치마크 시작: {} (연결 {}, {})",
            self.config.url,
            self.config.connections,
            match self.config.count {
                Some(count) => format!("요청 {count}건"),
                None => format!("{:?}", self.config.duration),
            }
        );

        self.statistics.start();
        let mut workers = JoinSet::new();
        for id in 0..self.config.connections {
            workers.spawn(worker(
                id,
                Arc::clone(&requester),
                Arc::clone(&limiter),
                Arc::clone(&self.statistics),
                self.stop.clone(),
            ));
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!("워커 비정상 종료: {e}");
            }
        }

        let snapshot = self.statistics.snapshot();
        let outcome = match self.stop.reason() {
            Some(StopReason::Cancelled) => {
                self.finish(RunState::Terminated);
                RunOutcome::Terminated(snapshot)
            }
            _ => {
                self.finish(RunState::Done);
                RunOutcome::Finished(snapshot)
            }
        };
        info!("벤치마크 종료: {:?}", self.state());
        Ok(outcome)
    }

    fn ensure_idle(&self) -> Result<(), PitError> {
        match *self.state.lock() {
            RunState::Idle => Ok(()),
            state => Err(PitError::Config(format!("이미 실행된 벤치마크 ({state:?})"))),
        }
    }

    fn begin(&self) -> Result<(), PitError> {
        let mut state = self.state.lock();
        if *state != RunState::Idle {
            return Err(PitError::Config(format!(
                "이미 실행된 벤치마크 ({:?})",
                *state
            )));
        }
        *state = RunState::Running;
        Ok(())
    }

    fn finish(&self, to: RunState) {
        *self.state.lock() = to;
    }
}

/// 워커 루프: 중단 확인 → 리미터 → 요청 → 집계
async fn worker(
    id: usize,
    requester: Arc<dyn Requester>,
    limiter: Arc<RateLimiter>,
    statistics: Arc<Statistics>,
    stop: StopSignal,
) {
    let mut issued: u64 = 0;
    while !stop.is_stopped() {
        if !limiter.allow() {
            tokio::time::sleep(LIMITER_BACKOFF).await;
            continue;
        }
        let outcome = requester.issue_one().await;
        statistics.record(outcome);
        issued += 1;
    }
    debug!("워커 {id} 종료 (요청 {issued}건)");
}
