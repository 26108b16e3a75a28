//! 통계 집계기.
//!
//! 모든 워커가 결과를 넘기는 단일 변경 지점이다. 기록과 종료 판정은 같은
//! 락 구간에서 처리되어 종료가 정확히 한 번만 일어나고, 종료 후 기록은
//! 버려진다. 라운드(10ms)마다 RPS 표본을 만들고 라운드 시간을 누적한다.

use httpit_core::models::outcome::Outcome;
use httpit_core::models::snapshot::{CodeCounts, Progress, Snapshot};
use httpit_core::models::throughput::ThroughputCounter;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::signal::{StopReason, StopSignal};

/// RPS 표본 간격
pub const ROUND_INTERVAL: Duration = Duration::from_millis(10);

/// 종료 조건
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    /// 정확한 완료 요청 수
    Count(u64),
    /// 누적 라운드 시간
    Duration(Duration),
}

#[derive(Debug)]
struct State {
    round_start: Instant,
    round_reqs: u64,
    elapsed: Duration,
    total: u64,
    codes: CodeCounts,
    latencies: Vec<u64>,
    rps: Vec<f64>,
    errors: HashMap<String, u64>,
    done: bool,
}

impl State {
    fn new(now: Instant) -> Self {
        Self {
            round_start: now,
            round_reqs: 0,
            elapsed: Duration::ZERO,
            total: 0,
            codes: CodeCounts::default(),
            latencies: Vec::new(),
            rps: Vec::new(),
            errors: HashMap::new(),
            done: false,
        }
    }

    /// 현재 라운드를 마감해 RPS 표본 추가 + 경과 시간 누적
    fn close_round(&mut self, now: Instant) {
        let round = now.saturating_duration_since(self.round_start);
        if !round.is_zero() {
            self.rps.push(self.round_reqs as f64 / round.as_secs_f64());
        }
        self.elapsed += round;
        self.round_start = now;
        self.round_reqs = 0;
    }
}

pub struct Statistics {
    state: Mutex<State>,
    condition: StopCondition,
    bytes: ThroughputCounter,
    stop: StopSignal,
}

impl Statistics {
    pub fn new(condition: StopCondition, bytes: ThroughputCounter, stop: StopSignal) -> Self {
        Self {
            state: Mutex::new(State::new(Instant::now())),
            condition,
            bytes,
            stop,
        }
    }

    /// 첫 라운드 시작 시각을 지금으로 맞춘다
    pub fn start(&self) {
        self.start_at(Instant::now());
    }

    pub fn start_at(&self, now: Instant) {
        let mut state = self.state.lock();
        if !state.done {
            state.round_start = now;
        }
    }

    pub fn record(&self, outcome: Outcome) {
        self.record_at(outcome, Instant::now());
    }

    /// 결과 하나 기록 + 종료 판정
    pub fn record_at(&self, outcome: Outcome, now: Instant) {
        let mut state = self.state.lock();
        if state.done {
            return;
        }

        match outcome {
            Ok(completion) => {
                state.round_reqs += 1;
                state.total += 1;
                state.codes.increment(completion.status);
                state.latencies.push(completion.latency.as_micros() as u64);
            }
            Err(e) => {
                *state.errors.entry(e.to_string()).or_insert(0) += 1;
            }
        }

        match self.condition {
            StopCondition::Count(count) => {
                if state.total >= count {
                    state.close_round(now);
                    state.done = true;
                    self.stop.trigger(StopReason::Completed);
                } else if now.saturating_duration_since(state.round_start) >= ROUND_INTERVAL {
                    state.close_round(now);
                }
            }
            StopCondition::Duration(duration) => {
                if now.saturating_duration_since(state.round_start) >= ROUND_INTERVAL {
                    state.close_round(now);
                }
                if state.elapsed >= duration {
                    state.done = true;
                    self.stop.trigger(StopReason::Completed);
                }
            }
        }
    }

    /// 외부 취소. 진행 중 라운드를 마감하고 종료 상태로 전환한다.
    ///
    /// 이미 종료됐으면 `false`.
    pub fn terminate(&self) -> bool {
        let mut state = self.state.lock();
        if state.done {
            return false;
        }
        state.close_round(Instant::now());
        state.done = true;
        self.stop.trigger(StopReason::Cancelled);
        true
    }

    pub fn is_done(&self) -> bool {
        self.state.lock().done
    }

    /// 실행 중 진행 상황 (표본 복사 없음)
    pub fn progress(&self) -> Progress {
        let state = self.state.lock();
        Progress {
            total: state.total,
            errors: state.errors.values().sum(),
            elapsed: state.elapsed,
            bytes: self.bytes.get(),
            done: state.done,
        }
    }

    /// 전체 스냅샷 복사
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();
        Snapshot {
            total: state.total,
            elapsed: state.elapsed,
            codes: state.codes,
            latencies: state.latencies.clone(),
            rps: state.rps.clone(),
            errors: state.errors.clone(),
            bytes: self.bytes.get(),
            done: state.done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpit_core::error::PitError;
    use httpit_core::models::outcome::Completion;
    use std::sync::Arc;

    fn ok(status: u16, ms: u64) -> Outcome {
        Ok(Completion::new(status, Duration::from_millis(ms)))
    }

    fn stats(condition: StopCondition) -> (Statistics, StopSignal, Instant) {
        let stop = StopSignal::new();
        let stats = Statistics::new(condition, ThroughputCounter::new(), stop.clone());
        let start = Instant::now();
        stats.start_at(start);
        (stats, stop, start)
    }

    #[test]
    fn records_codes_latencies_and_errors() {
        let (stats, _stop, start) = stats(StopCondition::Count(100));
        stats.record_at(ok(200, 3), start);
        stats.record_at(ok(404, 1), start);
        stats.record_at(ok(700, 1), start);
        stats.record_at(Err(PitError::Transport("reset".to_string())), start);
        stats.record_at(Err(PitError::Transport("reset".to_string())), start);

        let snap = stats.snapshot();
        assert_eq!(snap.total, 3);
        assert_eq!(snap.codes.code2xx, 1);
        assert_eq!(snap.codes.code4xx, 1);
        assert_eq!(snap.codes.other, 1);
        assert_eq!(snap.latencies, vec![3000, 1000, 1000]);
        assert_eq!(snap.errors.get("전송 에러: reset"), Some(&2));
        assert!(!snap.done);
    }

    #[test]
    fn count_termination_fires_once() {
        let (stats, stop, start) = stats(StopCondition::Count(3));
        for i in 0..3 {
            stats.record_at(ok(200, 1), start + Duration::from_millis(i));
        }
        assert!(stats.is_done());
        assert_eq!(stop.reason(), Some(StopReason::Completed));

        let snap = stats.snapshot();
        assert_eq!(snap.total, 3);
        assert_eq!(snap.rps.len(), 1);
        assert_eq!(snap.elapsed, Duration::from_millis(2));
        assert!((snap.rps[0] - 1500.0).abs() < 1e-6);
    }

    #[test]
    fn records_after_done_are_ignored() {
        let (stats, _stop, start) = stats(StopCondition::Count(2));
        stats.record_at(ok(200, 1), start);
        stats.record_at(ok(200, 1), start + Duration::from_millis(5));
        let before = stats.snapshot();

        for i in 0..10 {
            stats.record_at(ok(500, 9), start + Duration::from_millis(20 + i));
            stats.record_at(Err(PitError::Timeout(Duration::from_secs(1))), start);
        }
        let after = stats.snapshot();
        assert_eq!(after.total, before.total);
        assert_eq!(after.codes, before.codes);
        assert_eq!(after.latencies, before.latencies);
        assert_eq!(after.rps, before.rps);
        assert_eq!(after.errors, before.errors);
        assert_eq!(after.elapsed, before.elapsed);
    }

    #[test]
    fn rounds_sample_rps_and_sum_elapsed() {
        let (stats, _stop, start) = stats(StopCondition::Duration(Duration::from_secs(10)));
        // 라운드 1: 4ms, 8ms, 10ms에 3건 → 10ms 라운드 마감
        for ms in [4, 8, 10] {
            stats.record_at(ok(200, 1), start + Duration::from_millis(ms));
        }
        // 라운드 2: 15ms, 25ms에 2건 → 15ms 라운드 마감
        for ms in [15, 25] {
            stats.record_at(ok(200, 1), start + Duration::from_millis(ms));
        }

        let snap = stats.snapshot();
        assert_eq!(snap.rps.len(), 2);
        assert!((snap.rps[0] - 300.0).abs() < 1e-6);
        assert!((snap.rps[1] - 2.0 / 0.015).abs() < 1e-6);
        assert_eq!(snap.elapsed, Duration::from_millis(25));
        assert!(!snap.done);
    }

    #[test]
    fn duration_termination() {
        let (stats, stop, start) = stats(StopCondition::Duration(Duration::from_millis(30)));
        let mut t = start;
        while !stats.is_done() {
            t += Duration::from_millis(10);
            stats.record_at(ok(200, 1), t);
        }
        let snap = stats.snapshot();
        assert_eq!(snap.elapsed, Duration::from_millis(30));
        assert_eq!(snap.total, 3);
        assert_eq!(stop.reason(), Some(StopReason::Completed));
    }

    #[test]
    fn errors_advance_rounds_too() {
        let (stats, _stop, start) = stats(StopCondition::Duration(Duration::from_millis(20)));
        stats.record_at(
            Err(PitError::Dial("refused".to_string())),
            start + Duration::from_millis(10),
        );
        stats.record_at(
            Err(PitError::Dial("refused".to_string())),
            start + Duration::from_millis(20),
        );
        let snap = stats.snapshot();
        assert!(snap.done);
        assert_eq!(snap.total, 0);
        assert_eq!(snap.rps, vec![0.0, 0.0]);
        assert_eq!(snap.error_count(), 2);
    }

    #[test]
    fn terminate_is_external_cancel() {
        let (stats, stop, start) = stats(StopCondition::Duration(Duration::from_secs(60)));
        stats.record_at(ok(200, 1), start);
        assert!(stats.terminate());
        assert!(!stats.terminate());
        assert_eq!(stop.reason(), Some(StopReason::Cancelled));

        stats.record_at(ok(200, 1), start);
        assert_eq!(stats.snapshot().total, 1);
        assert!(stats.progress().done);
    }

    #[test]
    fn progress_view() {
        let bytes = ThroughputCounter::new();
        let stats = Statistics::new(StopCondition::Count(10), bytes.clone(), StopSignal::new());
        stats.record(ok(200, 1));
        stats.record(Err(PitError::Transport("x".to_string())));
        bytes.add(512);

        let progress = stats.progress();
        assert_eq!(progress.total, 1);
        assert_eq!(progress.errors, 1);
        assert_eq!(progress.bytes, 512);
        assert!(!progress.done);
    }

    #[test]
    fn concurrent_records_stop_exactly_at_count() {
        let stop = StopSignal::new();
        let stats = Arc::new(Statistics::new(
            StopCondition::Count(1_000),
            ThroughputCounter::new(),
            stop.clone(),
        ));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        stats.record(ok(200, 1));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snap = stats.snapshot();
        assert_eq!(snap.total, 1_000);
        assert_eq!(snap.codes.code2xx, 1_000);
        assert_eq!(snap.latencies.len(), 1_000);
        assert!(stop.is_stopped());
    }
}
