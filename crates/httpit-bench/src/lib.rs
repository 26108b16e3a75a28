//! # httpit-bench
//!
//! 벤치마크 실행 레이어.
//!
//! - [`coordinator`]: 워커 풀과 실행 상태 머신
//! - [`statistics`]: 결과 집계, 라운드별 RPS 표본, 종료 판정
//! - [`limiter`]: 초당 요청 수 제한 (토큰 버킷)
//! - [`signal`]: 집계기/외부 취소가 공유하는 중단 신호

pub mod coordinator;
pub mod limiter;
pub mod signal;
pub mod statistics;
