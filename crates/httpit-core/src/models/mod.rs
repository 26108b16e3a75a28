//! 벤치마크 도메인 모델.
//!
//! 워커가 만드는 요청 결과, 연결이 공유하는 처리량 카운터,
//! 리포터가 읽는 집계 스냅샷을 정의한다.

pub mod outcome;
pub mod snapshot;
pub mod throughput;
