//! 요청 1회의 결과.

use std::time::Duration;

use crate::error::PitError;

/// 응답을 받은 요청
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// HTTP 상태 코드
    pub status: u16,
    /// 연결 획득부터 응답 본문 수신까지
    pub latency: Duration,
}

impl Completion {
    pub fn new(status: u16, latency: Duration) -> Self {
        Self { status, latency }
    }
}

/// 완료된 시도 하나. 상태+지연 또는 에러 중 하나만 존재.
pub type Outcome = Result<Completion, PitError>;

/// 상태 코드 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Informational,
    Success,
    Redirection,
    ClientError,
    ServerError,
    Other,
}

impl StatusClass {
    /// `code/100` 기준 분류. 100~599 밖이면 `Other`.
    pub fn of(code: u16) -> Self {
        match code {
            100..=199 => StatusClass::Informational,
            200..=299 => StatusClass::Success,
            300..=399 => StatusClass::Redirection,
            400..=499 => StatusClass::ClientError,
            500..=599 => StatusClass::ServerError,
            _ => StatusClass::Other,
        }
    }
}
