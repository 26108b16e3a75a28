//! 요청 발행 포트.
//!
//! 구현: `httpit-network` crate (`HttpEngine`)

use async_trait::async_trait;
use std::io::Write;

use crate::error::PitError;
use crate::models::outcome::Outcome;

/// 템플릿 요청 1회 발행
#[async_trait]
pub trait Requester: Send + Sync {
    /// 요청 하나를 보내고 상태 코드+지연 또는 에러를 돌려준다.
    ///
    /// 타임아웃은 구현체 안에서 `PitError::Timeout`으로 바뀐다.
    async fn issue_one(&self) -> Outcome;
}

/// 디버그(원샷) 발행
#[async_trait]
pub trait DebugRequester: Send + Sync {
    /// 요청 하나(리다이렉트 포함)를 보내고 성공 시 와이어 덤프를 `sink`에 쓴다.
    ///
    /// 실패하면 아무것도 쓰지 않는다.
    async fn issue_debug(&self, sink: &mut (dyn Write + Send)) -> Result<(), PitError>;
}
