//! # httpit-network
//!
//! HTTP/1.1 요청 엔진.
//! 템플릿 요청을 대상에 반복 발행하며 keep-alive 연결 풀, 파이프라이닝,
//! 디버그 원샷(리다이렉트 추적 + 와이어 덤프) 전략을 지원한다.
//! 모든 연결은 바이트 카운팅 래퍼를 거치고, HTTP 프록시(CONNECT)와
//! SOCKS5 프록시, TLS(native-tls)를 지원한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use httpit_core::ports::requester::Requester;
//! use httpit_network::engine::HttpEngine;
//!
//! let engine = HttpEngine::new(&config, counter).await?;
//! let outcome = engine.issue_one().await;
//! ```

pub mod codec;
pub mod connector;
pub mod counting;
pub mod debug;
pub mod dialer;
pub mod engine;
pub mod keepalive;
pub mod pipeline;
pub mod pool;
pub mod proxy;
pub mod request;
pub mod socks5;
pub mod target;
pub mod tls;

use httpit_core::error::PitError;

/// 요청 중 I/O 에러는 치명적이지 않은 전송 에러로 집계한다
pub(crate) fn transport_err(e: std::io::Error) -> PitError {
    PitError::Transport(e.to_string())
}
