//! httpit 핵심 에러 타입.
//!
//! 네트워크/벤치마크 crate 모두 이 타입을 그대로 사용한다.
//! 에러 메시지(Display) 문자열은 통계 집계기의 에러 맵 키로 쓰인다.

use std::time::Duration;
use thiserror::Error;

/// 코어 레이어 에러.
///
/// 생성 시점 에러(설정, 헤더, 파일, TLS, 프로토콜)는 실행 전에 치명적으로
/// 처리되고, 나머지는 요청 단위 결과로 집계된다.
#[derive(Debug, Error)]
pub enum PitError {
    /// 설정값 오류 (URL 누락, 잘못된 프록시 주소 등)
    #[error("설정 에러: {0}")]
    Config(String),

    /// `key:value` 형식이 아닌 헤더
    #[error("헤더 파싱 실패: {0}")]
    MalformedHeader(String),

    /// 파일 I/O 에러 (본문 파일, 인증서 파일)
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// TLS 설정 또는 핸드셰이크 준비 실패
    #[error("TLS 에러: {0}")]
    Tls(String),

    /// http/https 외 스킴
    #[error("지원하지 않는 프로토콜 {0:?}. http와 https만 지원")]
    UnsupportedProtocol(String),

    /// DNS 조회 또는 TCP 연결 실패
    #[error("연결 실패: {0}")]
    Dial(String),

    /// HTTP 프록시 CONNECT 터널 수립 실패
    #[error("http 프록시: {0}")]
    ProxyConnect(String),

    /// SOCKS5 프록시 연결 실패
    #[error("socks 프록시: {0}")]
    ProxyDial(String),

    /// 요청 타임아웃
    #[error("요청 타임아웃 ({}ms 초과)", .0.as_millis())]
    Timeout(Duration),

    /// 그 외 전송/프로토콜 에러
    #[error("전송 에러: {0}")]
    Transport(String),
}

impl PitError {
    /// 워커 시작 전에 실행을 중단시켜야 하는 생성 시점 에러인지 판별
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PitError::Config(_)
                | PitError::MalformedHeader(_)
                | PitError::Io(_)
                | PitError::Tls(_)
                | PitError::UnsupportedProtocol(_)
        )
    }
}
