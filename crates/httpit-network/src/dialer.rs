//! TCP 다이얼러.
//!
//! 직접 연결, HTTP 프록시 CONNECT 터널, SOCKS5 중 하나를 설정에서
//! 한 번 고른다. http 프록시가 socks 프록시보다 우선한다.

use httpit_core::config::BenchConfig;
use httpit_core::error::PitError;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

use crate::proxy::HttpProxy;
use crate::socks5::Socks5Proxy;
use crate::target::Target;

/// 연결 수립 방식
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialer {
    Direct,
    HttpProxy(HttpProxy),
    Socks5(Socks5Proxy),
}

impl Dialer {
    /// 설정의 프록시 주소로 다이얼러 선택
    pub fn from_config(config: &BenchConfig) -> Result<Self, PitError> {
        if let Some(proxy) = non_empty(&config.http_proxy) {
            return Ok(Dialer::HttpProxy(HttpProxy::parse(proxy)?));
        }
        if let Some(proxy) = non_empty(&config.socks_proxy) {
            return Ok(Dialer::Socks5(Socks5Proxy::parse(proxy)?));
        }
        Ok(Dialer::Direct)
    }

    /// 대상까지 TCP 연결
    pub async fn dial(&self, target: &Target, timeout: Duration) -> Result<TcpStream, PitError> {
        match self {
            Dialer::Direct => dial_tcp(&target.addr(), timeout).await,
            Dialer::HttpProxy(proxy) => proxy.tunnel(&target.addr(), timeout).await,
            Dialer::Socks5(proxy) => proxy.connect(&target.host, target.port, timeout).await,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// 타임아웃이 있는 TCP 연결. DNS 조회 실패도 `Dial`이다.
pub async fn dial_tcp(addr: &str, timeout: Duration) -> Result<TcpStream, PitError> {
    let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| PitError::Dial(format!("{addr} 연결 타임아웃")))?
        .map_err(|e| PitError::Dial(format!("{addr}: {e}")))?;
    // Nagle 비활성화 실패는 무시
    let _ = stream.set_nodelay(true);
    debug!("TCP 연결: {}", addr);
    Ok(stream)
}
