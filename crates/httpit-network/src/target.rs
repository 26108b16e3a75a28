//! 요청 대상 주소.

use httpit_core::error::PitError;
use url::Url;

/// 스킴/호스트/포트가 확정된 대상
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// 대괄호를 뺀 호스트 (IPv6 포함)
    pub host: String,
    pub port: u16,
    pub is_tls: bool,
}

impl Target {
    /// URL에서 대상 결정. http/https 외 스킴은 `UnsupportedProtocol`.
    ///
    /// 포트가 없으면 80/443을 붙인다.
    pub fn from_url(url: &Url) -> Result<Self, PitError> {
        let is_tls = match url.scheme() {
            "http" => false,
            "https" => true,
            other => return Err(PitError::UnsupportedProtocol(other.to_string())),
        };
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| PitError::Config(format!("URL에 호스트 없음: {url}")))?;
        let host = host.trim_start_matches('[').trim_end_matches(']').to_string();
        let port = url.port().unwrap_or(if is_tls { 443 } else { 80 });
        Ok(Self { host, port, is_tls })
    }

    /// `host:port` (IPv6는 대괄호)
    pub fn addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}
