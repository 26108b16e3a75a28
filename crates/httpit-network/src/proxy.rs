//! HTTP 프록시 CONNECT 터널.
//!
//! 프록시에 `CONNECT host:port HTTP/1.1`을 보내고 응답 헤드만 읽는다.
//! 상태가 정확히 200이 아니면 `ProxyConnect`로 실패한다.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use httpit_core::error::PitError;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

use crate::codec::ResponseReader;
use crate::dialer::dial_tcp;

/// HTTP 프록시 주소 + 인증 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpProxy {
    /// 프록시 `host:port`
    pub addr: String,
    /// `Proxy-Authorization: Basic` 값 (base64)
    pub auth: Option<String>,
}

impl HttpProxy {
    /// `[http://][user:pass@]host:port` 파싱
    pub fn parse(proxy: &str) -> Result<Self, PitError> {
        let proxy = proxy.trim();
        let proxy = proxy.strip_prefix("http://").unwrap_or(proxy);
        let (auth, addr) = match proxy.rsplit_once('@') {
            Some((creds, addr)) => (Some(BASE64.encode(creds.as_bytes())), addr),
            None => (None, proxy),
        };
        let addr = addr.trim_end_matches('/');
        if addr.is_empty() {
            return Err(PitError::Config(format!("잘못된 http 프록시 주소: {proxy:?}")));
        }
        Ok(Self {
            addr: addr.to_string(),
            auth,
        })
    }

    /// CONNECT 요청 바이트
    pub fn connect_request(&self, target: &str) -> String {
        let mut req = format!("CONNECT {target} HTTP/1.1\r\nHost: {target}\r\n");
        if let Some(auth) = &self.auth {
            req.push_str("Proxy-Authorization: Basic ");
            req.push_str(auth);
            req.push_str("\r\n");
        }
        req.push_str("\r\n");
        req
    }

    /// 프록시를 거쳐 `target`(`host:port`)까지 터널 수립
    pub async fn tunnel(&self, target: &str, timeout: Duration) -> Result<TcpStream, PitError> {
        let mut stream = dial_tcp(&self.addr, timeout)
            .await
            .map_err(|e| PitError::ProxyConnect(e.to_string()))?;

        stream
            .write_all(self.connect_request(target).as_bytes())
            .await
            .map_err(|e| PitError::ProxyConnect(e.to_string()))?;

        let mut reader = ResponseReader::new(stream);
        let head = tokio::time::timeout(timeout, reader.read_response(true, None))
            .await
            .map_err(|_| PitError::ProxyConnect("CONNECT 응답 타임아웃".to_string()))?
            .map_err(|e| PitError::ProxyConnect(e.to_string()))?;

        if head.status != 200 {
            return Err(PitError::ProxyConnect(format!(
                "프록시 연결 실패 (status {})",
                head.status
            )));
        }
        debug!("CONNECT 터널 수립: {} → {}", self.addr, target);
        Ok(reader.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
    use tokio::net::TcpListener;

    /// CONNECT 요청 헤드를 읽고 `status` 응답 후, 200이면 에코 서버처럼 동작
    async fn stub_proxy(status: u16) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut stream = BufReader::new(stream);
            let mut head = String::new();
            loop {
                let mut line = String::new();
                stream.read_line(&mut line).await.unwrap();
                head.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let resp = format!("HTTP/1.1 {status} X\r\n\r\n");
            stream.get_mut().write_all(resp.as_bytes()).await.unwrap();
            if status == 200 {
                let mut buf = [0u8; 4];
                stream.read_exact(&mut buf).await.unwrap();
                stream.get_mut().write_all(&buf).await.unwrap();
            }
            head
        });
        (addr, handle)
    }

    #[test]
    fn parse_with_credentials() {
        let proxy = HttpProxy::parse("user:pass@127.0.0.1:8080").unwrap();
        assert_eq!(proxy.addr, "127.0.0.1:8080");
        assert_eq!(proxy.auth.as_deref(), Some("dXNlcjpwYXNz"));

        let proxy = HttpProxy::parse("http://proxy.local:3128").unwrap();
        assert_eq!(proxy.addr, "proxy.local:3128");
        assert!(proxy.auth.is_none());

        assert!(HttpProxy::parse("user@").is_err());
    }

    #[test]
    fn connect_request_format() {
        let proxy = HttpProxy::parse("u:p@proxy:1").unwrap();
        assert_eq!(
            proxy.connect_request("example.com:443"),
            "CONNECT example.com:443 HTTP/1.1\r\nHost: example.com:443\r\nProxy-Authorization: Basic dTpw\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn tunnel_ok_passes_bytes_through() {
        let (addr, handle) = stub_proxy(200).await;
        let proxy = HttpProxy::parse(&format!("u:p@{addr}")).unwrap();
        let mut stream = proxy
            .tunnel("origin.local:80", Duration::from_secs(2))
            .await
            .unwrap();

        stream.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        let head = handle.await.unwrap();
        assert!(head.starts_with("CONNECT origin.local:80 HTTP/1.1\r\n"));
        assert!(head.contains("Proxy-Authorization: Basic dTpw\r\n"));
    }

    #[tokio::test]
    async fn tunnel_rejects_non_200() {
        let (addr, _handle) = stub_proxy(407).await;
        let proxy = HttpProxy::parse(&addr).unwrap();
        let err = proxy
            .tunnel("origin.local:80", Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, PitError::ProxyConnect(ref m) if m.contains("407")));
    }

    #[tokio::test]
    async fn unreachable_proxy() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let proxy = HttpProxy::parse(&addr).unwrap();
        let err = proxy
            .tunnel("origin.local:80", Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, PitError::ProxyConnect(_)));
    }
}
