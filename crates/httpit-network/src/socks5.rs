//! SOCKS5 클라이언트 (RFC 1928, 사용자/비밀번호 인증 RFC 1929).
//!
//! 프록시 URL은 엔진 생성 시 한 번만 해석한다. 연결마다 핸드셰이크를
//! 수행하며 실패는 모두 `ProxyDial`이다.

use httpit_core::error::PitError;
use std::net::IpAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

use crate::dialer::dial_tcp;

const VERSION: u8 = 0x05;
const METHOD_NO_AUTH: u8 = 0x00;
const METHOD_USER_PASS: u8 = 0x02;
const METHOD_NONE_ACCEPTABLE: u8 = 0xff;
const CMD_CONNECT: u8 = 0x01;
const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;

/// SOCKS5 프록시 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Socks5Proxy {
    /// 프록시 `host:port`
    pub addr: String,
    pub credentials: Option<(String, String)>,
}

impl Socks5Proxy {
    /// `socks5://[user:pass@]host:port` 파싱
    ///
    /// 스킴이 없으면 `socks5://`로 본다.
    pub fn parse(proxy: &str) -> Result<Self, PitError> {
        let proxy = proxy.trim();
        let full = if proxy.contains("://") {
            proxy.to_string()
        } else {
            format!("socks5://{proxy}")
        };
        let url = Url::parse(&full)
            .map_err(|e| PitError::ProxyDial(format!("잘못된 프록시 주소 {proxy:?}: {e}")))?;
        if !matches!(url.scheme(), "socks5" | "socks5h") {
            return Err(PitError::ProxyDial(format!(
                "지원하지 않는 프록시 스킴: {}",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .ok_or_else(|| PitError::ProxyDial(format!("프록시 호스트 없음: {proxy:?}")))?;
        let port = url.port().unwrap_or(1080);

        let credentials = if url.username().is_empty() {
            None
        } else {
            Some((
                url.username().to_string(),
                url.password().unwrap_or_default().to_string(),
            ))
        };

        Ok(Self {
            addr: format!("{host}:{port}"),
            credentials,
        })
    }

    /// 프록시를 거쳐 `host:port` 연결
    pub async fn connect(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<TcpStream, PitError> {
        let mut stream = dial_tcp(&self.addr, timeout)
            .await
            .map_err(|e| PitError::ProxyDial(e.to_string()))?;

        tokio::time::timeout(timeout, self.handshake(&mut stream, host, port))
            .await
            .map_err(|_| PitError::ProxyDial("핸드셰이크 타임아웃".to_string()))??;

        debug!("SOCKS5 연결 수립: {} → {}:{}", self.addr, host, port);
        Ok(stream)
    }

    async fn handshake(
        &self,
        stream: &mut TcpStream,
        host: &str,
        port: u16,
    ) -> Result<(), PitError> {
        // 1. 인증 방식 협상
        let greeting: &[u8] = if self.credentials.is_some() {
            &[VERSION, 2, METHOD_NO_AUTH, METHOD_USER_PASS]
        } else {
            &[VERSION, 1, METHOD_NO_AUTH]
        };
        stream.write_all(greeting).await.map_err(dial_err)?;

        let mut reply = [0u8; 2];
        stream.read_exact(&mut reply).await.map_err(dial_err)?;
        if reply[0] != VERSION {
            return Err(PitError::ProxyDial(format!(
                "잘못된 SOCKS 버전: {:#04x}",
                reply[0]
            )));
        }

        // 2. 인증 (필요 시)
        match reply[1] {
            METHOD_NO_AUTH => {}
            METHOD_USER_PASS => self.authenticate(stream).await?,
            METHOD_NONE_ACCEPTABLE => {
                return Err(PitError::ProxyDial(
                    "허용되는 인증 방식 없음".to_string(),
                ))
            }
            other => {
                return Err(PitError::ProxyDial(format!(
                    "지원하지 않는 인증 방식: {other:#04x}"
                )))
            }
        }

        // 3. CONNECT
        stream
            .write_all(&connect_request(host, port)?)
            .await
            .map_err(dial_err)?;

        let mut head = [0u8; 4];
        stream.read_exact(&mut head).await.map_err(dial_err)?;
        if head[1] != 0x00 {
            return Err(PitError::ProxyDial(reply_message(head[1]).to_string()));
        }

        // 바인드 주소는 읽고 버린다
        let addr_len = match head[3] {
            ATYP_IPV4 => 4,
            ATYP_IPV6 => 16,
            ATYP_DOMAIN => {
                let mut len = [0u8; 1];
                stream.read_exact(&mut len).await.map_err(dial_err)?;
                len[0] as usize
            }
            other => {
                return Err(PitError::ProxyDial(format!(
                    "알 수 없는 주소 타입: {other:#04x}"
                )))
            }
        };
        let mut rest = vec![0u8; addr_len + 2];
        stream.read_exact(&mut rest).await.map_err(dial_err)?;
        Ok(())
    }

    async fn authenticate(&self, stream: &mut TcpStream) -> Result<(), PitError> {
        let (user, pass) = self
            .credentials
            .as_ref()
            .ok_or_else(|| PitError::ProxyDial("프록시가 인증을 요구함".to_string()))?;
        if user.len() > 255 || pass.len() > 255 {
            return Err(PitError::ProxyDial("인증 정보가 너무 김".to_string()));
        }

        let mut req = Vec::with_capacity(3 + user.len() + pass.len());
        req.push(0x01);
        req.push(user.len() as u8);
        req.extend_from_slice(user.as_bytes());
        req.push(pass.len() as u8);
        req.extend_from_slice(pass.as_bytes());
        stream.write_all(&req).await.map_err(dial_err)?;

        let mut resp = [0u8; 2];
        stream.read_exact(&mut resp).await.map_err(dial_err)?;
        if resp[1] != 0x00 {
            return Err(PitError::ProxyDial("인증 실패".to_string()));
        }
        Ok(())
    }
}

fn connect_request(host: &str, port: u16) -> Result<Vec<u8>, PitError> {
    let mut req = vec![VERSION, CMD_CONNECT, 0x00];
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => {
            req.push(ATYP_IPV4);
            req.extend_from_slice(&ip.octets());
        }
        Ok(IpAddr::V6(ip)) => {
            req.push(ATYP_IPV6);
            req.extend_from_slice(&ip.octets());
        }
        Err(_) => {
            if host.len() > 255 {
                return Err(PitError::ProxyDial(format!("호스트 이름이 너무 김: {host}")));
            }
            req.push(ATYP_DOMAIN);
            req.push(host.len() as u8);
            req.extend_from_slice(host.as_bytes());
        }
    }
    req.extend_from_slice(&port.to_be_bytes());
    Ok(req)
}

fn reply_message(code: u8) -> &'static str {
    match code {
        0x01 => "일반 SOCKS 서버 실패",
        0x02 => "규칙에 의해 연결 거부",
        0x03 => "네트워크 도달 불가",
        0x04 => "호스트 도달 불가",
        0x05 => "연결 거부",
        0x06 => "TTL 만료",
        0x07 => "지원하지 않는 명령",
        0x08 => "지원하지 않는 주소 타입",
        _ => "알 수 없는 SOCKS 응답",
    }
}

fn dial_err(e: std::io::Error) -> PitError {
    PitError::ProxyDial(e.to_string())
}
