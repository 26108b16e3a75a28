//! 디버그(원샷) 전략.
//!
//! 요청 하나를 `Connection: close`로 보내고 필요하면 30x 리다이렉트를
//! `max_redirects`번까지 따라간다. 마지막 교환의 요청/응답 원문을 기록해
//! 성공했을 때만 덤프로 내보낸다.

use httpit_core::error::PitError;
use httpit_core::template::{RequestTemplate, STREAM_CHUNK_SIZE};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::codec::encode_chunked;
use crate::connector::Connector;
use crate::target::Target;
use crate::transport_err;

/// 리다이렉트 상태 코드
pub fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// 요청/응답 원문 덤프
#[derive(Debug, Clone)]
pub struct WireDump {
    pub host: String,
    pub peer: SocketAddr,
    pub status: u16,
    pub request: Vec<u8>,
    pub response: Vec<u8>,
}

impl WireDump {
    /// `Connected to <host>(<remote-addr>)`, 빈 줄, 요청, 빈 줄, 응답
    pub fn write_to(&self, sink: &mut dyn Write) -> io::Result<()> {
        writeln!(sink, "Connected to {}({})", self.host, self.peer)?;
        writeln!(sink)?;
        sink.write_all(&self.request)?;
        writeln!(sink)?;
        writeln!(sink)?;
        sink.write_all(&self.response)?;
        writeln!(sink)?;
        sink.flush()
    }
}

pub struct DebugClient {
    connector: Arc<Connector>,
    template: Arc<RequestTemplate>,
    max_redirects: usize,
}

impl DebugClient {
    pub fn new(
        connector: Arc<Connector>,
        template: Arc<RequestTemplate>,
        max_redirects: usize,
    ) -> Self {
        Self {
            connector,
            template,
            max_redirects,
        }
    }

    /// 덤프 없이 상태 코드만
    pub async fn round_trip(&self) -> Result<u16, PitError> {
        Ok(self.exchange().await?.status)
    }

    /// 리다이렉트를 따라가며 마지막 교환의 원문 기록
    pub async fn exchange(&self) -> Result<WireDump, PitError> {
        let mut template = RequestTemplate::clone(&self.template);
        let mut redirects = 0;

        loop {
            let target = Target::from_url(template.url())?;
            let mut conn = self.connector.connect(&target).await?;

            let request = wire_bytes(&template);
            let io = conn.reader.get_mut();
            io.write_all(&request).await.map_err(transport_err)?;
            io.flush().await.map_err(transport_err)?;

            let mut response = Vec::new();
            let head = conn
                .reader
                .read_response(template.is_head(), Some(&mut response))
                .await?;

            if redirects < self.max_redirects && is_redirect(head.status) {
                if let Some(location) = head.location.as_deref() {
                    let next = template.url().join(location).map_err(|e| {
                        PitError::Transport(format!("잘못된 Location {location:?}: {e}"))
                    })?;
                    debug!("리다이렉트 {} → {}", head.status, next);
                    template = template.redirected(head.status, next);
                    redirects += 1;
                    continue;
                }
            }

            return Ok(WireDump {
                host: template.url().host_str().unwrap_or_default().to_string(),
                peer: conn.peer,
                status: head.status,
                request,
                response,
            });
        }
    }
}

/// 본문까지 포함한 요청 원문
fn wire_bytes(template: &RequestTemplate) -> Vec<u8> {
    let mut request = template.encode();
    if template.is_stream() {
        request.extend_from_slice(&encode_chunked(template.body(), STREAM_CHUNK_SIZE));
    }
    request
}
