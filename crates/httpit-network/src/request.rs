//! 템플릿 요청 쓰기.
//!
//! 호출마다 요청 사본 풀에서 와이어 바이트를 빌리고, 스트림 본문이면
//! 본문 리더 풀에서 리더를 빌려 처음으로 되감은 뒤 chunked로 보낸다.

use bytes::Bytes;
use httpit_core::error::PitError;
use httpit_core::template::{RequestTemplate, STREAM_CHUNK_SIZE};
use std::io::Cursor;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::codec::write_chunked;
use crate::pool::Pool;
use crate::transport_err;

/// 요청 사본 풀 + 본문 리더 풀
pub struct RequestWriter {
    template: Arc<RequestTemplate>,
    requests: Arc<Pool<Vec<u8>>>,
    bodies: Arc<Pool<Cursor<Bytes>>>,
}

impl RequestWriter {
    pub fn new(template: Arc<RequestTemplate>) -> Self {
        let wire = template.encode();
        let body = template.body().clone();
        Self {
            template,
            requests: Pool::new(move || wire.clone()),
            bodies: Pool::new(move || Cursor::new(body.clone())),
        }
    }

    pub fn is_head(&self) -> bool {
        self.template.is_head()
    }

    pub fn is_idempotent(&self) -> bool {
        self.template.is_idempotent()
    }

    /// `Connection: close` 요청이면 응답 후 연결을 재사용하지 않는다.
    pub fn connection_close(&self) -> bool {
        self.template.connection_close()
    }

    /// 요청 하나를 쓴다 (flush 없음)
    pub async fn write<W: AsyncWrite + Unpin>(&self, io: &mut W) -> Result<(), PitError> {
        let wire = self.requests.get();
        io.write_all(&wire).await.map_err(transport_err)?;
        if self.template.is_stream() {
            let mut body = self.bodies.get();
            body.set_position(0);
            write_chunked(io, &mut *body, STREAM_CHUNK_SIZE).await?;
        }
        Ok(())
    }

    /// 요청 하나를 쓰고 flush
    pub async fn send<W: AsyncWrite + Unpin>(&self, io: &mut W) -> Result<(), PitError> {
        self.write(io).await?;
        io.flush().await.map_err(transport_err)
    }

    pub fn pooled_requests(&self) -> usize {
        self.requests.idle()
    }

    pub fn pooled_bodies(&self) -> usize {
        self.bodies.idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpit_core::config::BenchConfig;

    fn writer(stream: bool) -> RequestWriter {
        let config = BenchConfig {
            method: Some("POST".to_string()),
            body: Some("hello".to_string()),
            stream,
            ..BenchConfig::for_url("http://example.com/up")
        };
        RequestWriter::new(Arc::new(RequestTemplate::build(&config).unwrap()))
    }

    #[tokio::test]
    async fn constant_body_request() {
        let writer = writer(false);
        let mut out = Vec::new();
        writer.send(&mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("POST /up HTTP/1.1\r\nHost: example.com\r\n"));
        assert!(text.ends_with("Content-Length: 5\r\n\r\nhello"));
        assert_eq!(writer.pooled_requests(), 1);
        assert_eq!(writer.pooled_bodies(), 0);
    }

    #[tokio::test]
    async fn stream_body_is_rewound_each_call() {
        let writer = writer(true);
        for _ in 0..3 {
            let mut out = Vec::new();
            writer.send(&mut out).await.unwrap();
            let text = String::from_utf8(out).unwrap();
            assert!(text.ends_with("Transfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n"));
        }
        assert_eq!(writer.pooled_bodies(), 1);
    }
}
