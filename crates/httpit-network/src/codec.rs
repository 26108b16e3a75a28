//! HTTP/1.1 응답 읽기와 요청 본문 쓰기.
//!
//! 응답 헤드는 `httparse`로 파싱하고 본문은 Content-Length, chunked,
//! 연결 종료까지 중 하나로 경계를 정한다. 본문 내용은 버리고 길이만
//! 소비한다 (디버그 모드에서는 원문 그대로 기록).

use bytes::{Buf, BytesMut};
use httpit_core::error::PitError;
use std::io::{self, Read};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::transport_err;

/// 헤더 최대 개수
const MAX_HEADERS: usize = 64;
/// 한 번에 읽는 최소 버퍼 크기
const READ_CHUNK: usize = 8 * 1024;

/// 파싱된 응답 헤드 요약
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    /// 응답 후 연결 재사용 가능 여부
    pub keep_alive: bool,
    /// `Location` 헤더
    pub location: Option<String>,
}

#[derive(Debug)]
struct RawHead {
    status: u16,
    http10: bool,
    content_length: Option<u64>,
    chunked: bool,
    conn_close: bool,
    conn_keep_alive: bool,
    location: Option<String>,
    len: usize,
}

/// 버퍼링된 응답 리더
pub struct ResponseReader<R> {
    io: R,
    buf: BytesMut,
}

impl<R: AsyncRead + Unpin> ResponseReader<R> {
    pub fn new(io: R) -> Self {
        Self {
            io,
            buf: BytesMut::with_capacity(READ_CHUNK),
        }
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.io
    }

    /// 내부 스트림 반환. 읽고 남은 버퍼는 버린다.
    pub fn into_inner(self) -> R {
        self.io
    }

    /// 응답 하나를 끝까지 읽는다.
    ///
    /// 1xx 중간 응답은 건너뛴다. HEAD 요청, 204, 304는 본문이 없다.
    /// `raw`가 있으면 소비한 바이트를 그대로 덧붙인다.
    pub async fn read_response(
        &mut self,
        is_head: bool,
        mut raw: Option<&mut Vec<u8>>,
    ) -> Result<ResponseHead, PitError> {
        loop {
            let head = self.read_head().await?;
            self.consume(head.len, raw.as_deref_mut());

            if (100..200).contains(&head.status) && head.status != 101 {
                continue;
            }

            let mut keep_alive = if head.http10 {
                head.conn_keep_alive
            } else {
                !head.conn_close
            };

            let no_body = is_head || head.status == 204 || head.status == 304 || head.status == 101;
            if !no_body {
                if head.chunked {
                    self.read_chunked(raw.as_deref_mut()).await?;
                } else if let Some(n) = head.content_length {
                    self.skip(n, raw.as_deref_mut()).await?;
                } else {
                    self.read_to_eof(raw.as_deref_mut()).await?;
                    keep_alive = false;
                }
            }

            return Ok(ResponseHead {
                status: head.status,
                keep_alive,
                location: head.location,
            });
        }
    }

    async fn read_head(&mut self) -> Result<RawHead, PitError> {
        loop {
            if let Some(head) = parse_head(&self.buf)? {
                return Ok(head);
            }
            if self.fill().await? == 0 {
                return Err(PitError::Transport(
                    "응답 헤더 수신 전 연결 종료".to_string(),
                ));
            }
        }
    }

    async fn read_chunked(&mut self, mut raw: Option<&mut Vec<u8>>) -> Result<(), PitError> {
        loop {
            let line = self.read_line(raw.as_deref_mut()).await?;
            let size_str = line.split(';').next().unwrap_or("").trim();
            let size = u64::from_str_radix(size_str, 16).map_err(|_| {
                PitError::Transport(format!("잘못된 chunk 크기: {size_str:?}"))
            })?;

            if size == 0 {
                // trailer 끝(빈 줄)까지 소비
                loop {
                    let trailer = self.read_line(raw.as_deref_mut()).await?;
                    if trailer.is_empty() {
                        return Ok(());
                    }
                }
            }
            self.skip(size, raw.as_deref_mut()).await?;
            let end = self.read_line(raw.as_deref_mut()).await?;
            if !end.is_empty() {
                return Err(PitError::Transport("chunk 종료 CRLF 누락".to_string()));
            }
        }
    }

    /// CRLF(또는 LF)까지 한 줄 소비. 반환값은 줄바꿈 제외.
    async fn read_line(&mut self, raw: Option<&mut Vec<u8>>) -> Result<String, PitError> {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let line = String::from_utf8_lossy(&self.buf[..pos])
                    .trim_end_matches('\r')
                    .to_string();
                self.consume(pos + 1, raw);
                return Ok(line);
            }
            if self.fill().await? == 0 {
                return Err(PitError::Transport("chunk 수신 중 연결 종료".to_string()));
            }
        }
    }

    async fn skip(&mut self, mut n: u64, mut raw: Option<&mut Vec<u8>>) -> Result<(), PitError> {
        while n > 0 {
            if self.buf.is_empty() && self.fill().await? == 0 {
                return Err(PitError::Transport("본문 수신 중 연결 종료".to_string()));
            }
            let take = self.buf.len().min(usize::try_from(n).unwrap_or(usize::MAX));
            self.consume(take, raw.as_deref_mut());
            n -= take as u64;
        }
        Ok(())
    }

    async fn read_to_eof(&mut self, mut raw: Option<&mut Vec<u8>>) -> Result<(), PitError> {
        loop {
            let len = self.buf.len();
            self.consume(len, raw.as_deref_mut());
            if self.fill().await? == 0 {
                return Ok(());
            }
        }
    }

    fn consume(&mut self, n: usize, raw: Option<&mut Vec<u8>>) {
        if let Some(raw) = raw {
            raw.extend_from_slice(&self.buf[..n]);
        }
        self.buf.advance(n);
    }

    async fn fill(&mut self) -> Result<usize, PitError> {
        self.buf.reserve(READ_CHUNK);
        self.io.read_buf(&mut self.buf).await.map_err(transport_err)
    }
}

fn parse_head(buf: &[u8]) -> Result<Option<RawHead>, PitError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut resp = httparse::Response::new(&mut headers);
    let len = match resp.parse(buf) {
        Ok(httparse::Status::Complete(len)) => len,
        Ok(httparse::Status::Partial) => return Ok(None),
        Err(e) => return Err(PitError::Transport(format!("응답 파싱 실패: {e}"))),
    };

    let mut head = RawHead {
        status: resp.code.unwrap_or_default(),
        http10: resp.version == Some(0),
        content_length: None,
        chunked: false,
        conn_close: false,
        conn_keep_alive: false,
        location: None,
        len,
    };

    for h in resp.headers.iter() {
        let value = String::from_utf8_lossy(h.value);
        let value = value.trim();
        if h.name.eq_ignore_ascii_case("content-length") {
            let n = value
                .parse::<u64>()
                .map_err(|_| PitError::Transport(format!("잘못된 Content-Length: {value:?}")))?;
            head.content_length = Some(n);
        } else if h.name.eq_ignore_ascii_case("transfer-encoding") {
            head.chunked = value
                .rsplit(',')
                .next()
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("chunked"));
        } else if h.name.eq_ignore_ascii_case("connection") {
            for token in value.split(',') {
                let token = token.trim();
                if token.eq_ignore_ascii_case("close") {
                    head.conn_close = true;
                } else if token.eq_ignore_ascii_case("keep-alive") {
                    head.conn_keep_alive = true;
                }
            }
        } else if h.name.eq_ignore_ascii_case("location") {
            head.location = Some(value.to_string());
        }
    }
    Ok(Some(head))
}

/// 스트림 본문을 chunked 인코딩으로 쓴다.
pub async fn write_chunked<W, R>(io: &mut W, body: &mut R, chunk_size: usize) -> Result<(), PitError>
where
    W: AsyncWrite + Unpin,
    R: Read,
{
    let mut chunk = vec![0u8; chunk_size.max(1)];
    loop {
        let n = read_some(body, &mut chunk).map_err(transport_err)?;
        if n == 0 {
            break;
        }
        io.write_all(format!("{n:x}\r\n").as_bytes())
            .await
            .map_err(transport_err)?;
        io.write_all(&chunk[..n]).await.map_err(transport_err)?;
        io.write_all(b"\r\n").await.map_err(transport_err)?;
    }
    io.write_all(b"0\r\n\r\n").await.map_err(transport_err)
}

/// 본문 전체를 chunked 인코딩 바이트로 변환 (디버그 덤프용)
pub fn encode_chunked(body: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 32);
    for chunk in body.chunks(chunk_size.max(1)) {
        out.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
        out.extend_from_slice(chunk);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out
}

fn read_some<R: Read>(body: &mut R, chunk: &mut [u8]) -> io::Result<usize> {
    loop {
        match body.read(chunk) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}
