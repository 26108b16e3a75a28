//! 요청 템플릿 빌더.
//!
//! 설정에서 메서드, URI, 헤더, Content-Type, 본문을 한 번 조립한다.
//! 만들어진 템플릿은 불변이며 엔진이 호출마다 와이어 바이트 사본을 만든다.
//! 네트워크 I/O는 하지 않는다.

use bytes::Bytes;
use std::fs;
use tracing::warn;
use url::Url;

use crate::args::{encode_args, ArgsKind};
use crate::config::BenchConfig;
use crate::error::PitError;
use crate::header::HeaderList;

/// 기본 User-Agent
pub const DEFAULT_USER_AGENT: &str = concat!("httpit/", env!("CARGO_PKG_VERSION"));

/// 스트림 본문 chunk 크기
pub const STREAM_CHUNK_SIZE: usize = 4096;

/// 재전송해도 되는 메서드
const IDEMPOTENT_METHODS: [&str; 6] = ["GET", "HEAD", "PUT", "DELETE", "OPTIONS", "TRACE"];

/// 본문 프레이밍 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// 본문 없음 (GET/HEAD 빈 본문)
    Empty,
    /// `Content-Length: n`
    Length(usize),
    /// `Transfer-Encoding: chunked`
    Chunked,
}

/// 조립이 끝난 요청 템플릿
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    method: String,
    url: Url,
    /// Host 헤더 값 (host 재정의 반영)
    authority: String,
    /// 프레이밍 헤더(Host, Content-Length, Transfer-Encoding) 제외
    headers: HeaderList,
    body: Bytes,
    stream: bool,
}

impl RequestTemplate {
    /// 설정으로 템플릿 조립
    pub fn build(config: &BenchConfig) -> Result<Self, PitError> {
        let url = Url::parse(&config.url)
            .map_err(|e| PitError::Config(format!("잘못된 URL {:?}: {e}", config.url)))?;

        let mut headers = HeaderList::parse(&config.headers)?;
        let mut body = load_body(config)?;

        let mut content_type = None;
        let mut args_kind = None;
        if let Some(encoded) = encode_args(&config.args) {
            if !body.is_empty() {
                warn!("args 본문이 body/file 본문을 대체함");
            }
            body = Bytes::from(encoded.body);
            content_type = Some(encoded.kind.content_type());
            args_kind = Some(encoded.kind);
        } else if config.json {
            content_type = Some(ArgsKind::Json.content_type());
        } else if config.form {
            content_type = Some(ArgsKind::Form.content_type());
        }

        let method = match (&config.method, args_kind) {
            (Some(m), _) if !m.trim().is_empty() => m.trim().to_ascii_uppercase(),
            (_, Some(_)) => "POST".to_string(),
            _ => "GET".to_string(),
        };

        let mut authority = default_authority(&url);
        if let Some(host) = headers.remove("host") {
            authority = host;
        }
        if let Some(host) = config.host.as_deref().filter(|h| !h.is_empty()) {
            authority = host.to_string();
        }

        headers.remove("content-length");
        headers.remove("transfer-encoding");
        if let Some(ct) = content_type {
            headers.set("Content-Type", ct);
        }
        if headers.get("user-agent").is_none() {
            headers.set("User-Agent", DEFAULT_USER_AGENT);
        }
        if config.disable_keep_alives || config.debug {
            headers.set("Connection", "close");
        }

        Ok(Self {
            method,
            url,
            authority,
            headers,
            body,
            stream: config.stream,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Host 헤더로 전송되는 값
    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn is_stream(&self) -> bool {
        self.stream
    }

    pub fn is_head(&self) -> bool {
        self.method.eq_ignore_ascii_case("HEAD")
    }

    /// 같은 요청을 다시 보내도 서버 상태가 같은 메서드인지
    pub fn is_idempotent(&self) -> bool {
        IDEMPOTENT_METHODS
            .iter()
            .any(|m| m.eq_ignore_ascii_case(&self.method))
    }

    /// `Connection: close` 요청인지
    pub fn connection_close(&self) -> bool {
        self.headers
            .get("connection")
            .is_some_and(|v| v.eq_ignore_ascii_case("close"))
    }

    /// 본문 프레이밍
    pub fn framing(&self) -> Framing {
        if self.stream {
            Framing::Chunked
        } else if self.body.is_empty()
            && (self.method.eq_ignore_ascii_case("GET") || self.is_head())
        {
            Framing::Empty
        } else {
            Framing::Length(self.body.len())
        }
    }

    /// 요청 라인 + 헤더 인코딩
    pub fn encode_head(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);
        let target = request_target(&self.url);
        buf.extend_from_slice(self.method.as_bytes());
        buf.push(b' ');
        buf.extend_from_slice(target.as_bytes());
        buf.extend_from_slice(b" HTTP/1.1\r\nHost: ");
        buf.extend_from_slice(self.authority.as_bytes());
        buf.extend_from_slice(b"\r\n");
        for (k, v) in self.headers.iter() {
            buf.extend_from_slice(k.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(v.as_bytes());
            buf.extend_from_slice(b"\r\n");
        }
        match self.framing() {
            Framing::Empty => {}
            Framing::Length(n) => {
                buf.extend_from_slice(format!("Content-Length: {n}\r\n").as_bytes());
            }
            Framing::Chunked => buf.extend_from_slice(b"Transfer-Encoding: chunked\r\n"),
        }
        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// 전체 요청 인코딩 (고정 본문이면 본문 포함, 스트림이면 헤더만)
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = self.encode_head();
        if !self.stream {
            buf.extend_from_slice(&self.body);
        }
        buf
    }

    /// 리다이렉트 대상으로 새 템플릿 생성
    ///
    /// 301/302/303은 GET/HEAD가 아니면 본문 없는 GET으로 바꾸고,
    /// 307/308은 메서드와 본문을 유지한다.
    pub fn redirected(&self, status: u16, location: Url) -> Self {
        let mut next = self.clone();
        next.authority = default_authority(&location);
        next.url = location;

        let keep_method = matches!(status, 307 | 308) || self.is_head();
        if !keep_method && !self.method.eq_ignore_ascii_case("GET") {
            next.method = "GET".to_string();
            next.body = Bytes::new();
            next.stream = false;
            next.headers.remove("content-type");
        }
        next
    }
}

/// 본문 원천 결정: 파일 경로가 있으면 파일, 없으면 리터럴 문자열
pub fn load_body(config: &BenchConfig) -> Result<Bytes, PitError> {
    if let Some(path) = &config.file {
        let data = fs::read(path)?;
        return Ok(Bytes::from(data));
    }
    Ok(config
        .body
        .as_ref()
        .map(|b| Bytes::from(b.clone().into_bytes()))
        .unwrap_or_default())
}

/// URL의 기본 authority (기본 포트면 생략)
pub fn default_authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// origin-form 요청 대상 (`/path?query`)
pub fn request_target(url: &Url) -> String {
    let path = if url.path().is_empty() { "/" } else { url.path() };
    match url.query() {
        Some(q) => format!("{path}?{q}"),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config(url: &str) -> BenchConfig {
        BenchConfig::for_url(url)
    }

    #[test]
    fn default_get_request() {
        let t = RequestTemplate::build(&config("http://example.com/ping?x=1")).unwrap();
        let wire = String::from_utf8(t.encode()).unwrap();
        assert_eq!(
            wire,
            format!(
                "GET /ping?x=1 HTTP/1.1\r\nHost: example.com\r\nUser-Agent: {DEFAULT_USER_AGENT}\r\n\r\n"
            )
        );
        assert_eq!(t.framing(), Framing::Empty);
    }

    #[test]
    fn idempotent_methods() {
        for (method, expected) in [
            ("GET", true),
            ("head", true),
            ("PUT", true),
            ("DELETE", true),
            ("POST", false),
            ("PATCH", false),
        ] {
            let mut c = config("http://example.com");
            c.method = Some(method.to_string());
            let t = RequestTemplate::build(&c).unwrap();
            assert_eq!(t.is_idempotent(), expected, "{method}");
        }
    }

    #[test]
    fn malformed_header_fails() {
        let mut c = config("http://example.com");
        c.headers = vec!["broken".to_string()];
        let err = RequestTemplate::build(&c).unwrap_err();
        assert!(matches!(err, PitError::MalformedHeader(_)));
    }

    #[test]
    fn host_header_rewrites_authority() {
        let mut c = config("http://127.0.0.1:8080/");
        c.headers = vec!["Host: a.example".to_string(), "X-Trace: 1".to_string()];
        let t = RequestTemplate::build(&c).unwrap();
        assert_eq!(t.authority(), "a.example");
        assert!(t.headers().get("host").is_none());
        assert_eq!(t.url().port(), Some(8080));

        c.host = Some("b.example".to_string());
        let t = RequestTemplate::build(&c).unwrap();
        assert_eq!(t.authority(), "b.example");
    }

    #[test]
    fn args_switch_to_post_json() {
        let mut c = config("http://example.com");
        c.args = vec!["foo:=1".to_string(), "bar:=baz".to_string()];
        let t = RequestTemplate::build(&c).unwrap();
        assert_eq!(t.method(), "POST");
        assert_eq!(t.headers().get("content-type"), Some("application/json"));
        assert_eq!(&t.body()[..], br#"{"foo":1,"bar":"baz"}"#);
        assert_eq!(t.framing(), Framing::Length(21));
    }

    #[test]
    fn args_respect_explicit_method() {
        let mut c = config("http://example.com");
        c.method = Some("put".to_string());
        c.args = vec!["a=1".to_string()];
        let t = RequestTemplate::build(&c).unwrap();
        assert_eq!(t.method(), "PUT");
        assert_eq!(
            t.headers().get("content-type"),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn args_replace_literal_body() {
        let mut c = config("http://example.com");
        c.body = Some("raw".to_string());
        c.args = vec!["a=1".to_string()];
        let t = RequestTemplate::build(&c).unwrap();
        assert_eq!(&t.body()[..], b"a=1");
        assert_eq!(t.framing(), Framing::Length(3));
    }

    #[test]
    fn json_and_form_flags() {
        let mut c = config("http://example.com");
        c.json = true;
        let t = RequestTemplate::build(&c).unwrap();
        assert_eq!(t.headers().get("content-type"), Some("application/json"));
        assert_eq!(t.method(), "GET");

        c.json = false;
        c.form = true;
        let t = RequestTemplate::build(&c).unwrap();
        assert_eq!(
            t.headers().get("content-type"),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn body_from_file_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"from-file").unwrap();

        let mut c = config("http://example.com");
        c.method = Some("POST".to_string());
        c.body = Some("literal".to_string());
        c.file = Some(file.path().to_path_buf());
        let t = RequestTemplate::build(&c).unwrap();
        assert_eq!(&t.body()[..], b"from-file");

        c.file = None;
        let t = RequestTemplate::build(&c).unwrap();
        assert_eq!(&t.body()[..], b"literal");
    }

    #[test]
    fn missing_body_file() {
        let mut c = config("http://example.com");
        c.file = Some("/nonexistent/body.json".into());
        let err = RequestTemplate::build(&c).unwrap_err();
        assert!(matches!(err, PitError::Io(_)));
    }

    #[test]
    fn framing_headers_are_computed() {
        let mut c = config("http://example.com");
        c.method = Some("POST".to_string());
        c.body = Some("abc".to_string());
        c.headers = vec![
            "Content-Length: 999".to_string(),
            "Transfer-Encoding: gzip".to_string(),
        ];
        c.disable_keep_alives = true;
        let t = RequestTemplate::build(&c).unwrap();
        let wire = String::from_utf8(t.encode()).unwrap();
        assert!(wire.contains("Content-Length: 3\r\n"));
        assert!(!wire.contains("999"));
        assert!(!wire.contains("gzip"));
        assert!(t.connection_close());
        assert!(wire.ends_with("\r\n\r\nabc"));
    }

    #[test]
    fn stream_body_uses_chunked_head() {
        let mut c = config("http://example.com");
        c.method = Some("POST".to_string());
        c.body = Some("abc".to_string());
        c.stream = true;
        let t = RequestTemplate::build(&c).unwrap();
        let wire = String::from_utf8(t.encode()).unwrap();
        assert!(wire.ends_with("Transfer-Encoding: chunked\r\n\r\n"));
    }

    #[test]
    fn redirect_rewrites_method() {
        let mut c = config("http://example.com/a");
        c.method = Some("POST".to_string());
        c.body = Some("abc".to_string());
        let t = RequestTemplate::build(&c).unwrap();

        let next = t.redirected(302, Url::parse("http://other.example:8080/b").unwrap());
        assert_eq!(next.method(), "GET");
        assert!(next.body().is_empty());
        assert_eq!(next.authority(), "other.example:8080");

        let next = t.redirected(307, Url::parse("http://example.com/c").unwrap());
        assert_eq!(next.method(), "POST");
        assert_eq!(&next.body()[..], b"abc");
    }
}
