//! 벤치마크 설정 구조체.
//!
//! CLI/프로파일 레이어에서 채워진 뒤 `normalize()`로 기본값과 URL 보정을
//! 적용한다. 실행이 시작되면 변경하지 않는다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::PitError;

/// 기본 동시 연결 수
pub const DEFAULT_CONNECTIONS: usize = 128;
/// 기본 실행 시간
pub const DEFAULT_DURATION: Duration = Duration::from_secs(10);
/// 기본 요청 타임아웃
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);
/// 리다이렉트 추적 시 기본 최대 횟수
pub const DEFAULT_MAX_REDIRECTS: usize = 30;
/// 파이프라인 연결당 목표 동시 요청 수
pub const DEFAULT_PIPELINE_DEPTH: usize = 8;

/// 벤치마크 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// 벤치마크 대상 URL
    pub url: String,
    /// HTTP 메서드 (미지정 시 GET, args 본문이면 POST)
    pub method: Option<String>,
    /// `key:value` 형식 헤더 목록
    pub headers: Vec<String>,
    /// 요청 URI의 호스트 재정의
    pub host: Option<String>,
    /// 리터럴 본문
    pub body: Option<String>,
    /// 본문 파일 경로 (리터럴 본문보다 우선)
    pub file: Option<PathBuf>,
    /// `key=value` / `key:=value` 본문 조각
    pub args: Vec<String>,
    /// 동시 연결(워커) 수
    pub connections: usize,
    /// 정확한 요청 수 (지정 시 duration 무시)
    pub count: Option<u64>,
    /// 초당 최대 요청 수 (0이면 무제한)
    pub qps: u32,
    /// 실행 시간
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    /// 소켓/요청 타임아웃
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// `Connection: close` 전송
    pub disable_keep_alives: bool,
    /// 스트림 본문 사용 (chunked)
    pub stream: bool,
    /// JSON Content-Type 강제
    pub json: bool,
    /// Form Content-Type 강제
    pub form: bool,
    /// 서버 인증서 검증 생략
    pub insecure: bool,
    /// 클라이언트 인증서 경로 (PEM)
    pub cert: Option<PathBuf>,
    /// 클라이언트 인증서 개인키 경로 (PKCS#8 PEM)
    pub key: Option<PathBuf>,
    /// HTTP 프록시 주소 (`[user:pass@]host:port`)
    pub http_proxy: Option<String>,
    /// SOCKS5 프록시 주소 (`socks5://[user:pass@]host:port`)
    pub socks_proxy: Option<String>,
    /// 파이프라인 클라이언트 사용
    pub pipeline: bool,
    /// 파이프라인 연결당 목표 동시 요청 수
    pub pipeline_depth: usize,
    /// 디버그 모드에서 30x 리다이렉트 추적
    pub follow: bool,
    /// 최대 리다이렉트 횟수 (follow일 때만 유효)
    pub max_redirects: usize,
    /// 요청 한 번만 보내고 요청/응답 원문 출력
    pub debug: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: None,
            headers: Vec::new(),
            host: None,
            body: None,
            file: None,
            args: Vec::new(),
            connections: DEFAULT_CONNECTIONS,
            count: None,
            qps: 0,
            duration: DEFAULT_DURATION,
            timeout: DEFAULT_TIMEOUT,
            disable_keep_alives: false,
            stream: false,
            json: false,
            form: false,
            insecure: false,
            cert: None,
            key: None,
            http_proxy: None,
            socks_proxy: None,
            pipeline: false,
            pipeline_depth: DEFAULT_PIPELINE_DEPTH,
            follow: false,
            max_redirects: 0,
            debug: false,
        }
    }
}

impl BenchConfig {
    /// 대상 URL로 기본 설정 생성
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// 기본값 적용 + URL 보정
    ///
    /// URL이 비어 있으면 `Config` 에러.
    pub fn normalize(mut self) -> Result<Self, PitError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(PitError::Config("URL 누락".to_string()));
        }
        self.url = add_missing_schema_and_host(url);

        if self.connections == 0 {
            self.connections = DEFAULT_CONNECTIONS;
        }
        if self.duration.is_zero() {
            self.duration = DEFAULT_DURATION;
        }
        if self.timeout.is_zero() {
            self.timeout = DEFAULT_TIMEOUT;
        }
        if self.pipeline_depth == 0 {
            self.pipeline_depth = DEFAULT_PIPELINE_DEPTH;
        }
        if self.count == Some(0) {
            self.count = None;
        }
        self.max_redirects = self.effective_max_redirects();

        Ok(self)
    }

    /// follow가 꺼져 있으면 0, 켜져 있고 미지정이면 기본 30
    pub fn effective_max_redirects(&self) -> usize {
        if !self.follow {
            return 0;
        }
        if self.max_redirects == 0 {
            DEFAULT_MAX_REDIRECTS
        } else {
            self.max_redirects
        }
    }

    /// 파이프라인 모드에서 열 연결 수
    pub fn pipeline_connections(&self) -> usize {
        let depth = self.pipeline_depth.max(1);
        self.connections.div_ceil(depth).max(1)
    }
}

/// 스킴/호스트가 빠진 URL 보정
///
/// - `:3000`, `/path` → `http://localhost` 접두
/// - `example.com` → `http://example.com`
/// - 스킴이 있거나(`ftp://` 포함) `//`로 시작하면 그대로 둔다.
pub fn add_missing_schema_and_host(url: &str) -> String {
    if url.contains("://") || url.starts_with("//") {
        return url.to_string();
    }
    if url.starts_with(':') || url.starts_with('/') {
        return format!("http://localhost{url}");
    }
    format!("http://{url}")
}
