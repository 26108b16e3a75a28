//! CLI 플래그 정의.
//!
//! 지정한 플래그만 프로파일/환경변수에서 읽은 설정 위에 덮어쓴다.

use clap::Parser;
use httpit_core::config::BenchConfig;
use std::path::PathBuf;
use std::time::Duration;

/// httpit: 빠른 HTTP 벤치마크 도구
#[derive(Parser, Debug)]
#[command(name = "httpit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 벤치마크 대상 URL (`:3000`, `/path`, `example.com` 형식 허용)
    pub url: Option<String>,

    /// 요청 본문 인자 (`key=value` form 또는 `key:=value` JSON)
    pub args: Vec<String>,

    /// 최대 동시 연결 수
    #[arg(short = 'c', long)]
    pub connections: Option<usize>,

    /// 총 요청 수 (지정 시 duration 무시)
    #[arg(short = 'n', long = "requests")]
    pub requests: Option<u64>,

    /// 초당 최대 요청 수 (0 = 무제한)
    #[arg(short = 'q', long)]
    pub qps: Option<u32>,

    /// 실행 시간 (예: 10s, 1m)
    #[arg(short = 'd', long, value_parser = humantime::parse_duration)]
    pub duration: Option<Duration>,

    /// 소켓/요청 타임아웃
    #[arg(short = 't', long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// HTTP 메서드
    #[arg(short = 'X', long)]
    pub method: Option<String>,

    /// `K: V` 형식 헤더, 반복 가능
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Host 헤더 덮어쓰기
    #[arg(long)]
    pub host: Option<String>,

    /// 요청 본문
    #[arg(short = 'b', long)]
    pub body: Option<String>,

    /// 파일에서 요청 본문 읽기
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// 스트리밍(chunked) 본문
    #[arg(short = 's', long)]
    pub stream: bool,

    /// JSON 요청 (Content-Type: application/json)
    #[arg(short = 'j', long)]
    pub json: bool,

    /// form 요청 (Content-Type: application/x-www-form-urlencoded)
    #[arg(short = 'F', long)]
    pub form: bool,

    /// keep-alive 끄기 (Connection: close)
    #[arg(short = 'a', long = "disableKeepAlives", alias = "disable-keep-alives")]
    pub disable_keep_alives: bool,

    /// 서버 인증서 검증 생략
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// 클라이언트 TLS 인증서 경로
    #[arg(long)]
    pub cert: Option<PathBuf>,

    /// 클라이언트 TLS 개인키 경로
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// HTTP 프록시 (`[user:pass@]host:port`)
    #[arg(short = 'x', long = "httpProxy", alias = "http-proxy")]
    pub http_proxy: Option<String>,

    /// SOCKS5 프록시 (`socks5://[user:pass@]host:port`)
    #[arg(short = 'p', long = "socksProxy", alias = "socks-proxy")]
    pub socks_proxy: Option<String>,

    /// HTTP 파이프라이닝
    #[arg(short = 'P', long)]
    pub pipeline: bool,

    /// 파이프라인 연결당 동시 요청 수
    #[arg(long)]
    pub pipeline_depth: Option<usize>,

    /// 리다이렉트 추적 (디버그 모드)
    #[arg(long)]
    pub follow: bool,

    /// 최대 리다이렉트 횟수
    #[arg(long)]
    pub max_redirects: Option<usize>,

    /// 요청 1회 보내고 원본 요청/응답 출력
    #[arg(short = 'D', long)]
    pub debug: bool,

    /// 프로파일 파일 (TOML/JSON/YAML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// 지정된 플래그만 `base`에 덮어쓴다
    pub fn apply(self, mut base: BenchConfig) -> BenchConfig {
        if let Some(url) = self.url {
            base.url = url;
        }
        if !self.args.is_empty() {
            base.args = self.args;
        }
        if let Some(v) = self.connections {
            base.connections = v;
        }
        if let Some(v) = self.requests {
            base.count = Some(v);
        }
        if let Some(v) = self.qps {
            base.qps = v;
        }
        if let Some(v) = self.duration {
            base.duration = v;
        }
        if let Some(v) = self.timeout {
            base.timeout = v;
        }
        if self.method.is_some() {
            base.method = self.method;
        }
        if !self.headers.is_empty() {
            base.headers.extend(self.headers);
        }
        if self.host.is_some() {
            base.host = self.host;
        }
        if self.body.is_some() {
            base.body = self.body;
        }
        if self.file.is_some() {
            base.file = self.file;
        }
        if self.cert.is_some() {
            base.cert = self.cert;
        }
        if self.key.is_some() {
            base.key = self.key;
        }
        if self.http_proxy.is_some() {
            base.http_proxy = self.http_proxy;
        }
        if self.socks_proxy.is_some() {
            base.socks_proxy = self.socks_proxy;
        }
        if let Some(v) = self.pipeline_depth {
            base.pipeline_depth = v;
        }
        if let Some(v) = self.max_redirects {
            base.max_redirects = v;
        }

        base.stream |= self.stream;
        base.json |= self.json;
        base.form |= self.form;
        base.disable_keep_alives |= self.disable_keep_alives;
        base.insecure |= self.insecure;
        base.pipeline |= self.pipeline;
        base.follow |= self.follow;
        base.debug |= self.debug;
        base
    }
}
