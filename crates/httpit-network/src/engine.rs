//! HTTP 요청 엔진.
//!
//! 설정에서 연결 전략(keep-alive 풀, 파이프라인, 디버그 원샷)을 한 번 고르고
//! `Requester`/`DebugRequester` 포트로 노출한다. 요청 타임아웃과 지연 측정은
//! 전략과 무관하게 여기서 처리한다.

use async_trait::async_trait;
use httpit_core::config::BenchConfig;
use httpit_core::error::PitError;
use httpit_core::models::outcome::{Completion, Outcome};
use httpit_core::models::throughput::ThroughputCounter;
use httpit_core::ports::requester::{DebugRequester, Requester};
use httpit_core::template::RequestTemplate;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::connector::Connector;
use crate::debug::DebugClient;
use crate::dialer::Dialer;
use crate::keepalive::KeepAliveClient;
use crate::pipeline::PipelineClient;
use crate::request::RequestWriter;
use crate::target::Target;
use crate::tls::build_connector;

/// 연결 전략
pub enum Strategy {
    KeepAlive(KeepAliveClient),
    Pipeline(PipelineClient),
    Debug(DebugClient),
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::KeepAlive(_) => "keep-alive",
            Strategy::Pipeline(_) => "pipeline",
            Strategy::Debug(_) => "debug",
        }
    }
}

pub struct HttpEngine {
    strategy: Strategy,
    timeout: Duration,
    counter: ThroughputCounter,
}

impl HttpEngine {
    /// 템플릿 조립, 대상/프록시/TLS 해석, 전략 선택
    ///
    /// HTTP 프록시는 여기서 CONNECT 터널을 한 번 열어 보고 200이 아니면
    /// `ProxyConnect`로 실패한다.
    pub async fn new(config: &BenchConfig, counter: ThroughputCounter) -> Result<Self, PitError> {
        let template = Arc::new(RequestTemplate::build(config)?);
        let target = Target::from_url(template.url())?;
        let dialer = Dialer::from_config(config)?;
        let tls = build_connector(config)?;

        if let Dialer::HttpProxy(proxy) = &dialer {
            proxy.tunnel(&target.addr(), config.timeout).await?;
            debug!("http 프록시 확인 완료: {}", proxy.addr);
        }

        let addr = target.addr();
        let connector = Arc::new(Connector::new(dialer, tls, counter.clone(), config.timeout));

        let strategy = if config.debug {
            Strategy::Debug(DebugClient::new(
                connector,
                template,
                config.effective_max_redirects(),
            ))
        } else if config.pipeline && !config.disable_keep_alives {
            Strategy::Pipeline(PipelineClient::new(
                target,
                connector,
                RequestWriter::new(template),
                config.pipeline_connections(),
                config.pipeline_depth,
            ))
        } else {
            Strategy::KeepAlive(KeepAliveClient::new(
                target,
                connector,
                RequestWriter::new(template),
                config.connections,
            ))
        };

        info!("엔진 생성: {} → {} ({})", strategy.name(), addr, config.url);

        Ok(Self {
            strategy,
            timeout: config.timeout,
            counter,
        })
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// 연결들이 공유하는 처리량 카운터
    pub fn throughput(&self) -> &ThroughputCounter {
        &self.counter
    }

    async fn round_trip(&self) -> Result<u16, PitError> {
        match &self.strategy {
            Strategy::KeepAlive(client) => client.round_trip().await,
            Strategy::Pipeline(client) => client.round_trip().await,
            Strategy::Debug(client) => client.round_trip().await,
        }
    }
}

#[async_trait]
impl Requester for HttpEngine {
    async fn issue_one(&self) -> Outcome {
        let start = Instant::now();
        match tokio::time::timeout(self.timeout, self.round_trip()).await {
            Ok(Ok(status)) => Ok(Completion::new(status, start.elapsed())),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(PitError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl DebugRequester for HttpEngine {
    async fn issue_debug(&self, sink: &mut (dyn Write + Send)) -> Result<(), PitError> {
        let Strategy::Debug(client) = &self.strategy else {
            return Err(PitError::Config("디버그 모드 엔진이 아님".to_string()));
        };
        let dump = tokio::time::timeout(self.timeout, client.exchange())
            .await
            .map_err(|_| PitError::Timeout(self.timeout))??;
        dump.write_to(sink)?;
        Ok(())
    }
}
