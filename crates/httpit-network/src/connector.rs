//! 연결 수립: 다이얼 → 바이트 카운팅 → (TLS).

use httpit_core::error::PitError;
use httpit_core::models::throughput::ThroughputCounter;
use std::net::SocketAddr;
use std::time::Duration;
use tokio_native_tls::TlsConnector;

use crate::codec::ResponseReader;
use crate::counting::{BoxedIo, CountingStream};
use crate::dialer::Dialer;
use crate::target::Target;
use crate::transport_err;

/// 수립된 연결
pub struct Connection {
    pub reader: ResponseReader<BoxedIo>,
    /// 원격 주소 (프록시 경유 시 프록시 주소)
    pub peer: SocketAddr,
}

/// 다이얼러 + TLS + 처리량 카운터
pub struct Connector {
    dialer: Dialer,
    tls: TlsConnector,
    counter: ThroughputCounter,
    timeout: Duration,
}

impl Connector {
    pub fn new(
        dialer: Dialer,
        tls: TlsConnector,
        counter: ThroughputCounter,
        timeout: Duration,
    ) -> Self {
        Self {
            dialer,
            tls,
            counter,
            timeout,
        }
    }

    /// 대상과 연결. TLS 대상이면 카운팅 스트림 위에서 핸드셰이크한다.
    pub async fn connect(&self, target: &Target) -> Result<Connection, PitError> {
        let tcp = self.dialer.dial(target, self.timeout).await?;
        let peer = tcp.peer_addr().map_err(transport_err)?;
        let counted = CountingStream::new(tcp, self.counter.clone());

        let io: BoxedIo = if target.is_tls {
            let tls = tokio::time::timeout(self.timeout, self.tls.connect(&target.host, counted))
                .await
                .map_err(|_| PitError::Transport("TLS 핸드셰이크 타임아웃".to_string()))?
                .map_err(|e| PitError::Transport(format!("TLS 핸드셰이크 실패: {e}")))?;
            Box::new(tls)
        } else {
            Box::new(counted)
        };

        Ok(Connection {
            reader: ResponseReader::new(io),
            peer,
        })
    }
}
