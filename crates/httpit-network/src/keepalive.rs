//! 영구 연결 풀 전략.
//!
//! 최대 연결 수만큼의 permit으로 동시 연결을 제한하고, 응답이 keep-alive면
//! 연결을 유휴 목록에 돌려놓는다. 재사용 연결이 실패하면 멱등 메서드에
//! 한해 새 연결로 한 번 재시도한다 (서버가 먼저 닫은 유휴 연결).

use httpit_core::error::PitError;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::codec::ResponseHead;
use crate::connector::{Connection, Connector};
use crate::request::RequestWriter;
use crate::target::Target;

pub struct KeepAliveClient {
    target: Target,
    connector: Arc<Connector>,
    writer: RequestWriter,
    idle: Mutex<Vec<Connection>>,
    permits: Semaphore,
}

impl KeepAliveClient {
    pub fn new(
        target: Target,
        connector: Arc<Connector>,
        writer: RequestWriter,
        max_conns: usize,
    ) -> Self {
        Self {
            target,
            connector,
            writer,
            idle: Mutex::new(Vec::new()),
            permits: Semaphore::new(max_conns.max(1)),
        }
    }

    /// 요청 1회 왕복, 상태 코드 반환
    pub async fn round_trip(&self) -> Result<u16, PitError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| PitError::Transport("연결 풀 닫힘".to_string()))?;

        let reused = self.idle.lock().pop();
        if let Some(mut conn) = reused {
            match self.exchange(&mut conn).await {
                Ok(head) => {
                    self.release(conn, &head);
                    return Ok(head.status);
                }
                // 서버가 이미 읽었을 수 있으므로 비멱등 요청은 다시 보내지 않는다
                Err(e) if !self.writer.is_idempotent() => return Err(e),
                Err(e) => debug!("유휴 연결 실패, 새 연결로 재시도: {}", e),
            }
        }

        let mut conn = self.connector.connect(&self.target).await?;
        let head = self.exchange(&mut conn).await?;
        self.release(conn, &head);
        Ok(head.status)
    }

    /// 유휴 연결 수
    pub fn idle_connections(&self) -> usize {
        self.idle.lock().len()
    }

    async fn exchange(&self, conn: &mut Connection) -> Result<ResponseHead, PitError> {
        self.writer.send(conn.reader.get_mut()).await?;
        conn.reader.read_response(self.writer.is_head(), None).await
    }

    fn release(&self, conn: Connection, head: &ResponseHead) {
        if head.keep_alive && !self.writer.connection_close() {
            self.idle.lock().push(conn);
        }
    }
}
