//! 파이프라이닝 전략.
//!
//! 연결마다 쓰기 태스크와 읽기 태스크를 하나씩 둔다. 쓰기 태스크는 이전
//! 응답을 기다리지 않고 요청을 연달아 쓰고, 응답 대기열(FIFO)에 회신 채널을
//! 넣는다. 읽기 태스크는 대기열 순서대로 응답을 읽어 회신한다.
//! 연결이 끊기면 남은 대기 요청은 모두 에러로 끝나고 다음 호출에서 재연결한다.

use httpit_core::error::PitError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::debug;

use crate::codec::ResponseReader;
use crate::connector::{Connection, Connector};
use crate::counting::BoxedIo;
use crate::request::RequestWriter;
use crate::target::Target;
use crate::transport_err;

type Reply = oneshot::Sender<Result<u16, PitError>>;

fn closed() -> PitError {
    PitError::Transport("파이프라인 연결 종료".to_string())
}

pub struct PipelineClient {
    target: Target,
    connector: Arc<Connector>,
    writer: Arc<RequestWriter>,
    depth: usize,
    slots: Vec<Mutex<Option<mpsc::Sender<Reply>>>>,
    next: AtomicUsize,
}

impl PipelineClient {
    /// `conns`개 연결, 연결당 최대 `depth`개 요청을 쓰기 대기
    pub fn new(
        target: Target,
        connector: Arc<Connector>,
        writer: RequestWriter,
        conns: usize,
        depth: usize,
    ) -> Self {
        Self {
            target,
            connector,
            writer: Arc::new(writer),
            depth: depth.max(1),
            slots: (0..conns.max(1)).map(|_| Mutex::new(None)).collect(),
            next: AtomicUsize::new(0),
        }
    }

    pub fn connections(&self) -> usize {
        self.slots.len()
    }

    /// 요청 1회 왕복, 상태 코드 반환
    pub async fn round_trip(&self) -> Result<u16, PitError> {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.slots.len();
        let sender = self.sender(idx).await?;

        let (tx, rx) = oneshot::channel();
        sender.send(tx).await.map_err(|_| closed())?;
        rx.await.map_err(|_| closed())?
    }

    /// 살아 있는 연결의 송신 채널. 닫혔으면 새로 연결한다.
    async fn sender(&self, idx: usize) -> Result<mpsc::Sender<Reply>, PitError> {
        let mut slot = self.slots[idx].lock().await;
        if let Some(tx) = slot.as_ref().filter(|tx| !tx.is_closed()) {
            return Ok(tx.clone());
        }

        let conn = self.connector.connect(&self.target).await?;
        debug!("파이프라인 연결 #{} 수립: {}", idx, conn.peer);
        let tx = spawn_connection(conn, Arc::clone(&self.writer), self.depth);
        *slot = Some(tx.clone());
        Ok(tx)
    }
}

fn spawn_connection(
    conn: Connection,
    writer: Arc<RequestWriter>,
    depth: usize,
) -> mpsc::Sender<Reply> {
    let (job_tx, job_rx) = mpsc::channel(depth);
    let (pending_tx, pending_rx) = mpsc::unbounded_channel();
    let is_head = writer.is_head();

    let (read_half, write_half) = tokio::io::split(conn.reader.into_inner());
    tokio::spawn(write_loop(write_half, job_rx, pending_tx, writer, depth));
    tokio::spawn(read_loop(ResponseReader::new(read_half), pending_rx, is_head));
    job_tx
}

async fn write_loop(
    mut io: WriteHalf<BoxedIo>,
    mut jobs: mpsc::Receiver<Reply>,
    pending: mpsc::UnboundedSender<Reply>,
    writer: Arc<RequestWriter>,
    depth: usize,
) {
    loop {
        // 읽기 태스크가 끝났으면 새 요청을 받지 않는다
        let first = tokio::select! {
            job = jobs.recv() => match job {
                Some(reply) => reply,
                None => break,
            },
            _ = pending.closed() => break,
        };

        // 대기 중인 요청을 모아 한 번에 flush
        let mut batch = vec![first];
        while batch.len() < depth {
            match jobs.try_recv() {
                Ok(reply) => batch.push(reply),
                Err(_) => break,
            }
        }

        let mut written = Vec::with_capacity(batch.len());
        let mut broken = false;
        for reply in batch {
            if broken {
                let _ = reply.send(Err(closed()));
                continue;
            }
            match writer.write(&mut io).await {
                Ok(()) => written.push(reply),
                Err(e) => {
                    let _ = reply.send(Err(e));
                    broken = true;
                }
            }
        }
        if !broken {
            if let Err(e) = io.flush().await.map_err(transport_err) {
                debug!("파이프라인 flush 실패: {}", e);
                broken = true;
            }
        }

        for reply in written {
            if broken {
                let _ = reply.send(Err(closed()));
            } else if let Err(mpsc::error::SendError(reply)) = pending.send(reply) {
                let _ = reply.send(Err(closed()));
                broken = true;
            }
        }
        if broken {
            break;
        }
    }
    let _ = io.shutdown().await;
}

async fn read_loop(
    mut reader: ResponseReader<ReadHalf<BoxedIo>>,
    mut pending: mpsc::UnboundedReceiver<Reply>,
    is_head: bool,
) {
    while let Some(reply) = pending.recv().await {
        match reader.read_response(is_head, None).await {
            Ok(head) => {
                let _ = reply.send(Ok(head.status));
                if !head.keep_alive {
                    debug!("서버가 파이프라인 연결을 닫음");
                    break;
                }
            }
            Err(e) => {
                let _ = reply.send(Err(e));
                break;
            }
        }
    }
    pending.close();
    while let Ok(reply) = pending.try_recv() {
        let _ = reply.send(Err(closed()));
    }
}
