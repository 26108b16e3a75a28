//! 실행 중단 신호.
//!
//! 집계기의 종료 판정과 외부 취소(Ctrl-C) 중 먼저 온 쪽이 단 한 번
//! 신호를 닫는다. 워커는 루프마다 블로킹 없이 확인한다.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// 중단 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 요청 수/실행 시간 도달
    Completed,
    /// 외부 취소
    Cancelled,
}

/// 복제 가능한 중단 신호
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<Option<StopReason>>>,
    rx: watch::Receiver<Option<StopReason>>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// 신호 발송. 처음 호출만 `true`.
    pub fn trigger(&self, reason: StopReason) -> bool {
        let fired = self.tx.send_if_modified(|state| {
            if state.is_none() {
                *state = Some(reason);
                true
            } else {
                false
            }
        });
        if fired {
            info!("중단 신호 발송: {:?}", reason);
        }
        fired
    }

    /// 블로킹 없이 중단 여부 확인
    pub fn is_stopped(&self) -> bool {
        self.rx.borrow().is_some()
    }

    pub fn reason(&self) -> Option<StopReason> {
        *self.rx.borrow()
    }

    /// 중단될 때까지 대기
    pub async fn stopped(&self) -> StopReason {
        let mut rx = self.rx.clone();
        // 값을 복사해 꺼내고 나서 `rx`를 놓는다
        let state = rx.wait_for(Option::is_some).await.map(|state| *state);
        match state {
            Ok(reason) => reason.unwrap_or(StopReason::Cancelled),
            // 송신자는 self가 들고 있으므로 닫히지 않는다
            Err(_) => StopReason::Cancelled,
        }
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}
