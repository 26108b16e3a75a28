//! 연결 간 공유 처리량 카운터.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// 읽기+쓰기 누적 바이트. 복제본은 같은 카운터를 가리킨다.
#[derive(Debug, Clone, Default)]
pub struct ThroughputCounter {
    bytes: Arc<AtomicU64>,
}

impl ThroughputCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, n: u64) {
        self.bytes.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}
