//! 레이트 리미터.
//!
//! 무제한 또는 토큰 버킷. 토큰 버킷은 qps를 보충 속도와 버스트 용량으로
//! 함께 쓰며, 호출자가 거부되면 다시 폴링해야 한다 (대기열 없음).

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// 요청 발행 허가
#[derive(Debug)]
pub enum RateLimiter {
    Unlimited,
    TokenBucket(TokenBucket),
}

impl RateLimiter {
    /// qps가 0이면 무제한
    pub fn from_qps(qps: u32) -> Self {
        if qps == 0 {
            RateLimiter::Unlimited
        } else {
            RateLimiter::TokenBucket(TokenBucket::new(qps))
        }
    }

    pub fn allow(&self) -> bool {
        match self {
            RateLimiter::Unlimited => true,
            RateLimiter::TokenBucket(bucket) => bucket.allow(),
        }
    }
}

#[derive(Debug)]
struct BucketState {
    /// 사용 중인 토큰 수
    debit: u64,
    last: Instant,
}

/// 토큰 버킷 (빈 상태로 시작)
#[derive(Debug)]
pub struct TokenBucket {
    qps: u32,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(qps: u32) -> Self {
        Self {
            qps,
            state: Mutex::new(BucketState {
                debit: 0,
                last: Instant::now(),
            }),
        }
    }

    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    fn allow_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock();
        let revoked = self.revoked(now.saturating_duration_since(state.last));
        state.debit = state.debit.saturating_sub(revoked);

        if state.debit < u64::from(self.qps) {
            state.debit += 1;
            state.last = now;
            return true;
        }
        false
    }

    /// 경과 시간 동안 보충되는 토큰 수
    ///
    /// 정수 초와 나노초를 나눠 계산해 부동소수 오차를 줄인다.
    fn revoked(&self, elapsed: Duration) -> u64 {
        let limit = f64::from(self.qps);
        let sec = elapsed.as_secs() as f64 * limit;
        let nsec = f64::from(elapsed.subsec_nanos()) * limit;
        (sec + nsec / 1e9) as u64
    }
}
