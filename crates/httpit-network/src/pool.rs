//! 재사용 객체 풀.
//!
//! 비어 있으면 팩토리로 새로 만들고, 반환은 `Pooled` drop 시 자동으로 된다.
//! 풀 고갈은 없다 (필요한 만큼 늘어난다).

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// 동시 acquire/release가 안전한 객체 풀
pub struct Pool<T> {
    items: Mutex<Vec<T>>,
    factory: Factory<T>,
}

impl<T: Send> Pool<T> {
    pub fn new(factory: impl Fn() -> T + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            items: Mutex::new(Vec::new()),
            factory: Box::new(factory),
        })
    }

    /// 풀에서 꺼내거나 새로 생성
    pub fn get(self: &Arc<Self>) -> Pooled<T> {
        let item = self.items.lock().pop().unwrap_or_else(|| (self.factory)());
        Pooled {
            item: Some(item),
            pool: Arc::clone(self),
        }
    }

    /// 대기 중인 객체 수
    pub fn idle(&self) -> usize {
        self.items.lock().len()
    }

    fn put(&self, item: T) {
        self.items.lock().push(item);
    }
}

/// 풀에서 빌린 객체. drop 시 풀로 돌아간다.
pub struct Pooled<T: Send> {
    item: Option<T>,
    pool: Arc<Pool<T>>,
}

impl<T: Send> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // drop 전까지 항상 Some
        self.item.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<T: Send> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<T: Send> Drop for Pooled<T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.put(item);
        }
    }
}
