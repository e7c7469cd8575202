use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use analysis::WrappedResult;
use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::Mutex;

/// `owner/repo/year`.
pub fn cache_key(owner: &str, repo: &str, year: i32) -> String {
    format!("{owner}/{repo}/{year}")
}

#[async_trait]
pub trait WrappedCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Arc<WrappedResult>>;
    async fn put(&self, key: String, value: Arc<WrappedResult>);
}

#[derive(Clone, Debug)]
struct CachedWrapped {
    value: Arc<WrappedResult>,
    stored_at: Instant,
}

impl CachedWrapped {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// In-process LRU with a fixed time-to-live per entry.
#[derive(Clone)]
pub struct LruWrappedCache {
    inner: Arc<Mutex<LruCache<String, CachedWrapped>>>,
    ttl: Duration,
}

impl LruWrappedCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
            ttl,
        }
    }
}

#[async_trait]
impl WrappedCache for LruWrappedCache {
    async fn get(&self, key: &str) -> Option<Arc<WrappedResult>> {
        let mut guard = self.inner.lock().await;
        let entry = guard.get(key)?.clone();
        if entry.is_fresh(self.ttl) {
            Some(entry.value)
        } else {
            guard.pop(key);
            None
        }
    }

    async fn put(&self, key: String, value: Arc<WrappedResult>) {
        let mut guard = self.inner.lock().await;
        guard.put(
            key,
            CachedWrapped {
                value,
                stored_at: Instant::now(),
            },
        );
    }
}
