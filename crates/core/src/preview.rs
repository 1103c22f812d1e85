//! Revocable preview handles over a file's encoded bytes.

use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const SCHEME: &str = "preview://";

#[derive(Default)]
struct Inner {
    next: u64,
    live: HashMap<u64, Bytes>,
}

/// Issues preview handles and resolves them while they are live.
#[derive(Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<Mutex<Inner>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, bytes: Bytes) -> PreviewHandle {
        let mut inner = lock(&self.inner);
        inner.next += 1;
        let id = inner.next;
        inner.live.insert(id, bytes);
        PreviewHandle {
            id,
            registry: Some(Arc::clone(&self.inner)),
        }
    }

    /// Bytes behind a `preview://` url, if the handle has not been released.
    pub fn resolve(&self, url: &str) -> Option<Bytes> {
        let id: u64 = url.strip_prefix(SCHEME)?.parse().ok()?;
        lock(&self.inner).live.get(&id).cloned()
    }

    pub fn live_count(&self) -> usize {
        lock(&self.inner).live.len()
    }
}

impl fmt::Debug for PreviewRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewRegistry")
            .field("live", &self.live_count())
            .finish()
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Owned by exactly one record. Released explicitly on removal, or on drop.
pub struct PreviewHandle {
    id: u64,
    registry: Option<Arc<Mutex<Inner>>>,
}

impl PreviewHandle {
    pub fn url(&self) -> String {
        format!("{SCHEME}{}", self.id)
    }

    pub fn release(mut self) {
        self.revoke();
    }

    fn revoke(&mut self) {
        if let Some(registry) = self.registry.take() {
            lock(&registry).live.remove(&self.id);
            debug!(preview = self.id, "preview released");
        }
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.revoke();
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PreviewHandle").field(&self.url()).finish()
    }
}
