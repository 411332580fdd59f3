//! Result cache keyed by a semantic fingerprint of the work requested.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tracing::debug;

use opq_core::{OperationInput, OperationKind, OperationResult};

/// Deterministic cache key for (kind, input, context).
///
/// Content is hashed rather than stored, so key size is fixed regardless of
/// input size. Presence of the optional context is encoded explicitly:
/// `None` and `Some(null)` must produce different keys.
pub fn fingerprint(kind: OperationKind, input: &OperationInput) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(input.text.as_bytes());
    hasher.update([0u8]);
    match &input.context {
        Some(context) => {
            hasher.update(b"context:");
            hasher.update(context.to_string().as_bytes());
        }
        None => hasher.update(b"no-context"),
    }
    hex::encode(hasher.finalize())
}

struct CacheEntry {
    result: OperationResult,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    /// Logically absent once `now > created_at + ttl`, even while still in
    /// the map.
    fn is_expired_at(&self, now: Instant) -> bool {
        now > self.created_at + self.ttl
    }

    fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}

pub struct ResultCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    high_water: usize,
}

impl ResultCache {
    pub fn new(high_water: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            high_water,
        }
    }

    /// Look up a live entry. Expired entries are evicted here rather than
    /// waiting for the sweep.
    pub fn get(&self, key: &str) -> Option<OperationResult> {
        let expired = {
            let entries = self.entries.read().unwrap();
            match entries.get(key) {
                Some(entry) if !entry.is_expired() => return Some(entry.result.clone()),
                Some(_) => true,
                None => false,
            }
        };
        if expired {
            self.entries.write().unwrap().remove(key);
            debug!("evicted expired cache entry {key}");
        }
        None
    }

    pub fn put(&self, key: String, result: OperationResult, ttl: Duration) {
        let mut entries = self.entries.write().unwrap();
        entries.insert(
            key,
            CacheEntry {
                result,
                created_at: Instant::now(),
                ttl,
            },
        );
        if entries.len() > self.high_water {
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired());
            debug!("cache sweep evicted {} entries", before - entries.len());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
