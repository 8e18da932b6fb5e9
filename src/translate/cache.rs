//! Translation memo shared by every request in the process.
//!
//! Entries are keyed by the exact `(source, target, text)` triple. Growth is
//! bounded by [`CachePolicy::capacity`] (oldest insertion evicted first) and
//! optionally by a time-to-live after which an entry counts as a miss.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::CacheConfig;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source_lang: String,
    pub target_lang: String,
    pub text: String,
}

impl CacheKey {
    pub fn new(source_lang: &str, target_lang: &str, text: &str) -> Self {
        Self {
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub enabled: bool,
    pub capacity: usize,
    pub ttl: Option<Duration>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            enabled: config.enabled,
            capacity: config.capacity.max(1),
            ttl: config.ttl_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Entry {
    value: String,
    inserted_at: Instant,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<CacheKey, Entry>,
    // Insertion order, oldest first; holds each live key exactly once
    order: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

impl Inner {
    fn remove(&mut self, key: &CacheKey) {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }
}

pub struct TranslationCache {
    policy: CachePolicy,
    inner: Mutex<Inner>,
}

impl TranslationCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<String> {
        if !self.policy.enabled {
            return None;
        }

        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let expired = match inner.entries.get(key) {
            Some(entry) => self
                .policy
                .ttl
                .is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl),
            None => {
                inner.misses += 1;
                return None;
            }
        };

        if expired {
            debug!("Cache entry expired ({} -> {})", key.source_lang, key.target_lang);
            inner.remove(key);
            inner.misses += 1;
            return None;
        }

        inner.hits += 1;
        inner.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Store a translation; an existing value for the key is overwritten
    pub fn put(&self, key: CacheKey, value: String) {
        if !self.policy.enabled {
            return;
        }

        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let entry = Entry {
            value,
            inserted_at: Instant::now(),
        };

        if let Some(existing) = inner.entries.get_mut(&key) {
            *existing = entry;
            return;
        }

        while inner.entries.len() >= self.policy.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            debug!("Evicted oldest cache entry ({} -> {})", oldest.source_lang, oldest.target_lang);
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entries: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        *inner = Inner::default();
        debug!("Translation cache cleared");
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}
