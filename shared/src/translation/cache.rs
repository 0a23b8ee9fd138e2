use std::{cell::RefCell, collections::HashMap, fmt::Write as _, rc::Rc};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{language::Language, storage::KeyValueStore};

/// Prefix shared by every durable translation cache key.
pub const CACHE_KEY_PREFIX: &str = "translation_cache_";

/// Lifetime of a cached translation: 365 days.
pub const CACHE_TTL_MS: i64 = 365 * 24 * 60 * 60 * 1000;

/// Stable content hash used in cache keys: the first 64 bits of SHA-256 as
/// lowercase hex.
pub fn text_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest[..8].iter().fold(String::with_capacity(16), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}

/// Durable key for `text` translated into `lang`:
/// `translation_cache_<hash>_<lang>`.
pub fn cache_key(text: &str, lang: Language) -> String {
    format!("{CACHE_KEY_PREFIX}{}_{}", text_hash(text), lang.code())
}

/// JSON value stored under a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Translated text.
    pub translation: String,
    /// Epoch milliseconds after which the entry is stale.
    pub expiry: i64,
    /// Epoch milliseconds at which the entry was written.
    pub timestamp: i64,
}

/// Source of "now" in epoch milliseconds.
pub trait Clock {
    /// Current time in epoch milliseconds.
    fn now_ms(&self) -> i64;
}

impl<F: Fn() -> i64> Clock for F {
    fn now_ms(&self) -> i64 {
        self()
    }
}

/// Wall clock. Uses `Date.now()` in the browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[derive(Debug, Clone)]
struct MemoEntry {
    translation: String,
    expiry: i64,
}

/// Two-level translation cache: a per-session memo table in front of a
/// durable [`KeyValueStore`].
///
/// Storage failures never escape: unreadable entries count as misses and
/// unwritable entries live in the memo table for the session only.
pub struct TranslationCache<S> {
    storage: S,
    memo: RefCell<HashMap<String, MemoEntry>>,
    clock: Rc<dyn Clock>,
    ttl_ms: i64,
}

impl<S: KeyValueStore> TranslationCache<S> {
    /// Cache over `storage` using the wall clock and the default TTL.
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, Rc::new(SystemClock))
    }

    /// Cache with an explicit clock.
    pub fn with_clock(storage: S, clock: Rc<dyn Clock>) -> Self {
        Self {
            storage,
            memo: RefCell::new(HashMap::new()),
            clock,
            ttl_ms: CACHE_TTL_MS,
        }
    }

    /// Override the entry lifetime.
    pub fn ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    /// Underlying durable store.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Fresh translation of `text` into `lang`, if cached.
    ///
    /// A stale durable entry is deleted on the way.
    pub fn lookup(&self, text: &str, lang: Language) -> Option<String> {
        let key = cache_key(text, lang);
        let now = self.clock.now_ms();

        let memo_hit = self.memo.borrow().get(&key).cloned();
        if let Some(entry) = memo_hit {
            if entry.expiry > now {
                return Some(entry.translation);
            }
            self.memo.borrow_mut().remove(&key);
        }

        let raw = match self.storage.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!("failed to read translation cache: {err}");
                return None;
            },
        };

        let entry = match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("dropping corrupt translation cache entry {key}: {err}");
                self.remove_durable(&key);
                return None;
            },
        };

        if entry.expiry <= now {
            self.remove_durable(&key);
            return None;
        }

        self.memo.borrow_mut().insert(key, MemoEntry {
            translation: entry.translation.clone(),
            expiry: entry.expiry,
        });
        Some(entry.translation)
    }

    /// Remember `translation` for `text` in both levels with a fresh expiry.
    pub fn store(&self, text: &str, lang: Language, translation: &str) {
        let key = cache_key(text, lang);
        let now = self.clock.now_ms();
        let entry = CacheEntry {
            translation: translation.to_string(),
            expiry: now.saturating_add(self.ttl_ms),
            timestamp: now,
        };

        self.memo.borrow_mut().insert(key.clone(), MemoEntry {
            translation: entry.translation.clone(),
            expiry: entry.expiry,
        });

        let payload = match serde_json::to_string(&entry) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!("failed to encode translation cache entry: {err}");
                return;
            },
        };
        if let Err(err) = self.storage.set(&key, &payload) {
            tracing::warn!("failed to persist translation cache entry: {err}");
        }
    }

    /// Forget every cached translation, in memory and in durable storage.
    pub fn clear(&self) {
        self.memo.borrow_mut().clear();
        let keys = match self.storage.keys() {
            Ok(keys) => keys,
            Err(err) => {
                tracing::warn!("failed to list translation cache keys: {err}");
                return;
            },
        };
        for key in keys.iter().filter(|key| key.starts_with(CACHE_KEY_PREFIX)) {
            self.remove_durable(key);
        }
    }

    fn remove_durable(&self, key: &str) {
        if let Err(err) = self.storage.remove(key) {
            tracing::warn!("failed to remove translation cache entry {key}: {err}");
        }
    }
}
