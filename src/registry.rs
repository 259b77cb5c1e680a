//! The mock registry.
//!
//! Owns the mapping from registry key (full normalized URL or bare pathname)
//! to [`MockEntry`], plus the matcher and request counters.

use crate::config::Settings;
use crate::entry::MockEntry;
use crate::matcher::{MatchResult, Matcher};
use crate::url::UrlParts;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// A stored entry tagged with the generation it was written in.
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) entry: MockEntry,
    pub(crate) generation: u64,
}

/// Counters for requests seen by the transport adapters.
#[derive(Debug, Default)]
pub struct RequestStats {
    total: AtomicU64,
    mocked: AtomicU64,
    passed_through: AtomicU64,
}

/// Point-in-time copy of [`RequestStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total: u64,
    pub mocked: u64,
    pub passed_through: u64,
}

impl RequestStats {
    pub(crate) fn record_mocked(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.mocked.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_passthrough(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.passed_through.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            mocked: self.mocked.load(Ordering::Relaxed),
            passed_through: self.passed_through.load(Ordering::Relaxed),
        }
    }
}

/// In-memory store of mock entries.
///
/// Each registry is an independent mock scope; share it behind an `Arc`
/// between the transport adapters that consult it.
#[derive(Debug)]
pub struct MockRegistry {
    mocks: RwLock<HashMap<String, Slot>>,
    matcher: Matcher,
    settings: Settings,
    generation: AtomicU64,
    stats: RequestStats,
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

/// Registry key for `url` under the given matching mode.
pub fn registry_key(url: &str, use_pathname_for_all_queries: bool) -> String {
    let parts = UrlParts::parse(url);
    if use_pathname_for_all_queries {
        parts.pathname_key()
    } else {
        parts.full_url
    }
}

impl MockRegistry {
    /// Create an empty registry.
    pub fn new(settings: Settings) -> Self {
        Self {
            mocks: RwLock::new(HashMap::new()),
            matcher: Matcher::new(settings.page_origin.clone()),
            settings,
            generation: AtomicU64::new(0),
            stats: RequestStats::default(),
        }
    }

    /// Registry settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Request counters.
    pub fn stats(&self) -> &RequestStats {
        &self.stats
    }

    fn slot(&self, entry: MockEntry) -> Slot {
        Slot {
            entry,
            generation: self.generation.fetch_add(1, Ordering::Relaxed) + 1,
        }
    }

    fn install(&self, new_mocks: HashMap<String, Slot>, overwrite_previous: bool) {
        let mut mocks = self.mocks.write();
        if overwrite_previous {
            *mocks = new_mocks;
        } else {
            mocks.extend(new_mocks);
        }
        debug!(mocks = mocks.len(), overwrite_previous, "Registry configured");
    }

    /// Load `{url: response}` pairs as static entries.
    ///
    /// With `overwrite_previous = false` the pairs are merged into the
    /// existing registry, new keys winning on conflict.
    pub fn configure<I, K>(&self, responses: I, overwrite_previous: bool)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let new_mocks = responses
            .into_iter()
            .map(|(url, response)| {
                (
                    registry_key(url.as_ref(), false),
                    self.slot(MockEntry::new(response)),
                )
            })
            .collect();
        self.install(new_mocks, overwrite_previous);
    }

    /// Load full entries, keyed by pathname when the entry opts into it.
    pub fn configure_dynamic_responses<I, K>(&self, entries: I, overwrite_previous: bool)
    where
        I: IntoIterator<Item = (K, MockEntry)>,
        K: AsRef<str>,
    {
        let new_mocks = entries
            .into_iter()
            .map(|(url, entry)| {
                (
                    registry_key(url.as_ref(), entry.use_pathname_for_all_queries),
                    self.slot(entry),
                )
            })
            .collect();
        self.install(new_mocks, overwrite_previous);
    }

    /// Mock `url` with a static response.
    pub fn set_mock_url_response(&self, url: &str, response: Value) {
        self.set_dynamic_mock_url_response(url, MockEntry::new(response));
    }

    /// Mock `url` with a full entry.
    pub fn set_dynamic_mock_url_response(&self, url: &str, entry: MockEntry) {
        let key = registry_key(url, entry.use_pathname_for_all_queries);
        debug!(key = %key, dynamic = entry.is_dynamic(), "Setting mock");
        let slot = self.slot(entry);
        self.mocks.write().insert(key, slot);
    }

    /// Find the registry key governing `url`.
    pub fn find_match(&self, url: &str) -> Option<MatchResult> {
        let mocks = self.mocks.read();
        self.matcher.find_match(url, |key| {
            mocks.get(key).map(|slot| slot.entry.use_pathname_for_all_queries)
        })
    }

    /// Whether requests to `url` are mocked.
    pub fn is_mocked(&self, url: &str) -> bool {
        self.find_match(url).is_some()
    }

    /// The stored response for `url`; `None` when `url` is not mocked.
    pub fn get_response(&self, url: &str) -> Option<Value> {
        self.entry(url).map(|entry| entry.response)
    }

    /// A copy of the entry governing `url`.
    pub fn entry(&self, url: &str) -> Option<MockEntry> {
        self.lookup(url).map(|(_, slot)| slot.entry)
    }

    pub(crate) fn lookup(&self, url: &str) -> Option<(MatchResult, Slot)> {
        let mocks = self.mocks.read();
        let result = self.matcher.find_match(url, |key| {
            mocks.get(key).map(|slot| slot.entry.use_pathname_for_all_queries)
        })?;
        let slot = mocks.get(&result.key)?.clone();
        Some((result, slot))
    }

    /// Persist a dynamically computed response.
    ///
    /// Dropped when the entry was replaced or removed after `generation`
    /// was read. Returns whether the value was stored.
    pub(crate) fn store_response(&self, key: &str, generation: u64, response: Value) -> bool {
        let mut mocks = self.mocks.write();
        match mocks.get_mut(key) {
            Some(slot) if slot.generation == generation => {
                slot.entry.response = response;
                true
            }
            _ => {
                debug!(key = %key, "Entry changed during dynamic update, dropping result");
                false
            }
        }
    }

    /// Remove the entry governing `url`. Returns whether one was removed.
    pub fn delete_mock_url_response(&self, url: &str) -> bool {
        let mut mocks = self.mocks.write();
        let result = self.matcher.find_match(url, |key| {
            mocks.get(key).map(|slot| slot.entry.use_pathname_for_all_queries)
        });
        match result {
            Some(result) => mocks.remove(&result.key).is_some(),
            None => false,
        }
    }

    /// Remove every entry.
    pub fn clear_all_mocks(&self) {
        self.mocks.write().clear();
        debug!("All mocks cleared");
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.mocks.read().len()
    }

    /// Whether no keys are registered.
    pub fn is_empty(&self) -> bool {
        self.mocks.read().is_empty()
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.mocks.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}
