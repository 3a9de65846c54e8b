//! Vocabulary status cache and remote sync
//!
//! The local cache is authoritative for reads. Every edit is written to the
//! cache, persisted to the local store and queued for the remote store
//! before `update_status` returns. Queued edits leave the queue only after
//! the remote confirmed the batch that carried them.

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::config::VocabConfig;
use crate::error::{LexisubError, Result};
use crate::tokenizer::normalize_word;

use super::remote::{HttpVocabRemote, VocabRemote};
use super::store::{FileVocabStore, VocabStore};
use super::types::{
    FlushOutcome, LookupOutcome, LookupRequest, PendingUpdate, UpdateBatch, VocabEntry,
    VocabStats, VocabStatus,
};

/// Word status cache for one target language
pub struct VocabCache {
    language: String,
    /// Cached entries (normalized word -> entry)
    entries: DashMap<String, VocabEntry>,
    /// Edits not yet confirmed by the remote, oldest first
    pending: Mutex<Vec<PendingUpdate>>,
    /// Serializes writers so persisted snapshots land in edit order
    write_lock: Mutex<()>,
    /// Held for the duration of one flush
    flush_lock: tokio::sync::Mutex<()>,
    /// Wakes the sync worker for an immediate flush
    flush_signal: Notify,
    store: Arc<dyn VocabStore>,
    remote: Option<Arc<dyn VocabRemote>>,
    /// Request a flush after every edit instead of waiting for the interval
    immediate_flush: bool,
}

impl VocabCache {
    /// Open the cache for `language`, loading the local store first.
    ///
    /// A store that cannot be read leaves the cache empty; the session stays
    /// usable offline either way.
    pub fn open(
        language: &str,
        store: Arc<dyn VocabStore>,
        remote: Option<Arc<dyn VocabRemote>>,
    ) -> Self {
        let entries = DashMap::new();
        match store.load(language) {
            Ok(loaded) => {
                tracing::info!("Loaded {} vocabulary entries for {}", loaded.len(), language);
                for (word, entry) in loaded {
                    entries.insert(word, entry);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to load vocabulary for {}: {}", language, e);
            }
        }

        Self {
            language: language.to_string(),
            entries,
            pending: Mutex::new(Vec::new()),
            write_lock: Mutex::new(()),
            flush_lock: tokio::sync::Mutex::new(()),
            flush_signal: Notify::new(),
            immediate_flush: remote.is_some(),
            store,
            remote,
        }
    }

    /// Whether each edit requests a flush right away. Without a remote
    /// nothing is ever flushed.
    pub fn with_immediate_flush(mut self, enabled: bool) -> Self {
        self.immediate_flush = enabled && self.remote.is_some();
        self
    }

    /// Open the cache with a file store under `config.storage_dir` and,
    /// when `config.remote_url` is set, an HTTP remote. Edits are flushed
    /// immediately only when an auth token identifies the learner; otherwise
    /// the periodic worker carries them.
    pub fn from_config(language: &str, config: &VocabConfig) -> Result<Self> {
        let store: Arc<dyn VocabStore> = Arc::new(FileVocabStore::new(&config.storage_dir));
        let remote = match &config.remote_url {
            Some(url) => {
                if !config.has_identity() {
                    tracing::warn!("No auth token for vocabulary remote {}", url);
                }
                let remote = HttpVocabRemote::new(
                    url,
                    config.auth_token.clone(),
                    config.request_timeout(),
                )?;
                Some(Arc::new(remote) as Arc<dyn VocabRemote>)
            }
            None => None,
        };
        Ok(Self::open(language, store, remote).with_immediate_flush(config.has_identity()))
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Whether edits are pushed to a remote store.
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn flushes_immediately(&self) -> bool {
        self.immediate_flush
    }

    /// Status of a word; `Unknown` when it has never been edited.
    pub fn get_status(&self, word: &str) -> VocabStatus {
        self.entries
            .get(&normalize_word(word))
            .map(|e| e.status)
            .unwrap_or_default()
    }

    /// Full entry for a word, if cached.
    pub fn get_entry(&self, word: &str) -> Option<VocabEntry> {
        self.entries.get(&normalize_word(word)).map(|e| e.clone())
    }

    /// Record a new status for a word.
    ///
    /// The cache is updated and the whole map persisted before returning, so
    /// a following `get_status` observes the edit. The edit is queued for the
    /// remote. When the cache flushes immediately a flush is requested too.
    /// A persistence failure is returned, but the cached and queued edit stand.
    pub fn update_status(&self, word: &str, status: VocabStatus) -> Result<VocabEntry> {
        let key = normalize_word(word);
        if key.is_empty() {
            return Err(LexisubError::InvalidWord(word.to_string()));
        }

        let update = PendingUpdate {
            word: key.clone(),
            status,
            timestamp: Utc::now(),
        };
        let entry = VocabEntry::from(&update);

        let persisted = {
            let _guard = self.write_lock.lock();
            self.entries.insert(key, entry.clone());
            self.pending.lock().push(update);
            self.store.save(&self.language, &self.snapshot())
        };

        if self.immediate_flush {
            self.flush_signal.notify_one();
        }

        match persisted {
            Ok(()) => {
                tracing::debug!("Set {} -> {}", entry.word, entry.status);
                Ok(entry)
            }
            Err(e) => {
                tracing::warn!("Failed to persist vocabulary for {}: {}", self.language, e);
                Err(e)
            }
        }
    }

    /// Copy of the cached map.
    pub fn snapshot(&self) -> HashMap<String, VocabEntry> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Copy of the pending queue, oldest first.
    pub fn pending(&self) -> Vec<PendingUpdate> {
        self.pending.lock().clone()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Send every pending update to the remote in one batch.
    ///
    /// The queue is snapshotted before sending. On success exactly the
    /// snapshotted updates are removed; updates queued during the request
    /// stay. On failure the queue is untouched and the next trigger resends
    /// the same batch.
    pub async fn flush(&self) -> Result<FlushOutcome> {
        let remote = match &self.remote {
            Some(remote) => remote,
            None => return Ok(FlushOutcome::NoRemote),
        };

        let in_flight = match self.flush_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => return Ok(FlushOutcome::InFlight),
        };

        let updates = self.pending();
        if updates.is_empty() {
            return Ok(FlushOutcome::Empty);
        }
        let sent = updates.len();
        let batch = UpdateBatch {
            updates,
            language: self.language.clone(),
        };

        match remote.push_updates(&batch).await {
            Ok(()) => {
                // Only flush removes from the queue and flushes never overlap,
                // so the first `sent` items are the batch we just sent.
                let (n, remaining) = {
                    let mut pending = self.pending.lock();
                    let n = sent.min(pending.len());
                    pending.drain(..n);
                    (n, pending.len())
                };
                drop(in_flight);
                tracing::info!(
                    "Flushed {} vocabulary update(s) for {}, {} still pending",
                    n,
                    self.language,
                    remaining
                );
                // edits made during the request were turned away as in flight
                if remaining > 0 && self.immediate_flush {
                    self.flush_signal.notify_one();
                }
                Ok(FlushOutcome::Flushed(n))
            }
            Err(e) => {
                tracing::warn!(
                    "Vocabulary flush of {} update(s) failed, will retry: {}",
                    sent,
                    e
                );
                Err(e)
            }
        }
    }

    /// Ask the remote about a set of words.
    pub async fn lookup_remote(&self, words: &[String]) -> LookupOutcome {
        let remote = match &self.remote {
            Some(remote) => remote,
            None => return LookupOutcome::Unavailable,
        };
        let request = LookupRequest {
            words: words.to_vec(),
            language: self.language.clone(),
        };
        match remote.lookup(&request).await {
            Ok(response) => LookupOutcome::Available(response.entries),
            Err(e) => {
                tracing::debug!("Vocabulary lookup unavailable: {}", e);
                LookupOutcome::Unavailable
            }
        }
    }

    /// Fill in entries for words that have no local entry yet.
    ///
    /// Words already cached are neither requested nor overwritten. Returns
    /// the number of entries added, or `None` when the remote could not be
    /// reached.
    pub async fn hydrate_missing(&self, words: &[String]) -> Option<usize> {
        let missing: Vec<String> = words
            .iter()
            .map(|w| normalize_word(w))
            .filter(|w| !w.is_empty() && !self.entries.contains_key(w))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if missing.is_empty() {
            return Some(0);
        }

        let found = match self.lookup_remote(&missing).await {
            LookupOutcome::Available(found) => found,
            LookupOutcome::Unavailable => return None,
        };

        let _guard = self.write_lock.lock();
        let mut added = 0;
        for word in &missing {
            if let Some(entry) = found.get(word) {
                // A local edit made while the lookup was in flight wins.
                if !self.entries.contains_key(word) {
                    self.entries.insert(word.clone(), entry.clone());
                    added += 1;
                }
            }
        }
        if added > 0 {
            if let Err(e) = self.store.save(&self.language, &self.snapshot()) {
                tracing::warn!("Failed to persist hydrated vocabulary: {}", e);
            }
        }
        Some(added)
    }

    /// Word counts per status.
    pub fn stats(&self) -> VocabStats {
        let mut counts: HashMap<VocabStatus, usize> =
            VocabStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for entry in self.entries.iter() {
            *counts.entry(entry.value().status).or_insert(0) += 1;
        }
        VocabStats {
            total: self.entries.len(),
            counts,
            pending: self.pending_len(),
        }
    }
}

/// Background trigger for [`VocabCache::flush`].
///
/// Flushes on a fixed interval for the lifetime of the session, and right
/// away whenever an edit requests it. Each flush runs as its own task, so
/// stopping the worker lets an in-flight flush finish on its own.
pub struct VocabSyncWorker {
    handle: JoinHandle<()>,
}

impl VocabSyncWorker {
    pub fn spawn(cache: Arc<VocabCache>, interval: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // First tick completes immediately; the local load already happened.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = cache.flush_signal.notified() => {}
                }
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    if let Err(e) = cache.flush().await {
                        tracing::debug!("Background flush failed: {}", e);
                    }
                });
            }
        });
        Self { handle }
    }

    /// Stop triggering flushes.
    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for VocabSyncWorker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
