//! Vocabulary status tracking
//!
//! - Status/entry/update types and the remote wire format
//! - Durable local store (one namespaced key per language)
//! - Remote store client
//! - Cache with pending-update queue and background flush worker

pub mod cache;
pub mod remote;
pub mod store;
pub mod types;

pub use cache::{VocabCache, VocabSyncWorker};
pub use remote::{HttpVocabRemote, VocabRemote};
pub use store::{storage_key, FileVocabStore, MemoryVocabStore, VocabStore};
pub use types::{
    FlushOutcome, LookupOutcome, LookupRequest, LookupResponse, PendingUpdate, UpdateBatch,
    VocabEntry, VocabStats, VocabStatus,
};
