use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::LexisubError;

/// Learner progress label attached to a word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VocabStatus {
    New,
    #[default]
    Unknown,
    Recognised,
    Familiar,
    Known,
}

impl VocabStatus {
    pub const ALL: [VocabStatus; 5] = [
        VocabStatus::New,
        VocabStatus::Unknown,
        VocabStatus::Recognised,
        VocabStatus::Familiar,
        VocabStatus::Known,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            VocabStatus::New => "new",
            VocabStatus::Unknown => "unknown",
            VocabStatus::Recognised => "recognised",
            VocabStatus::Familiar => "familiar",
            VocabStatus::Known => "known",
        }
    }
}

impl fmt::Display for VocabStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VocabStatus {
    type Err = LexisubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(VocabStatus::New),
            "unknown" => Ok(VocabStatus::Unknown),
            "recognised" | "recognized" => Ok(VocabStatus::Recognised),
            "familiar" => Ok(VocabStatus::Familiar),
            "known" => Ok(VocabStatus::Known),
            _ => Err(LexisubError::UnknownStatus(s.to_string())),
        }
    }
}

/// Cached status of one normalized word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabEntry {
    pub word: String,
    pub status: VocabStatus,
    pub updated_at: DateTime<Utc>,
}

/// A local edit waiting to reach the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingUpdate {
    pub word: String,
    pub status: VocabStatus,
    pub timestamp: DateTime<Utc>,
}

impl From<&PendingUpdate> for VocabEntry {
    fn from(update: &PendingUpdate) -> Self {
        VocabEntry {
            word: update.word.clone(),
            status: update.status,
            updated_at: update.timestamp,
        }
    }
}

/// Body of the batched update endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBatch {
    pub updates: Vec<PendingUpdate>,
    pub language: String,
}

/// Body of the batched lookup endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupRequest {
    pub words: Vec<String>,
    pub language: String,
}

/// Response of the batched lookup endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub entries: HashMap<String, VocabEntry>,
}

/// Result of a remote lookup as seen by the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Available(HashMap<String, VocabEntry>),
    /// The remote store could not be reached; callers show nothing extra.
    Unavailable,
}

/// What a flush attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "count", rename_all = "snake_case")]
pub enum FlushOutcome {
    /// The batch of this many updates was confirmed by the remote
    Flushed(usize),
    /// Nothing was pending
    Empty,
    /// Another flush is still running; its batch covers this trigger
    InFlight,
    /// No remote store is configured for this session
    NoRemote,
}

/// Per-status word counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VocabStats {
    pub counts: HashMap<VocabStatus, usize>,
    pub total: usize,
    pub pending: usize,
}
