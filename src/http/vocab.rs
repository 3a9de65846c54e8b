//! Vocabulary endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use lexisub_lib::tokenizer::normalize_word;
use lexisub_lib::vocab::FlushOutcome;
use lexisub_lib::{LexisubError, VocabEntry, VocabStats, VocabStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordStatus {
    pub word: String,
    pub status: VocabStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// Per-status counts
/// GET /vocab
pub async fn vocab_stats(State(state): State<Arc<AppState>>) -> Json<VocabStats> {
    Json(state.session.vocab().stats())
}

/// Status of one word; `unknown` when never edited
/// GET /vocab/{word}
pub async fn get_word(
    State(state): State<Arc<AppState>>,
    Path(word): Path<String>,
) -> Result<Json<WordStatus>> {
    let key = normalize_word(&word);
    if key.is_empty() {
        return Err(LexisubError::InvalidWord(word).into());
    }
    let vocab = state.session.vocab();
    Ok(Json(WordStatus {
        status: vocab.get_status(&key),
        updated_at: vocab.get_entry(&key).map(|e| e.updated_at),
        word: key,
    }))
}

/// Set a word's status
/// PUT /vocab/{word} {"status": "known"}
pub async fn put_word(
    State(state): State<Arc<AppState>>,
    Path(word): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<VocabEntry>> {
    let status: VocabStatus = update.status.parse()?;
    let entry = state.session.update_word_status(&word, status)?;
    Ok(Json(entry))
}

/// Push pending updates now
/// POST /vocab/flush
pub async fn flush(State(state): State<Arc<AppState>>) -> Result<Json<FlushOutcome>> {
    let outcome = state.session.vocab().flush().await?;
    Ok(Json(outcome))
}
