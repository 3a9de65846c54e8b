//! Overlay and transcript rendering
//!
//! Renderers are [`SyncListener`]s: they rebuild their view only when the
//! sync loop reports a change, and hold the latest view for the
//! presentation layer to read.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::sync::{ActiveChange, SyncListener};
use crate::tokenizer::{color_for, tokenize, Token, TokenKind};
use crate::types::Segment;
use crate::vocab::{VocabCache, VocabStatus};

/// One token as displayed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedToken {
    pub kind: TokenKind,
    pub text: String,
    /// Cache key, words only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<VocabStatus>,
    /// `#rrggbb`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// The active segment laid out as tokens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayFrame {
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    pub tokens: Vec<RenderedToken>,
}

/// Full transcript with the active position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TranscriptView {
    pub segments: Vec<Segment>,
    pub active_index: Option<usize>,
}

/// Renders the active segment with per-word status colours.
pub struct OverlayRenderer {
    vocab: Arc<VocabCache>,
    show_word_status: bool,
    active: Mutex<Option<Segment>>,
    frame: Mutex<Option<OverlayFrame>>,
    renders: AtomicU64,
}

impl OverlayRenderer {
    pub fn new(vocab: Arc<VocabCache>, show_word_status: bool) -> Self {
        Self {
            vocab,
            show_word_status,
            active: Mutex::new(None),
            frame: Mutex::new(None),
            renders: AtomicU64::new(0),
        }
    }

    /// Latest frame; `None` while no segment is active.
    pub fn frame(&self) -> Option<OverlayFrame> {
        self.frame.lock().clone()
    }

    /// How many times a frame was rebuilt
    pub fn render_count(&self) -> u64 {
        self.renders.load(Ordering::Relaxed)
    }

    /// Rebuild the current frame, e.g. after a word status changed.
    pub fn refresh(&self) {
        let active = self.active.lock().clone();
        self.render(active.as_ref());
    }

    fn render(&self, segment: Option<&Segment>) {
        let frame = segment.map(|segment| OverlayFrame {
            start_time: segment.start_time,
            end_time: segment.end_time,
            text: segment.text.clone(),
            tokens: tokenize(&segment.text)
                .into_iter()
                .map(|token| self.render_token(token))
                .collect(),
        });
        *self.frame.lock() = frame;
        self.renders.fetch_add(1, Ordering::Relaxed);
    }

    fn render_token(&self, token: Token) -> RenderedToken {
        if !token.is_word() {
            return RenderedToken {
                kind: token.kind,
                text: token.display,
                word: None,
                status: None,
                color: None,
            };
        }
        let (status, color) = if self.show_word_status {
            let status = self.vocab.get_status(&token.normalized);
            (Some(status), Some(color_for(status).to_string()))
        } else {
            (None, None)
        };
        RenderedToken {
            kind: token.kind,
            text: token.display,
            word: Some(token.normalized),
            status,
            color,
        }
    }
}

impl SyncListener for OverlayRenderer {
    fn active_changed(&self, change: &ActiveChange) {
        *self.active.lock() = change.segment.clone();
        self.render(change.segment.as_ref());
    }
}

/// Keeps the whole subtitle set and marks the active segment.
#[derive(Default)]
pub struct TranscriptRenderer {
    view: Mutex<TranscriptView>,
}

impl TranscriptRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> TranscriptView {
        self.view.lock().clone()
    }
}

impl SyncListener for TranscriptRenderer {
    fn segments_replaced(&self, segments: &[Segment], active: Option<usize>) {
        let mut view = self.view.lock();
        view.segments = segments.to_vec();
        view.active_index = active;
    }

    fn active_changed(&self, change: &ActiveChange) {
        self.view.lock().active_index = change.index;
    }
}
