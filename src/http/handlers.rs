//! HTTP request handlers
//!
//! Session, ingestion, rendering and playback endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use lexisub_lib::{
    CapturedSubtitle, OverlayFrame, PlaybackState, Platform, PlatformAdapter, SubtitleFormat,
    TranscriptView,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{Result, ServerError};
use crate::state::AppState;

/// Health check endpoint
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Version information endpoint
pub async fn version_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "online",
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Session summary
/// GET /session
pub async fn session_info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let session = &state.session;
    Json(serde_json::json!({
        "id": state.session_id,
        "started_at": state.started_at,
        "page_url": state.config.page.url,
        "platform": session.platform(),
        "state": session.state(),
        "config": session.config(),
        "segments": session.segment_count(),
        "active_segment": session.active_segment(),
        "native_subtitles_hidden": session.adapter().core().native_hidden(),
        "payloads_received": state.payloads_received(),
        "pending_updates": session.vocab().pending_len(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct IngestParams {
    /// Platform that captured the payload; defaults to the session's
    pub platform: Option<String>,
    /// Format name, or `auto` to sniff
    pub format: Option<String>,
}

/// Hand a raw subtitle payload to the session
/// POST /session/subtitles?platform=youtube&format=vtt
pub async fn ingest_subtitles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IngestParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let platform = match params.platform.as_deref() {
        Some(name) => name
            .parse::<Platform>()
            .map_err(|_| ServerError::BadRequest(format!("unknown platform {:?}", name)))?,
        None => state.session.platform(),
    };
    let format = match params.format.as_deref() {
        None | Some("auto") => None,
        Some(name) => match name.parse::<SubtitleFormat>() {
            Ok(format) => Some(format),
            Err(e) => {
                // unknown formats parse to nothing, so there is nothing to queue
                tracing::warn!("{}, ignoring {} byte payload", e, body.len());
                return Ok((
                    StatusCode::ACCEPTED,
                    Json(serde_json::json!({
                        "platform": platform,
                        "bytes": body.len(),
                        "ignored": true,
                    })),
                ));
            }
        },
    };
    let text = String::from_utf8(body.to_vec())
        .map_err(|_| ServerError::BadRequest("payload is not UTF-8".to_string()))?;

    let bytes = text.len();
    let mut captured = CapturedSubtitle::new(platform, text);
    if let Some(format) = format {
        captured = captured.with_format(format);
    }
    state.submit_subtitles(captured)?;
    tracing::debug!("Queued {} byte {} payload", bytes, platform);

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "platform": platform, "bytes": bytes })),
    ))
}

/// Current overlay frame, `null` between cues
/// GET /overlay
pub async fn overlay(State(state): State<Arc<AppState>>) -> Json<Option<OverlayFrame>> {
    Json(state.session.overlay_frame())
}

/// Transcript view
/// GET /transcript
pub async fn transcript(State(state): State<Arc<AppState>>) -> Result<Json<TranscriptView>> {
    state
        .session
        .transcript_view()
        .map(Json)
        .ok_or_else(|| {
            ServerError::NotFound(format!(
                "no transcript in {} mode",
                state.session.config().display_mode
            ))
        })
}

/// Playback position and state
/// GET /playback
pub async fn playback(State(state): State<Arc<AppState>>) -> Json<PlaybackState> {
    Json(state.session.playback())
}

/// POST /playback/play
pub async fn play(State(state): State<Arc<AppState>>) -> Json<PlaybackState> {
    state.session.adapter().play();
    Json(state.session.playback())
}

/// POST /playback/pause
pub async fn pause(State(state): State<Arc<AppState>>) -> Json<PlaybackState> {
    state.session.adapter().pause();
    Json(state.session.playback())
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub time: f64,
}

/// POST /playback/seek {"time": 12.5}
pub async fn seek(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SeekRequest>,
) -> Json<PlaybackState> {
    state.session.adapter().seek(request.time);
    Json(state.session.playback())
}

#[derive(Debug, Deserialize)]
pub struct SkipRequest {
    pub delta: f64,
}

/// POST /playback/skip {"delta": -5}
pub async fn skip(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SkipRequest>,
) -> Json<PlaybackState> {
    state.session.adapter().skip(request.delta);
    Json(state.session.playback())
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rate: f64,
}

/// POST /playback/rate {"rate": 0.75}
pub async fn set_rate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RateRequest>,
) -> Result<Json<PlaybackState>> {
    if !(request.rate.is_finite() && request.rate > 0.0) {
        return Err(ServerError::BadRequest(format!(
            "playback rate must be positive, got {}",
            request.rate
        )));
    }
    state.session.adapter().set_playback_rate(request.rate);
    Ok(Json(state.session.playback()))
}
