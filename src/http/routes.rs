//! Axum router configuration

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use super::handlers::{
    health_check, ingest_subtitles, overlay, pause, play, playback, seek, session_info, set_rate,
    skip, transcript, version_check,
};
use super::vocab::{flush, get_word, put_word, vocab_stats};

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        // Health and version endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        // Session and subtitle ingestion
        .route("/session", get(session_info))
        .route("/session/subtitles", post(ingest_subtitles))
        // Rendered views
        .route("/overlay", get(overlay))
        .route("/transcript", get(transcript))
        // Playback surface
        .route("/playback", get(playback))
        .route("/playback/play", post(play))
        .route("/playback/pause", post(pause))
        .route("/playback/seek", post(seek))
        .route("/playback/skip", post(skip))
        .route("/playback/rate", post(set_rate))
        // Vocabulary
        .route("/vocab", get(vocab_stats))
        .route("/vocab/flush", post(flush))
        .route("/vocab/{word}", get(get_word).put(put_word))
        // Middleware
        .layer(DefaultBodyLimit::max(state.config.max_payload_bytes()))
        .layer(TraceLayer::new_for_http());

    let router = if state.config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::ORIGIN])
            .max_age(Duration::from_secs(3600));
        router.layer(cors)
    } else {
        router
    };

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use lexisub_lib::DisplayMode;
    use tower::util::ServiceExt;

    const VTT: &str = "WEBVTT\n\n00:00:00.000 --> 00:00:05.000\nThe <i>quick</i> fox\n\n\
                       00:00:05.500 --> 00:00:09.000\njumps over\n";

    async fn test_state(mode: DisplayMode) -> (Arc<AppState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::default();
        config.vocab.storage_dir = dir.path().to_path_buf();
        config.session.display_mode = mode;
        config.engine.sync_interval_ms = 10;
        let state = Arc::new(AppState::start(config).await.unwrap());
        (state, dir)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_req(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn ingest_req(query: &str, payload: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(format!("/session/subtitles{}", query))
            .body(Body::from(payload.to_string()))
            .unwrap()
    }

    /// Poll until the session has taken in `count` segments.
    async fn wait_for_segments(app: &Router, count: u64) -> serde_json::Value {
        for _ in 0..200 {
            let (_, info) = send(app, get_req("/session")).await;
            if info["segments"] == count {
                return info;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session never reached {} segments", count);
    }

    #[tokio::test]
    async fn test_health_and_version() {
        let (state, _dir) = test_state(DisplayMode::Overlay).await;
        let app = create_router(state);

        let response = app.clone().oneshot(get_req("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, version) = send(&app, get_req("/version")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_ingest_drives_overlay() {
        let (state, _dir) = test_state(DisplayMode::Overlay).await;
        let app = create_router(state);

        let (status, accepted) = send(&app, ingest_req("?format=vtt", VTT)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(accepted["platform"], "youtube");

        let info = wait_for_segments(&app, 2).await;
        assert_eq!(info["state"], "active");
        assert_eq!(info["native_subtitles_hidden"], true);

        let mut frame = serde_json::Value::Null;
        for _ in 0..200 {
            frame = send(&app, get_req("/overlay")).await.1;
            if !frame.is_null() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(frame["text"], "The quick fox");
        assert_eq!(frame["tokens"][2]["word"], "quick");
        assert_eq!(frame["tokens"][2]["status"], "unknown");
    }

    #[tokio::test]
    async fn test_ingest_rejects_unknown_platform() {
        let (state, _dir) = test_state(DisplayMode::Overlay).await;
        let app = create_router(state);

        let (status, _) = send(&app, ingest_req("?platform=vimeo", VTT)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_format_is_empty_input() {
        let (state, _dir) = test_state(DisplayMode::Overlay).await;
        let app = create_router(state);

        let (status, accepted) = send(&app, ingest_req("?format=ass", VTT)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(accepted["ignored"], true);

        let (_, info) = send(&app, get_req("/session")).await;
        assert_eq!(info["payloads_received"], 0);
        assert_eq!(info["segments"], 0);
        assert_eq!(info["state"], "active");
    }

    #[tokio::test]
    async fn test_foreign_platform_payload_is_ignored() {
        let (state, _dir) = test_state(DisplayMode::Overlay).await;
        let app = create_router(state);

        let (status, _) = send(&app, ingest_req("?platform=netflix&format=auto", VTT)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let (status, _) = send(&app, ingest_req("", VTT)).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let info = wait_for_segments(&app, 2).await;
        assert_eq!(info["payloads_received"], 2);
    }

    #[tokio::test]
    async fn test_transcript_mode() {
        let (state, _dir) = test_state(DisplayMode::Transcript).await;
        let app = create_router(state);

        let (status, _) = send(&app, ingest_req("", VTT)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        wait_for_segments(&app, 2).await;

        let (status, view) = send(&app, get_req("/transcript")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["segments"].as_array().unwrap().len(), 2);
        assert_eq!(view["segments"][1]["text"], "jumps over");

        let (_, frame) = send(&app, get_req("/overlay")).await;
        assert!(frame.is_null());
    }

    #[tokio::test]
    async fn test_transcript_missing_in_overlay_mode() {
        let (state, _dir) = test_state(DisplayMode::Overlay).await;
        let app = create_router(state);
        let (status, _) = send(&app, get_req("/transcript")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_playback_controls() {
        let (state, _dir) = test_state(DisplayMode::Overlay).await;
        let app = create_router(state);

        let (status, playback) =
            send(&app, json_req(Method::POST, "/playback/seek", serde_json::json!({"time": 42.0})))
                .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(playback["current_time"], 42.0);
        assert_eq!(playback["paused"], true);

        let (_, playback) =
            send(&app, json_req(Method::POST, "/playback/skip", serde_json::json!({"delta": -50})))
                .await;
        assert_eq!(playback["current_time"], 0.0);

        let (_, playback) =
            send(&app, json_req(Method::POST, "/playback/rate", serde_json::json!({"rate": 1.5})))
                .await;
        assert_eq!(playback["playback_rate"], 1.5);

        let (status, _) =
            send(&app, json_req(Method::POST, "/playback/rate", serde_json::json!({"rate": 0})))
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/playback/play")
            .body(Body::empty())
            .unwrap();
        let (_, playback) = send(&app, request).await;
        assert_eq!(playback["paused"], false);

        let (_, playback) = send(&app, get_req("/playback")).await;
        assert_eq!(playback["ready"], true);
        assert_eq!(playback["duration"], 600.0);
    }

    #[tokio::test]
    async fn test_vocab_endpoints() {
        let (state, dir) = test_state(DisplayMode::Overlay).await;
        let app = create_router(state);

        let (status, word) = send(&app, get_req("/vocab/Fox")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(word["word"], "fox");
        assert_eq!(word["status"], "unknown");
        assert!(word.get("updatedAt").is_none());

        let (status, entry) = send(
            &app,
            json_req(Method::PUT, "/vocab/Fox", serde_json::json!({"status": "known"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(entry["status"], "known");

        let (_, word) = send(&app, get_req("/vocab/fox")).await;
        assert_eq!(word["status"], "known");
        assert!(word["updatedAt"].is_string());
        assert!(dir.path().join("lexisub.vocab.en.json").exists());

        let (status, _) = send(
            &app,
            json_req(Method::PUT, "/vocab/fox", serde_json::json!({"status": "mastered"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            json_req(Method::PUT, "/vocab/%21%21", serde_json::json!({"status": "known"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, stats) = send(&app, get_req("/vocab")).await;
        assert_eq!(stats["total"], 1);
        assert_eq!(stats["counts"]["known"], 1);
        assert_eq!(stats["pending"], 1);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/vocab/flush")
            .body(Body::empty())
            .unwrap();
        let (status, outcome) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["outcome"], "no_remote");
    }

    #[tokio::test]
    async fn test_cors_options() {
        let (state, _dir) = test_state(DisplayMode::Overlay).await;
        let app = create_router(state);

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/vocab/fox")
            .header(header::ORIGIN, "http://localhost:8080")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("PUT"));
    }
}
