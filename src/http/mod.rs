//! HTTP server module
//!
//! This module handles HTTP request routing and handling:
//! - Axum router with session, playback and vocabulary endpoints
//! - Subtitle payload ingestion into the session feed
//! - Overlay and transcript views
//! - CORS middleware

pub mod handlers;
pub mod routes;
pub mod vocab;

pub use routes::create_router;
