//! Host page abstraction
//!
//! Adapters see the page only through these traits: selector lookups that
//! return element handles, plus a mutation feed for waiting on elements that
//! appear later.

use std::sync::Arc;
use tokio::sync::broadcast;

/// `HTMLMediaElement.readyState` value once duration and dimensions are known.
pub const HAVE_METADATA: u8 = 1;

/// A styled page element (containers, native caption layers).
pub trait Element: Send + Sync {
    /// Whether the element is still part of the document.
    fn is_connected(&self) -> bool;

    /// Inline `display` style, `None` when unset.
    fn display(&self) -> Option<String>;

    /// Set or clear the inline `display` style.
    fn set_display(&self, value: Option<String>);
}

/// A video element handle.
pub trait MediaElement: Send + Sync {
    /// Whether the element is still part of the document.
    fn is_connected(&self) -> bool;

    fn ready_state(&self) -> u8;

    /// Playback position in seconds
    fn current_time(&self) -> f64;

    fn set_current_time(&self, seconds: f64);

    /// Media duration in seconds; may be NaN before metadata loads
    fn duration(&self) -> f64;

    fn paused(&self) -> bool;

    fn play(&self);

    fn pause(&self);

    fn playback_rate(&self) -> f64;

    fn set_playback_rate(&self, rate: f64);
}

/// The document an adapter operates on.
pub trait Page: Send + Sync {
    /// Location of the document
    fn url(&self) -> String;

    /// First video element matching `selector`.
    fn query_video(&self, selector: &str) -> Option<Arc<dyn MediaElement>>;

    /// First element matching `selector`.
    fn query_element(&self, selector: &str) -> Option<Arc<dyn Element>>;

    /// Subscribe to structural changes of the document.
    fn mutations(&self) -> broadcast::Receiver<()>;
}
