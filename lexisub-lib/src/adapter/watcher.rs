//! Wait for an element to appear
//!
//! Players often build their caption layer after the video, so callers
//! watch the page's mutation feed instead of polling. The watch is bounded
//! by a timeout and can be cancelled by aborting the returned task.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::page::{Element, Page};

/// Re-run `resolve` after every page mutation until it yields an element or
/// `timeout` passes, then run `on_found` with it.
///
/// The task resolves to whether the element was found.
pub fn watch_for_element<R, F, Fut>(
    page: Arc<dyn Page>,
    timeout: Duration,
    resolve: R,
    on_found: F,
) -> JoinHandle<bool>
where
    R: Fn() -> Option<Arc<dyn Element>> + Send + Sync + 'static,
    F: FnOnce(Arc<dyn Element>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        // subscribe before the first lookup so no insertion slips between
        let mut mutations = page.mutations();
        let found = tokio::time::timeout(timeout, async {
            loop {
                if let Some(element) = resolve() {
                    return Some(element);
                }
                match mutations.recv().await {
                    Ok(()) | Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => return None,
                }
            }
        })
        .await;

        match found {
            Ok(Some(element)) => {
                on_found(element).await;
                true
            }
            Ok(None) => {
                tracing::debug!("Page closed while waiting for element");
                false
            }
            Err(_) => {
                tracing::warn!("Element did not appear within {}ms", timeout.as_millis());
                false
            }
        }
    })
}
