//! Playback synchronization
//!
//! [`SegmentTimeline`] answers "which segment is active at `t`", and
//! [`SyncLoop`] turns a stream of playback positions into active-segment
//! transitions. A transition is reported only when the active segment
//! changes by value (start time and text), never when the same segment stays
//! active across ticks.
//!
//! Boundary rule: segments are ordered stably by start time and the first
//! one with `start <= t <= end` wins. At a shared boundary the segment that
//! ends there is still active.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::adapter::PlatformAdapter;
use crate::types::Segment;

/// Segments of one subtitle set, ordered for lookup by playback position.
#[derive(Debug, Clone, Default)]
pub struct SegmentTimeline {
    segments: Vec<Segment>,
}

impl SegmentTimeline {
    pub fn new(mut segments: Vec<Segment>) -> Self {
        // stable: equal start times keep input order
        segments.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Index of the active segment at `t`.
    pub fn index_at(&self, t: f64) -> Option<usize> {
        if !t.is_finite() {
            return None;
        }
        let candidates = self.segments.partition_point(|s| s.start_time <= t);
        self.segments[..candidates]
            .iter()
            .position(|s| s.contains(t))
    }

    /// Active segment at `t`.
    pub fn active_at(&self, t: f64) -> Option<&Segment> {
        self.index_at(t).map(|i| &self.segments[i])
    }
}

/// A change of the active segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveChange {
    pub segment: Option<Segment>,
    /// Position in [`SegmentTimeline::segments`]
    pub index: Option<usize>,
}

/// Consumer of synchronization events (renderers).
pub trait SyncListener: Send + Sync {
    /// The working subtitle set was replaced; `segments` is in timeline
    /// order and `active` locates the still-active segment in it, if any.
    fn segments_replaced(&self, _segments: &[Segment], _active: Option<usize>) {}

    /// The active segment changed.
    fn active_changed(&self, change: &ActiveChange);
}

/// The synchronization state machine: one timeline, one active segment.
#[derive(Debug, Default)]
pub struct SyncLoop {
    timeline: SegmentTimeline,
    active: Option<Segment>,
}

impl SyncLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the working set. The next tick re-evaluates the active
    /// segment against it.
    pub fn replace_segments(&mut self, segments: Vec<Segment>) -> &SegmentTimeline {
        self.timeline = SegmentTimeline::new(segments);
        &self.timeline
    }

    pub fn timeline(&self) -> &SegmentTimeline {
        &self.timeline
    }

    pub fn active(&self) -> Option<&Segment> {
        self.active.as_ref()
    }

    /// Position of the active segment in the current timeline.
    pub fn active_index(&self) -> Option<usize> {
        let active = self.active.as_ref()?;
        self.timeline.segments().iter().position(|s| s.same_cue(active))
    }

    /// Evaluate playback position `t`, returning the transition if the
    /// active segment changed.
    pub fn tick(&mut self, t: f64) -> Option<ActiveChange> {
        let index = self.timeline.index_at(t);
        let next = index.map(|i| &self.timeline.segments()[i]);

        let unchanged = match (&self.active, next) {
            (None, None) => true,
            (Some(current), Some(next)) => current.same_cue(next),
            _ => false,
        };
        if unchanged {
            return None;
        }

        self.active = next.cloned();
        Some(ActiveChange {
            segment: self.active.clone(),
            index,
        })
    }

    /// No playback position is available; drop any active segment.
    pub fn clear(&mut self) -> Option<ActiveChange> {
        self.active.take().map(|_| ActiveChange {
            segment: None,
            index: None,
        })
    }
}

/// Drive `state` from the adapter's playback position every `interval`.
///
/// Runs until aborted. A missing video degrades to "no active segment".
pub fn spawn_sync_loop(
    adapter: Arc<dyn PlatformAdapter>,
    state: Arc<Mutex<SyncLoop>>,
    listener: Arc<dyn SyncListener>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;

            let position = adapter
                .get_video_element()
                .map(|v| v.current_time())
                .filter(|t| t.is_finite());
            let change = {
                let mut state = state.lock();
                match position {
                    Some(t) => state.tick(t),
                    None => state.clear(),
                }
            };

            if let Some(change) = change {
                tracing::trace!(
                    "Active segment now {:?} at {:?}",
                    change.segment.as_ref().map(|s| s.text.as_str()),
                    position
                );
                listener.active_changed(&change);
            }
        }
    })
}
