//! Current-slide state machine.
//!
//! [`Navigation`] owns the slide views and the current index. Every move goes
//! through [`Navigation::go_to`], which wraps any integer target into range,
//! hands back the slide being left (so the caller can pause its video), and
//! flips exactly one view from active to inactive and one the other way.

use crate::collect::{MediaKind, SlideRecord};
use serde::Serialize;

/// Wrap any integer into `[0, len)`, negative values included.
///
/// `len` must be non-zero.
pub fn wrap_index(target: i64, len: usize) -> usize {
    let n = len as i64;
    (((target % n) + n) % n) as usize
}

/// Layering state of one rendered slide.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideView {
    pub record: SlideRecord,
    active: bool,
}

impl SlideView {
    fn new(record: SlideRecord) -> Self {
        Self {
            record,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn opacity(&self) -> u8 {
        u8::from(self.active)
    }

    pub fn visibility(&self) -> &'static str {
        if self.active { "visible" } else { "hidden" }
    }

    pub fn z_index(&self) -> u8 {
        u8::from(self.active)
    }
}

/// Outcome of one [`Navigation::go_to`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub left: usize,
    pub entered: usize,
    /// Kind of the slide being left.
    pub left_kind: MediaKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Navigation {
    views: Vec<SlideView>,
    current: usize,
    /// Position indicator highlight, `None` when no indicator strip is attached.
    indicator: Option<usize>,
}

impl Navigation {
    /// Build the slide views with slide 0 active. `None` for an empty list.
    pub fn new(records: Vec<SlideRecord>, with_indicators: bool) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let mut views: Vec<SlideView> = records.into_iter().map(SlideView::new).collect();
        views[0].active = true;
        Some(Self {
            views,
            current: 0,
            indicator: with_indicators.then_some(0),
        })
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Always false: a navigation is never built without slides.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn views(&self) -> &[SlideView] {
        &self.views
    }

    pub fn current_view(&self) -> &SlideView {
        &self.views[self.current]
    }

    pub fn record_mut(&mut self, index: usize) -> Option<&mut SlideRecord> {
        self.views.get_mut(index).map(|v| &mut v.record)
    }

    /// Highlighted indicator, if the strip is attached.
    pub fn indicator(&self) -> Option<usize> {
        self.indicator
    }

    pub fn active_count(&self) -> usize {
        self.views.iter().filter(|v| v.active).count()
    }

    /// Move to `target`, wrapped into range.
    pub fn go_to(&mut self, target: i64) -> Step {
        let left = self.current;
        let left_kind = self.views[left].record.kind();
        let entered = wrap_index(target, self.views.len());

        self.views[left].active = false;
        self.current = entered;
        self.views[entered].active = true;
        if let Some(indicator) = self.indicator.as_mut() {
            *indicator = entered;
        }

        Step {
            left,
            entered,
            left_kind,
        }
    }
}

/// Playback command posted to an embedded player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerCommand {
    pub event: &'static str,
    pub func: &'static str,
    pub args: &'static str,
}

impl PlayerCommand {
    pub fn pause() -> Self {
        Self {
            event: "command",
            func: "pauseVideo",
            args: "",
        }
    }

    /// JSON payload as the player API expects it.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A fire-and-forget message for the player embedded in one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerMessage {
    pub slide: usize,
    /// Source URL of the target player frame.
    pub target: String,
    pub payload: String,
}
