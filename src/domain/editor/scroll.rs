use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

pub const DEFAULT_SCROLL_DEBOUNCE: Duration = Duration::from_millis(50);

/// Geometry of one scrollable pane, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollMetrics {
    pub offset: f64,
    pub scroll_height: f64,
    pub viewport_height: f64,
}

impl ScrollMetrics {
    pub fn new(offset: f64, scroll_height: f64, viewport_height: f64) -> Self {
        Self {
            offset,
            scroll_height,
            viewport_height,
        }
    }

    /// Largest reachable offset; zero when the content fits the viewport.
    pub fn max_offset(&self) -> f64 {
        (self.scroll_height - self.viewport_height).max(0.0)
    }

    /// Scroll position as a value in `[0, 1]`, or `None` without overflow.
    pub fn fraction(&self) -> Option<f64> {
        let range = self.scroll_height - self.viewport_height;
        if range <= 0.0 || !range.is_finite() {
            return None;
        }
        Some((self.offset / range).clamp(0.0, 1.0))
    }

    pub fn offset_for(&self, fraction: f64) -> f64 {
        fraction.clamp(0.0, 1.0) * self.max_offset()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pane {
    Editor,
    Preview,
}

impl Pane {
    pub fn opposite(self) -> Self {
        match self {
            Pane::Editor => Pane::Preview,
            Pane::Preview => Pane::Editor,
        }
    }
}

/// Which pane, if any, is currently driving synchronisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    SyncingFromEditor { until: Instant },
    SyncingFromPreview { until: Instant },
}

impl SyncState {
    fn driver(self, now: Instant) -> Option<Pane> {
        match self {
            SyncState::SyncingFromEditor { until } if now < until => Some(Pane::Editor),
            SyncState::SyncingFromPreview { until } if now < until => Some(Pane::Preview),
            _ => None,
        }
    }

    fn driven_by(pane: Pane, until: Instant) -> Self {
        match pane {
            Pane::Editor => SyncState::SyncingFromEditor { until },
            Pane::Preview => SyncState::SyncingFromPreview { until },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollOutcome {
    /// Set `pane`'s scroll offset to `offset`.
    Apply { pane: Pane, offset: f64 },
    /// The other pane is driving; this event is an echo and must not propagate.
    Ignored,
    /// The source pane does not overflow, so there is nothing to map.
    NoOverflow,
}

/// Proportional scroll coordinator for an editor and its preview.
///
/// Scroll handlers are transitions on an explicit [`SyncState`]. A pane that
/// starts driving holds the role until `debounce` passes without another
/// event from it; events from the other pane are ignored meanwhile.
#[derive(Debug, Clone)]
pub struct ScrollSync {
    state: SyncState,
    debounce: Duration,
}

impl Default for ScrollSync {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLL_DEBOUNCE)
    }
}

impl ScrollSync {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: SyncState::Idle,
            debounce,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Handle a scroll event fired by `source`.
    pub fn on_scroll(
        &mut self,
        source: Pane,
        source_metrics: &ScrollMetrics,
        target_metrics: &ScrollMetrics,
        now: Instant,
    ) -> ScrollOutcome {
        if self.state.driver(now) == Some(source.opposite()) {
            return ScrollOutcome::Ignored;
        }

        self.state = SyncState::driven_by(source, now + self.debounce);

        match source_metrics.fraction() {
            Some(fraction) => ScrollOutcome::Apply {
                pane: source.opposite(),
                offset: target_metrics.offset_for(fraction),
            },
            None => ScrollOutcome::NoOverflow,
        }
    }

    /// Return to idle once the debounce deadline has passed.
    pub fn settle(&mut self, now: Instant) -> SyncState {
        if self.state.driver(now).is_none() {
            self.state = SyncState::Idle;
        }
        self.state
    }

    /// Recompute the preview offset from the editor position regardless of
    /// the current state. Used when the preview height changes under a
    /// stationary editor, e.g. after its images finish loading.
    pub fn resync(&self, editor: &ScrollMetrics, preview: &ScrollMetrics) -> ScrollOutcome {
        match editor.fraction() {
            Some(fraction) => ScrollOutcome::Apply {
                pane: Pane::Preview,
                offset: preview.offset_for(fraction),
            },
            None => ScrollOutcome::NoOverflow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    fn applied_offset(outcome: ScrollOutcome) -> f64 {
        match outcome {
            ScrollOutcome::Apply { offset, .. } => offset,
            other => panic!("expected an applied offset, got {other:?}"),
        }
    }

    #[test]
    fn editor_fraction_maps_onto_preview() {
        let editor_overflow = 1_200.0;
        let preview_overflow = 3_000.0;

        for step in 0..=10 {
            let fraction = f64::from(step) / 10.0;
            let editor = ScrollMetrics::new(fraction * editor_overflow, editor_overflow + 400.0, 400.0);
            let preview = ScrollMetrics::new(0.0, preview_overflow + 500.0, 500.0);

            let mut sync = ScrollSync::default();
            let outcome = sync.on_scroll(Pane::Editor, &editor, &preview, Instant::now());

            let offset = applied_offset(outcome);
            assert!((offset - fraction * preview_overflow).abs() < TOLERANCE);
        }
    }

    #[test]
    fn preview_drives_editor_symmetrically() {
        let preview = ScrollMetrics::new(750.0, 2_000.0, 500.0);
        let editor = ScrollMetrics::new(0.0, 900.0, 300.0);

        let mut sync = ScrollSync::default();
        let outcome = sync.on_scroll(Pane::Preview, &preview, &editor, Instant::now());

        assert_eq!(
            outcome,
            ScrollOutcome::Apply {
                pane: Pane::Editor,
                offset: 300.0
            }
        );
    }

    #[test]
    fn echo_from_preview_is_ignored_while_editor_drives() {
        let editor = ScrollMetrics::new(100.0, 1_000.0, 200.0);
        let preview = ScrollMetrics::new(0.0, 2_000.0, 400.0);
        let now = Instant::now();

        let mut sync = ScrollSync::default();
        sync.on_scroll(Pane::Editor, &editor, &preview, now);
        assert!(matches!(sync.state(), SyncState::SyncingFromEditor { .. }));

        let echo = sync.on_scroll(
            Pane::Preview,
            &preview,
            &editor,
            now + Duration::from_millis(10),
        );
        assert_eq!(echo, ScrollOutcome::Ignored);
        assert!(matches!(sync.state(), SyncState::SyncingFromEditor { .. }));
    }

    #[test]
    fn repeated_events_restart_the_debounce() {
        let editor = ScrollMetrics::new(100.0, 1_000.0, 200.0);
        let preview = ScrollMetrics::new(0.0, 2_000.0, 400.0);
        let start = Instant::now();

        let mut sync = ScrollSync::default();
        sync.on_scroll(Pane::Editor, &editor, &preview, start);
        sync.on_scroll(Pane::Editor, &editor, &preview, start + Duration::from_millis(40));

        let at_first_deadline = start + Duration::from_millis(60);
        assert!(matches!(
            sync.settle(at_first_deadline),
            SyncState::SyncingFromEditor { .. }
        ));

        let after_restart = start + Duration::from_millis(95);
        assert_eq!(sync.settle(after_restart), SyncState::Idle);
    }

    #[test]
    fn expired_sync_lets_other_pane_drive() {
        let editor = ScrollMetrics::new(100.0, 1_000.0, 200.0);
        let preview = ScrollMetrics::new(400.0, 2_000.0, 400.0);
        let start = Instant::now();

        let mut sync = ScrollSync::default();
        sync.on_scroll(Pane::Editor, &editor, &preview, start);

        let later = start + DEFAULT_SCROLL_DEBOUNCE + Duration::from_millis(1);
        let outcome = sync.on_scroll(Pane::Preview, &preview, &editor, later);

        assert!(matches!(outcome, ScrollOutcome::Apply { pane: Pane::Editor, .. }));
        assert!(matches!(sync.state(), SyncState::SyncingFromPreview { .. }));
    }

    #[test]
    fn non_overflowing_source_is_a_noop() {
        let editor = ScrollMetrics::new(0.0, 300.0, 300.0);
        let preview = ScrollMetrics::new(0.0, 2_000.0, 400.0);

        let mut sync = ScrollSync::default();
        let outcome = sync.on_scroll(Pane::Editor, &editor, &preview, Instant::now());
        assert_eq!(outcome, ScrollOutcome::NoOverflow);
    }

    #[test]
    fn resync_ignores_state() {
        let editor = ScrollMetrics::new(400.0, 1_000.0, 200.0);
        let preview = ScrollMetrics::new(0.0, 1_400.0, 400.0);

        let mut sync = ScrollSync::default();
        sync.on_scroll(Pane::Preview, &preview, &editor, Instant::now());

        let offset = applied_offset(sync.resync(&editor, &preview));
        assert!((offset - 500.0).abs() < TOLERANCE);
    }
}
