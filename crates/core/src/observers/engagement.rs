use tokio::time::Instant;

use crate::{
    events::{EventPayload, PageEngagement, PageHidden},
    telemetry::Telemetry,
};

/// Scroll depth and dwell time for one page, flushed once on unload.
pub struct Engagement {
    telemetry: Telemetry,
    started_at: Instant,
    visible_since: Instant,
    max_scroll_depth: u32,
    flushed: bool,
}

impl Engagement {
    pub fn new(telemetry: Telemetry) -> Self {
        let now = Instant::now();
        Self {
            telemetry,
            started_at: now,
            visible_since: now,
            max_scroll_depth: 0,
            flushed: false,
        }
    }

    /// Returns the depth (percent) of this scroll position.
    pub fn on_scroll(&mut self, scroll_top: f64, document_height: f64, window_height: f64) -> u32 {
        let depth = scroll_depth(scroll_top, document_height, window_height);
        self.max_scroll_depth = self.max_scroll_depth.max(depth);
        depth
    }

    pub fn max_scroll_depth(&self) -> u32 {
        self.max_scroll_depth
    }

    pub fn on_visibility_change(&mut self, hidden: bool) {
        if hidden {
            self.telemetry.track(EventPayload::PageHidden(PageHidden {
                time_visible: self.visible_since.elapsed().as_millis() as u64,
                scroll_depth: self.max_scroll_depth,
                extra: Default::default(),
            }));
        } else {
            self.visible_since = Instant::now();
        }
    }

    /// Emits `page_engagement`. Only the first call has any effect.
    pub fn flush_on_unload(&mut self) -> bool {
        if self.flushed {
            return false;
        }
        self.flushed = true;

        let interactions = self
            .telemetry
            .count_events(|e| e.name().contains("click")) as u64;

        self.telemetry
            .track(EventPayload::PageEngagement(PageEngagement {
                time_on_page: self.started_at.elapsed().as_secs_f64().round() as u64,
                max_scroll_depth: self.max_scroll_depth,
                interactions,
                extra: Default::default(),
            }));
        true
    }
}

/// A page that cannot scroll counts as fully seen.
pub fn scroll_depth(scroll_top: f64, document_height: f64, window_height: f64) -> u32 {
    let scrollable = document_height - window_height;
    if scrollable <= 0.0 {
        return 100;
    }
    ((scroll_top / scrollable) * 100.0).round().clamp(0.0, 100.0) as u32
}
