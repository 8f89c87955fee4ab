use std::time::Duration;

use tokio::time::Instant;

use crate::{
    events::{EventPayload, RageClicks},
    telemetry::Telemetry,
};

pub const RAGE_CLICK_WINDOW: Duration = Duration::from_secs(1);
pub const RAGE_CLICK_THRESHOLD: u32 = 3;

/// Detects bursts of clicks with less than a second between them. A burst
/// is judged once it settles (a quiet second, or an explicit `settle`).
pub struct RageClickDetector {
    telemetry: Telemetry,
    count: u32,
    last_click: Option<Instant>,
    last_element: String,
}

impl RageClickDetector {
    pub fn new(telemetry: Telemetry) -> Self {
        Self {
            telemetry,
            count: 0,
            last_click: None,
            last_element: String::new(),
        }
    }

    pub fn on_click(&mut self, element: impl Into<String>, at: Instant) {
        self.poll(at);
        self.count += 1;
        self.last_click = Some(at);
        self.last_element = element.into();
    }

    /// Settles the current burst if the window has passed since the last click.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.last_click {
            Some(last) if now.duration_since(last) >= RAGE_CLICK_WINDOW => self.settle(),
            _ => false,
        }
    }

    /// Ends the current burst, reporting it if it was long enough.
    pub fn settle(&mut self) -> bool {
        let reported = self.count >= RAGE_CLICK_THRESHOLD;
        if reported {
            self.telemetry.track(EventPayload::RageClicks(RageClicks {
                element: std::mem::take(&mut self.last_element),
                click_count: self.count,
                extra: Default::default(),
            }));
        }
        self.count = 0;
        self.last_click = None;
        reported
    }
}
