use std::collections::HashSet;

use crate::{observers::ObserverError, telemetry::Telemetry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    LargestContentfulPaint,
    FirstInput,
    LayoutShift,
    Paint,
}

impl EntryType {
    pub const ALL: [EntryType; 4] = [
        EntryType::LargestContentfulPaint,
        EntryType::FirstInput,
        EntryType::LayoutShift,
        EntryType::Paint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::LargestContentfulPaint => "largest-contentful-paint",
            EntryType::FirstInput => "first-input",
            EntryType::LayoutShift => "layout-shift",
            EntryType::Paint => "paint",
        }
    }
}

/// Performance timeline entry as reported by the host, times in ms.
#[derive(Debug, Clone, PartialEq)]
pub enum PerformanceEntry {
    LargestContentfulPaint {
        start_time: f64,
    },
    FirstInput {
        start_time: f64,
        processing_start: f64,
    },
    LayoutShift {
        value: f64,
        had_recent_input: bool,
    },
    Paint {
        name: String,
        start_time: f64,
    },
}

impl PerformanceEntry {
    pub fn entry_type(&self) -> EntryType {
        match self {
            PerformanceEntry::LargestContentfulPaint { .. } => EntryType::LargestContentfulPaint,
            PerformanceEntry::FirstInput { .. } => EntryType::FirstInput,
            PerformanceEntry::LayoutShift { .. } => EntryType::LayoutShift,
            PerformanceEntry::Paint { .. } => EntryType::Paint,
        }
    }
}

pub const FIRST_CONTENTFUL_PAINT: &str = "first-contentful-paint";

/// Latest value seen for each vital.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VitalsSnapshot {
    pub lcp: Option<f64>,
    pub fid: Option<f64>,
    pub cls: Option<f64>,
    pub fcp: Option<f64>,
}

/// Core Web Vitals observer.
///
/// LCP and FCP are reported once and then stop observing. FID is reported
/// for every entry. CLS ignores shifts right after user input and reports the
/// running total on each counted shift.
pub struct WebVitals {
    telemetry: Telemetry,
    observing: HashSet<EntryType>,
    cls_total: f64,
    snapshot: VitalsSnapshot,
}

impl WebVitals {
    pub fn new(telemetry: Telemetry) -> Self {
        Self {
            telemetry,
            observing: HashSet::new(),
            cls_total: 0.0,
            snapshot: VitalsSnapshot::default(),
        }
    }

    pub fn observe(
        &mut self,
        entry_type: EntryType,
        supported: &[EntryType],
    ) -> Result<(), ObserverError> {
        if !supported.contains(&entry_type) {
            return Err(ObserverError::Unsupported(entry_type.as_str()));
        }
        self.observing.insert(entry_type);
        Ok(())
    }

    /// Registers every vital the host supports; the rest are skipped.
    pub fn observe_all(&mut self, supported: &[EntryType]) {
        for entry_type in EntryType::ALL {
            if let Err(e) = self.observe(entry_type, supported) {
                tracing::warn!("{e}");
            }
        }
    }

    pub fn is_observing(&self, entry_type: EntryType) -> bool {
        self.observing.contains(&entry_type)
    }

    /// Feeds one observer callback's batch of entries.
    pub fn record(&mut self, entries: &[PerformanceEntry]) {
        let last_lcp = entries.iter().rev().find_map(|e| match e {
            PerformanceEntry::LargestContentfulPaint { start_time } => Some(*start_time),
            _ => None,
        });
        if let Some(lcp) = last_lcp {
            if self.observing.remove(&EntryType::LargestContentfulPaint) {
                self.snapshot.lcp = Some(lcp);
                self.telemetry.track_performance("lcp", lcp);
            }
        }

        for entry in entries {
            if !self.observing.contains(&entry.entry_type()) {
                continue;
            }

            match entry {
                PerformanceEntry::LargestContentfulPaint { .. } => {}
                PerformanceEntry::FirstInput {
                    start_time,
                    processing_start,
                } => {
                    let fid = processing_start - start_time;
                    self.snapshot.fid = Some(fid);
                    self.telemetry.track_performance("fid", fid);
                }
                PerformanceEntry::LayoutShift {
                    value,
                    had_recent_input,
                } => {
                    if *had_recent_input {
                        continue;
                    }
                    self.cls_total += value;
                    self.snapshot.cls = Some(self.cls_total);
                    self.telemetry.track_performance("cls", self.cls_total);
                }
                PerformanceEntry::Paint { name, start_time } => {
                    if name != FIRST_CONTENTFUL_PAINT {
                        continue;
                    }
                    self.observing.remove(&EntryType::Paint);
                    self.snapshot.fcp = Some(*start_time);
                    self.telemetry.track_performance("fcp", *start_time);
                }
            }
        }
    }

    pub fn snapshot(&self) -> VitalsSnapshot {
        self.snapshot
    }

    pub fn disconnect(&mut self) {
        self.observing.clear();
    }
}
