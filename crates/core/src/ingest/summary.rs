use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::events::{EventPayload, TelemetryEvent};

/// Inclusive window over event timestamps (ms since epoch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_date: u64,
    pub end_date: u64,
}

impl TimeRange {
    pub const WEEK_MS: u64 = 7 * 24 * 60 * 60 * 1000;

    /// The seven days ending at `now`.
    pub fn last_week(now: u64) -> Self {
        Self {
            start_date: now.saturating_sub(Self::WEEK_MS),
            end_date: now,
        }
    }

    pub fn contains(&self, timestamp: u64) -> bool {
        (self.start_date..=self.end_date).contains(&timestamp)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViewSummary {
    pub total: u64,
    pub unique: u64,
    pub by_page: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionSummary {
    pub total: u64,
    pub by_type: BTreeMap<String, u64>,
}

/// Averages per metric; zero when no sample was seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    #[serde(rename = "avgLCP")]
    pub avg_lcp: f64,
    #[serde(rename = "avgFID")]
    pub avg_fid: f64,
    #[serde(rename = "avgCLS")]
    pub avg_cls: f64,
    pub avg_load_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSummary {
    pub total: u64,
    pub by_type: BTreeMap<String, u64>,
}

/// Admin dashboard aggregate over stored events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub page_views: PageViewSummary,
    pub conversions: ConversionSummary,
    pub performance: PerformanceSummary,
    pub errors: ErrorSummary,
    pub time_range: TimeRange,
}

#[derive(Default)]
struct Mean {
    sum: f64,
    count: u64,
}

impl Mean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

impl Summary {
    pub fn from_events<'a>(
        events: impl IntoIterator<Item = &'a TelemetryEvent>,
        range: TimeRange,
    ) -> Self {
        let mut page_views = PageViewSummary::default();
        let mut conversions = ConversionSummary::default();
        let mut errors = ErrorSummary::default();
        let mut unique_pages = BTreeSet::new();
        let (mut lcp, mut fid, mut cls, mut load_time) =
            (Mean::default(), Mean::default(), Mean::default(), Mean::default());

        for event in events.into_iter().filter(|e| range.contains(e.timestamp)) {
            match &event.payload {
                EventPayload::PageView(view) => {
                    page_views.total += 1;
                    unique_pages.insert(view.page.clone());
                    *page_views.by_page.entry(view.page.clone()).or_default() += 1;
                }
                EventPayload::Conversion(conversion) => {
                    conversions.total += 1;
                    let kind = if conversion.conversion_type.is_empty() {
                        "unknown".to_string()
                    } else {
                        conversion.conversion_type.clone()
                    };
                    *conversions.by_type.entry(kind).or_default() += 1;
                }
                EventPayload::PerformanceMetric(metric) => match metric.metric_name.as_str() {
                    "lcp" => lcp.push(metric.duration),
                    "fid" => fid.push(metric.duration),
                    "cls" => cls.push(metric.duration),
                    "load_time" => load_time.push(metric.duration),
                    _ => {}
                },
                EventPayload::JavascriptError(error) => {
                    errors.total += 1;
                    *errors.by_type.entry(error_kind(&error.message)).or_default() += 1;
                }
                EventPayload::PromiseRejection(rejection) => {
                    errors.total += 1;
                    let kind = error_kind(rejection.reason.as_deref().unwrap_or_default());
                    *errors.by_type.entry(kind).or_default() += 1;
                }
                _ => {}
            }
        }

        page_views.unique = unique_pages.len() as u64;

        Self {
            page_views,
            conversions,
            performance: PerformanceSummary {
                avg_lcp: lcp.value(),
                avg_fid: fid.value(),
                avg_cls: cls.value(),
                avg_load_time: load_time.value(),
            },
            errors,
            time_range: range,
        }
    }
}

/// `"TypeError: x is undefined"` groups under `TypeError`.
fn error_kind(message: &str) -> String {
    let kind = message.split(':').next().unwrap_or_default().trim();
    if kind.is_empty() {
        "unknown".to_string()
    } else {
        kind.to_string()
    }
}
