use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub used: u64,
    pub total: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    pub page: String,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub hash: String,
    /// Keys outside the known shape, kept as sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLoadComplete {
    pub load_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetric {
    pub metric_name: String,
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<MemoryUsage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEngagement {
    /// Seconds.
    pub time_on_page: u64,
    pub max_scroll_depth: u32,
    pub interactions: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageHidden {
    /// Milliseconds.
    pub time_visible: u64,
    pub scroll_depth: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JavascriptError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromiseRejection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub conversion_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Click {
    pub element: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSubmission {
    pub form_name: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowResource {
    pub name: String,
    pub duration: f64,
    #[serde(rename = "type")]
    pub initiator_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceStats {
    pub total_resources: u64,
    pub total_size: u64,
    pub avg_duration: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RageClicks {
    pub element: String,
    pub click_count: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Event metadata keyed by event name.
///
/// Known names decode into their typed shape. Unknown names, or known names
/// whose metadata does not fit the shape, are carried as [`EventPayload::Custom`]
/// so nothing is lost on the way through.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    PageView(PageView),
    PageLoadComplete(PageLoadComplete),
    PerformanceMetric(PerformanceMetric),
    PageEngagement(PageEngagement),
    PageHidden(PageHidden),
    JavascriptError(JavascriptError),
    PromiseRejection(PromiseRejection),
    Conversion(Conversion),
    Click(Click),
    FormSubmission(FormSubmission),
    SlowResource(SlowResource),
    ResourceStats(ResourceStats),
    RageClicks(RageClicks),
    Custom {
        name: String,
        metadata: Option<Value>,
    },
}

impl EventPayload {
    pub const PAGE_VIEW: &'static str = "page_view";
    pub const PAGE_LOAD_COMPLETE: &'static str = "page_load_complete";
    pub const PERFORMANCE_METRIC: &'static str = "performance_metric";
    pub const PAGE_ENGAGEMENT: &'static str = "page_engagement";
    pub const PAGE_HIDDEN: &'static str = "page_hidden";
    pub const JAVASCRIPT_ERROR: &'static str = "javascript_error";
    pub const PROMISE_REJECTION: &'static str = "promise_rejection";
    pub const CONVERSION: &'static str = "conversion";
    pub const CLICK: &'static str = "click";
    pub const FORM_SUBMISSION: &'static str = "form_submission";
    pub const SLOW_RESOURCE: &'static str = "slow_resource";
    pub const RESOURCE_STATS: &'static str = "resource_stats";
    pub const RAGE_CLICKS: &'static str = "rage_clicks";

    pub fn name(&self) -> &str {
        match self {
            EventPayload::PageView(_) => Self::PAGE_VIEW,
            EventPayload::PageLoadComplete(_) => Self::PAGE_LOAD_COMPLETE,
            EventPayload::PerformanceMetric(_) => Self::PERFORMANCE_METRIC,
            EventPayload::PageEngagement(_) => Self::PAGE_ENGAGEMENT,
            EventPayload::PageHidden(_) => Self::PAGE_HIDDEN,
            EventPayload::JavascriptError(_) => Self::JAVASCRIPT_ERROR,
            EventPayload::PromiseRejection(_) => Self::PROMISE_REJECTION,
            EventPayload::Conversion(_) => Self::CONVERSION,
            EventPayload::Click(_) => Self::CLICK,
            EventPayload::FormSubmission(_) => Self::FORM_SUBMISSION,
            EventPayload::SlowResource(_) => Self::SLOW_RESOURCE,
            EventPayload::ResourceStats(_) => Self::RESOURCE_STATS,
            EventPayload::RageClicks(_) => Self::RAGE_CLICKS,
            EventPayload::Custom { name, .. } => name,
        }
    }

    /// Metadata object as sent on the wire.
    pub fn metadata(&self) -> Result<Option<Value>, serde_json::Error> {
        let value = match self {
            EventPayload::PageView(m) => serde_json::to_value(m)?,
            EventPayload::PageLoadComplete(m) => serde_json::to_value(m)?,
            EventPayload::PerformanceMetric(m) => serde_json::to_value(m)?,
            EventPayload::PageEngagement(m) => serde_json::to_value(m)?,
            EventPayload::PageHidden(m) => serde_json::to_value(m)?,
            EventPayload::JavascriptError(m) => serde_json::to_value(m)?,
            EventPayload::PromiseRejection(m) => serde_json::to_value(m)?,
            EventPayload::Conversion(m) => serde_json::to_value(m)?,
            EventPayload::Click(m) => serde_json::to_value(m)?,
            EventPayload::FormSubmission(m) => serde_json::to_value(m)?,
            EventPayload::SlowResource(m) => serde_json::to_value(m)?,
            EventPayload::ResourceStats(m) => serde_json::to_value(m)?,
            EventPayload::RageClicks(m) => serde_json::to_value(m)?,
            EventPayload::Custom { metadata, .. } => return Ok(metadata.clone()),
        };
        Ok(Some(value))
    }

    /// Rebuilds a payload from a wire name and metadata object.
    pub fn from_parts(name: impl Into<String>, metadata: Option<Value>) -> Self {
        let name = name.into();
        let typed = match name.as_str() {
            Self::PAGE_VIEW => decode(&metadata).map(EventPayload::PageView),
            Self::PAGE_LOAD_COMPLETE => decode(&metadata).map(EventPayload::PageLoadComplete),
            Self::PERFORMANCE_METRIC => decode(&metadata).map(EventPayload::PerformanceMetric),
            Self::PAGE_ENGAGEMENT => decode(&metadata).map(EventPayload::PageEngagement),
            Self::PAGE_HIDDEN => decode(&metadata).map(EventPayload::PageHidden),
            Self::JAVASCRIPT_ERROR => decode(&metadata).map(EventPayload::JavascriptError),
            Self::PROMISE_REJECTION => decode(&metadata).map(EventPayload::PromiseRejection),
            Self::CONVERSION => decode(&metadata).map(EventPayload::Conversion),
            Self::CLICK => decode(&metadata).map(EventPayload::Click),
            Self::FORM_SUBMISSION => decode(&metadata).map(EventPayload::FormSubmission),
            Self::SLOW_RESOURCE => decode(&metadata).map(EventPayload::SlowResource),
            Self::RESOURCE_STATS => decode(&metadata).map(EventPayload::ResourceStats),
            Self::RAGE_CLICKS => decode(&metadata).map(EventPayload::RageClicks),
            _ => None,
        };

        typed.unwrap_or(EventPayload::Custom { name, metadata })
    }
}

/// Typed only when re-encoding gives back the same metadata, so a payload
/// never loses or invents keys on its way through.
fn decode<T: DeserializeOwned + Serialize>(metadata: &Option<Value>) -> Option<T> {
    let value = metadata.as_ref()?;
    let typed: T = serde_json::from_value(value.clone()).ok()?;
    let reencoded = serde_json::to_value(&typed).ok()?;
    same_json(value, &reencoded).then_some(typed)
}

/// Structural equality where `1234` and `1234.0` are the same number.
fn same_json(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y || x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| same_json(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| same_json(v, w)))
        }
        _ => a == b,
    }
}
