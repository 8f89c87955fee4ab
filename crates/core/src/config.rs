use std::{path::PathBuf, time::Duration};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration: {env_var} environment variable is not set")]
    MissingEnv { env_var: &'static str },

    #[error("Invalid URL for {env_var}: {value}")]
    InvalidUrl { env_var: &'static str, value: String },

    #[error("Fallback capacity must be > 0")]
    ZeroCapacity,

    #[error("Memory sample interval must be > 0")]
    ZeroInterval,
}

pub const COLLECTOR_URL_ENV: &str = "CODIFY_COLLECTOR_URL";
pub const FALLBACK_PATH_ENV: &str = "CODIFY_FALLBACK_PATH";
pub const USER_AGENT_ENV: &str = "CODIFY_USER_AGENT";
pub const REFERRER_ENV: &str = "CODIFY_REFERRER";
pub const BACKEND_URL_ENV: &str = "CODIFY_BACKEND_URL";
pub const BACKEND_KEY_ENV: &str = "CODIFY_BACKEND_KEY";

/// Number of undelivered events kept in the durable fallback store.
pub const DEFAULT_FALLBACK_CAPACITY: usize = 100;
pub const DEFAULT_MEMORY_SAMPLE_INTERVAL: Duration = Duration::from_secs(30);

/// Settings for the telemetry pipeline and its durable fallback.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub collector_url: String,
    pub fallback_path: PathBuf,
    pub fallback_capacity: usize,
    pub user_agent: String,
    pub referrer: String,
    pub memory_sample_interval: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            collector_url: "http://localhost:8080".to_string(),
            fallback_path: default_fallback_path(),
            fallback_capacity: DEFAULT_FALLBACK_CAPACITY,
            user_agent: format!("codify/{}", env!("CARGO_PKG_VERSION")),
            referrer: String::new(),
            memory_sample_interval: DEFAULT_MEMORY_SAMPLE_INTERVAL,
        }
    }
}

impl TelemetryConfig {
    /// Defaults overridden by whichever `CODIFY_*` variables are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(COLLECTOR_URL_ENV) {
            config.collector_url = checked_url(COLLECTOR_URL_ENV, url)?;
        }
        if let Ok(path) = std::env::var(FALLBACK_PATH_ENV) {
            config.fallback_path = PathBuf::from(path);
        }
        if let Ok(user_agent) = std::env::var(USER_AGENT_ENV) {
            config.user_agent = user_agent;
        }
        if let Ok(referrer) = std::env::var(REFERRER_ENV) {
            config.referrer = referrer;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fallback_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.memory_sample_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        checked_url(COLLECTOR_URL_ENV, self.collector_url.clone())?;
        Ok(())
    }
}

/// Hosted table API and serverless functions used for lead submission.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub anon_key: String,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    /// Both the backend URL and its key must be present in the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var(BACKEND_URL_ENV).map_err(|_| ConfigError::MissingEnv {
            env_var: BACKEND_URL_ENV,
        })?;
        let anon_key = std::env::var(BACKEND_KEY_ENV).map_err(|_| ConfigError::MissingEnv {
            env_var: BACKEND_KEY_ENV,
        })?;

        Ok(Self::new(checked_url(BACKEND_URL_ENV, base_url)?, anon_key))
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub fn function_url(&self, function: &str) -> String {
        format!("{}/functions/v1/{}", self.base_url, function)
    }
}

pub fn default_fallback_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("codify")
        .join("analytics_events.json")
}

/// Must parse as an absolute http(s) URL with a host.
fn checked_url(env_var: &'static str, value: String) -> Result<String, ConfigError> {
    match reqwest::Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(value),
        _ => Err(ConfigError::InvalidUrl { env_var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TelemetryConfig::default();
        assert_eq!(config.fallback_capacity, 100);
        assert!(config.fallback_path.ends_with("codify/analytics_events.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = TelemetryConfig {
            fallback_capacity: 0,
            ..TelemetryConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroCapacity)));
    }

    #[test]
    fn collector_url_needs_a_scheme() {
        let config = TelemetryConfig {
            collector_url: "localhost:8080".to_string(),
            ..TelemetryConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn malformed_urls_are_rejected() {
        for bad in ["http:// bad", "https://", "http://exa mple.com", "ftp://example.com"] {
            let config = TelemetryConfig {
                collector_url: bad.to_string(),
                ..TelemetryConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn zero_sample_interval_is_rejected() {
        let config = TelemetryConfig {
            memory_sample_interval: Duration::ZERO,
            ..TelemetryConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroInterval)));
    }

    #[test]
    fn backend_urls_are_joined_without_double_slashes() {
        let backend = BackendConfig::new("https://db.example.com/", "anon");
        assert_eq!(
            backend.table_url("project_leads"),
            "https://db.example.com/rest/v1/project_leads"
        );
        assert_eq!(
            backend.function_url("send-project-notification"),
            "https://db.example.com/functions/v1/send-project-notification"
        );
    }
}
