//! Engine connection configuration.

use std::time::Duration;

use crate::progress::DEFAULT_SPEED_WINDOW;

/// Default engine address when nothing else is configured.
pub const DEFAULT_ENGINE_URL: &str = "http://localhost:2375";

/// Longest error body shown to users before it is cut off.
pub const DEFAULT_ERROR_DISPLAY_LIMIT: usize = 200;

/// Where the engine lives and how requests to it behave.
///
/// # Example
///
/// ```ignore
/// use berth::config::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_base_url("http://10.0.0.5:2375")
///     .with_api_version("1.43");
/// assert_eq!(config.endpoint("/build"), "http://10.0.0.5:2375/v1.43/build");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Base URL of the engine HTTP API, without a trailing slash
    pub base_url: String,
    /// Optional API version, inserted as `/v{version}` before every path
    pub api_version: Option<String>,
    /// Whole-request timeout. Off by default: pulls and builds stream for minutes.
    pub request_timeout: Option<Duration>,
    /// Characters of a non-JSON error body kept for display
    pub error_display_limit: usize,
    /// Minimum interval between pull speed recomputations
    pub speed_window: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ENGINE_URL.to_string(),
            api_version: None,
            request_timeout: None,
            error_display_limit: DEFAULT_ERROR_DISPLAY_LIMIT,
            speed_window: DEFAULT_SPEED_WINDOW,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine base URL. Trailing slashes are dropped.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        let version = version.trim_start_matches('v');
        self.api_version = if version.is_empty() {
            None
        } else {
            Some(version.to_string())
        };
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_error_display_limit(mut self, limit: usize) -> Self {
        self.error_display_limit = limit;
        self
    }

    pub fn with_speed_window(mut self, window: Duration) -> Self {
        self.speed_window = window;
        self
    }

    /// Read `BERTH_ENGINE_URL`, `BERTH_API_VERSION` and `BERTH_TIMEOUT_SECS`
    /// on top of the defaults. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("BERTH_ENGINE_URL") {
            if !url.trim().is_empty() {
                config = config.with_base_url(url.trim());
            }
        }

        if let Ok(version) = std::env::var("BERTH_API_VERSION") {
            config = config.with_api_version(version.trim());
        }

        if let Ok(raw) = std::env::var("BERTH_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => {
                    config = config.with_request_timeout(Duration::from_secs(secs));
                }
                Ok(_) => {}
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid BERTH_TIMEOUT_SECS"),
            }
        }

        config
    }

    /// Full URL for an API path such as `/images/create`.
    pub fn endpoint(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        match &self.api_version {
            Some(version) => format!("{}/v{}/{}", self.base_url, version, path),
            None => format!("{}/{}", self.base_url, path),
        }
    }
}
