//! Floor engine configuration

use std::time::Duration;

/// Default background refresh period
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for the floor engine and its HTTP adapter
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | FLOOR_API_URL | http://localhost:8000 | Reservation backend base URL |
/// | FLOOR_API_TOKEN | (unset) | Bearer token |
/// | FLOOR_REQUEST_TIMEOUT_SECS | 30 | HTTP request timeout |
/// | FLOOR_REFRESH_INTERVAL_SECS | 30 | Background refresh period |
/// | FLOOR_SHOW_AVAILABILITY | true | Start with the availability view on |
#[derive(Debug, Clone)]
pub struct FloorConfig {
    /// Server base URL (e.g., "http://localhost:8000")
    pub base_url: String,

    /// Token for authentication
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Background refresh period
    pub refresh_interval: Duration,

    /// Initial state of the availability view
    pub show_availability: bool,
}

impl FloorConfig {
    /// Create a new configuration for the given backend
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: 30,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            show_availability: true,
        }
    }

    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::new(
            std::env::var("FLOOR_API_URL").unwrap_or_else(|_| "http://localhost:8000".into()),
        );
        config.token = std::env::var("FLOOR_API_TOKEN").ok().filter(|t| !t.is_empty());
        config.timeout = std::env::var("FLOOR_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);
        config.refresh_interval = std::env::var("FLOOR_REFRESH_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL);
        config.show_availability = std::env::var("FLOOR_SHOW_AVAILABILITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(true);
        config
    }

    /// Load `.env` from the working directory (if any), then the environment
    pub fn load() -> Self {
        if let Err(e) = dotenv::dotenv() {
            tracing::debug!(error = %e, "No .env file loaded");
        }
        Self::from_env()
    }

    /// Set the token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the background refresh period
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the initial availability view state
    pub fn with_availability(mut self, enabled: bool) -> Self {
        self.show_availability = enabled;
        self
    }

    /// Create an HTTP adapter from this configuration
    pub fn build_http_client(&self) -> crate::ClientResult<crate::HttpClient> {
        crate::HttpClient::new(self)
    }
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self::new("http://localhost:8000")
    }
}
