use std::time::Duration;

use url::Url;
use uuid::Uuid;

use crate::error::StreamError;

/// Entries retained for display; older entries are evicted.
pub const DEFAULT_LOG_CAP: usize = 500;

/// Fixed wait before re-opening a dropped connection.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Agent log stream endpoint, e.g. `http://127.0.0.1:8080/api/agent/logs/stream`.
    pub endpoint: Url,
    /// Opaque per-session identifier sent as `client_id` so the server can
    /// route and de-duplicate subscriptions.
    pub client_id: String,
    pub reconnect_delay: Duration,
    pub log_cap: usize,
}

impl StreamConfig {
    pub fn new(endpoint: &str) -> Result<Self, StreamError> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
            client_id: Uuid::new_v4().to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            log_cap: DEFAULT_LOG_CAP,
        })
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_log_cap(mut self, cap: usize) -> Self {
        self.log_cap = cap;
        self
    }
}
