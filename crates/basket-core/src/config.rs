use std::time::Duration;

use crate::constants::{DEFAULT_BASE_URL, RECONNECT_DELAY, REQUEST_TIMEOUT};

#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Server root, without the `/api` prefix
    pub base_url: String,
    pub reconnect_delay: Duration,
    pub request_timeout: Duration,
}

impl CoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            reconnect_delay: RECONNECT_DELAY,
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Absolute URL for an endpoint path under the API prefix
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, crate::constants::API_PREFIX, path)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
