//! Runtime configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const fn default_response_timeout_ms() -> u64 {
    30_000
}

/// Client-side configuration.
///
/// # Example
///
/// ```
/// use hermes_runtime::ClientConfig;
///
/// let config: ClientConfig = serde_json::from_str(r#"{ "response_timeout_ms": 500 }"#).unwrap();
/// assert_eq!(config.response_timeout_ms, 500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// How long a synchronous invocation waits for its response, in
    /// milliseconds. `0` waits forever.
    pub response_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            response_timeout_ms: default_response_timeout_ms(),
        }
    }
}

impl ClientConfig {
    /// Returns the response timeout as a duration, `None` meaning wait
    /// forever.
    #[must_use]
    pub const fn response_timeout(&self) -> Option<Duration> {
        if self.response_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.response_timeout_ms))
        }
    }
}
