//! Resolver configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default total request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the HTTP client used by [`TokenResolver`](crate::TokenResolver).
///
/// TLS certificate verification is on unless `verify_tls` is explicitly
/// set to `false`. Timeouts are written in seconds and may be fractional
/// (`timeout_secs = 0.5`); a zero timeout is rejected when the resolver is
/// built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Verify the server's TLS certificate.
    pub verify_tls: bool,

    /// Total request timeout.
    #[serde(rename = "timeout_secs", with = "duration_secs")]
    pub timeout: Duration,

    /// Connect timeout.
    #[serde(rename = "connect_timeout_secs", with = "duration_secs")]
    pub connect_timeout: Duration,

    /// User-Agent header sent with the token request.
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            verify_tls: true,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!("tsscred/{}", env!("CARGO_PKG_VERSION"))
}

impl ResolverConfig {
    /// Set the total request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Enable or disable TLS certificate verification.
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }
}

/// Durations as (possibly fractional) seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if value.subsec_nanos() == 0 {
            serializer.serialize_u64(value.as_secs())
        } else {
            serializer.serialize_f64(value.as_secs_f64())
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|_| D::Error::custom(format!("invalid duration in seconds: {}", secs)))
    }
}
