use std::time::Duration;

use crate::constants::CLIENT_DIAL_TIMEOUT;

/// Connection parameters shared by both client families
///
/// # Key Configuration Areas
/// - Connection establishment (blocking dial timeout)
/// - Keepalive policy for long-lived test connections
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum time a blocking dial may take per endpoint
    /// Default: 5 seconds
    pub dial_timeout: Duration,

    /// TCP keepalive duration for idle connections
    /// Default: 30 seconds
    pub tcp_keepalive: Duration,

    /// Interval for HTTP/2 keepalive pings
    /// Default: 10 seconds
    pub http2_keepalive_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            dial_timeout: CLIENT_DIAL_TIMEOUT,
            tcp_keepalive: Duration::from_secs(30),
            http2_keepalive_interval: Duration::from_secs(10),
        }
    }
}
