use std::time::Duration;

// -
// Invocation

/// Prefix shared by every environment variable the target binary reads
pub const ENV_PREFIX: &str = "ETCDCTL";

// -
// Timeouts

/// Dial timeout a fresh test context starts with
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(7);

/// Deadline used when neither a test timeout nor a dial timeout is set
pub const FALLBACK_TEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How long a cancelled worker may keep running before it is aborted
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Dial timeout of the RPC clients built by the client factory
pub const CLIENT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

// -
// Bulk loader

pub const FILL_CONCURRENCY: usize = 10;
pub const FILL_KEY_COUNT: usize = 100;

// -
// Cluster version polling

pub const VERSION_CHECK_ATTEMPTS: usize = 35;
pub const VERSION_CHECK_INTERVAL: Duration = Duration::from_millis(200);
