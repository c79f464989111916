//! Harness Error Hierarchy
//!
//! Defines the error types surfaced by the end-to-end harness, categorized by
//! the layer that produced them: the execution engine, the RPC clients, and
//! the spawned target binary.

use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Execution engine and cluster lifecycle failures
    #[error(transparent)]
    Harness(#[from] HarnessError),

    /// RPC client construction and call failures
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Target binary invocation failures
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// Harness settings could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Unrecoverable failures raised by a test body
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The process cluster failed to start
    #[error("could not start process cluster: {source}")]
    StartupFailure {
        #[source]
        source: Box<Error>,
    },

    /// The deadline elapsed before the test body finished
    #[error("test timed out after {timeout:?}\n{dump}")]
    TimeoutFailure { timeout: Duration, dump: String },

    /// Closing the process cluster returned an error
    #[error("error closing cluster processes: {source}")]
    TeardownFailure {
        #[source]
        source: Box<Error>,
    },

    #[error("{size}-node is too small to test 'member remove'")]
    ClusterTooSmall { size: usize },

    #[error("expected {expected} members, got {actual}")]
    MemberCountMismatch { expected: usize, actual: usize },

    #[error("member {member_id:x} advertises no client URL")]
    MemberWithoutClientUrl { member_id: u64 },

    #[error("failed cluster version test expected {expected} got ({last_error})")]
    ClusterVersionMismatch { expected: String, last_error: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to generate cert: {0}")]
    CertificateGeneration(#[from] rcgen::Error),

    #[error("TLS material error: {0}")]
    Tls(String),

    #[error(transparent)]
    Rustls(#[from] rustls::Error),

    /// Malformed endpoint address
    #[error("Invalid URI format: {0}")]
    InvalidEndpoint(String),

    /// Blocking dial failed against every endpoint
    #[error("failed to connect to any of {endpoints:?}: {reason}")]
    Connect { endpoints: Vec<String>, reason: String },

    /// gRPC transport layer errors
    #[error(transparent)]
    Transport(#[from] Box<tonic::transport::Error>),

    /// gRPC status code errors
    #[error(transparent)]
    Status(#[from] Box<tonic::Status>),

    /// HTTP client errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    /// The binary could not be started
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Output ended before the expected text appeared
    #[error("expected {expected:?} in output, got:\n{output}")]
    ExpectNotFound { expected: String, output: String },

    /// The run was cancelled while the process was still producing output
    #[error("spawned process {program} cancelled")]
    Cancelled { program: String },

    #[error("empty command line")]
    EmptyCommand,
}

impl From<tonic::Status> for Error {
    fn from(status: tonic::Status) -> Self {
        ClientError::Status(Box::new(status)).into()
    }
}

impl From<tonic::transport::Error> for Error {
    fn from(err: tonic::transport::Error) -> Self {
        ClientError::Transport(Box::new(err)).into()
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err).into()
    }
}

impl From<rcgen::Error> for Error {
    fn from(err: rcgen::Error) -> Self {
        ClientError::CertificateGeneration(err).into()
    }
}

impl From<rustls::Error> for Error {
    fn from(err: rustls::Error) -> Self {
        ClientError::Rustls(err).into()
    }
}
