use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

/// How clients reach the cluster's client URLs
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientConnType {
    #[default]
    NonTls,
    Tls,
    /// Both plain and TLS listeners are served
    TlsAndNonTls,
}

impl fmt::Display for ClientConnType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ClientConnType::NonTls => write!(f, "non-tls"),
            ClientConnType::Tls => write!(f, "tls"),
            ClientConnType::TlsAndNonTls => write!(f, "tls-and-non-tls"),
        }
    }
}

/// Cluster shape: how many members a test cluster has, its security mode and
/// its operational limits.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    #[serde(default = "default_cluster_size")]
    pub cluster_size: usize,

    #[serde(default)]
    pub client_tls: ClientConnType,

    /// Clients talk TLS against a self-signed server identity
    #[serde(default)]
    pub is_client_auto_tls: bool,

    /// Clients present the revoked certificate pair
    #[serde(default)]
    pub is_client_crl: bool,

    #[serde(default)]
    pub is_peer_tls: bool,

    #[serde(default)]
    pub is_peer_auto_tls: bool,

    /// Backend quota in bytes, 0 keeps the server default
    #[serde(default)]
    pub quota_backend_bytes: i64,

    /// Applied entries between snapshots, 0 keeps the server default
    #[serde(default)]
    pub snapshot_count: u64,

    #[serde(default)]
    pub no_strict_reconfig: bool,

    /// Members verify their data against peers before serving
    #[serde(default)]
    pub initial_corrupt_check: bool,

    /// Data directories survive cluster close
    #[serde(default)]
    pub keep_data_dir: bool,

    /// 0 keeps the server default
    #[serde(default)]
    pub max_concurrent_streams: u32,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// URL scheme for peer and client listeners ("http" or "unix")
    #[serde(default = "default_base_scheme")]
    pub base_scheme: String,

    /// Start members one by one instead of all at once
    #[serde(default)]
    pub rolling_start: bool,

    /// Server binary, `None` uses the launcher's default
    #[serde(default)]
    pub exec_path: Option<PathBuf>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            cluster_size: default_cluster_size(),
            client_tls: ClientConnType::NonTls,
            is_client_auto_tls: false,
            is_client_crl: false,
            is_peer_tls: false,
            is_peer_auto_tls: false,
            quota_backend_bytes: 0,
            snapshot_count: 0,
            no_strict_reconfig: false,
            initial_corrupt_check: false,
            keep_data_dir: false,
            max_concurrent_streams: 0,
            log_level: default_log_level(),
            base_scheme: default_base_scheme(),
            rolling_start: false,
            exec_path: None,
        }
    }
}

impl ClusterConfig {
    /// Three members, plain transport everywhere
    pub fn no_tls() -> Self {
        Self::default()
    }

    /// Three members with self-signed peer TLS
    pub fn auto_tls() -> Self {
        Self {
            is_peer_tls: true,
            is_peer_auto_tls: true,
            ..Self::default()
        }
    }

    /// Three members with fixture-backed TLS on both peer and client URLs
    pub fn tls() -> Self {
        Self {
            client_tls: ClientConnType::Tls,
            is_peer_tls: true,
            ..Self::default()
        }
    }

    /// One member serving client TLS from the fixture identity
    pub fn client_tls() -> Self {
        Self {
            cluster_size: 1,
            client_tls: ClientConnType::Tls,
            ..Self::default()
        }
    }

    /// One member serving client TLS from a self-signed identity
    pub fn client_auto_tls() -> Self {
        Self {
            is_client_auto_tls: true,
            ..Self::client_tls()
        }
    }

    /// One member serving client TLS, clients present the revoked pair
    pub fn client_tls_crl() -> Self {
        Self {
            is_client_crl: true,
            ..Self::client_tls()
        }
    }

    /// Same shape reduced to a single member
    pub fn standalone(&self) -> Self {
        Self {
            cluster_size: 1,
            ..self.clone()
        }
    }
}

fn default_cluster_size() -> usize {
    3
}
fn default_log_level() -> String {
    "info".into()
}
fn default_base_scheme() -> String {
    "http".into()
}
