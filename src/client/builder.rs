use std::path::PathBuf;

use tracing::debug;

use super::tls_info;
use super::ClientConfig;
use super::TlsInfo;
use super::V2Client;
use super::V3Client;
use crate::ClientConnType;
use crate::Result;
use crate::TlsPaths;

/// Builds RPC clients against a running cluster.
///
/// Both client families share the TLS resolution step; they differ only in
/// the transport they dial.
#[derive(Debug, Clone)]
pub struct ClientFactory {
    config: ClientConfig,
    scratch_dir: PathBuf,
    tls_paths: TlsPaths,
}

impl ClientFactory {
    /// `scratch_dir` receives generated self-signed material.
    pub fn new(
        scratch_dir: PathBuf,
        tls_paths: TlsPaths,
    ) -> Self {
        Self {
            config: ClientConfig::default(),
            scratch_dir,
            tls_paths,
        }
    }

    /// Completely replaces the default connection configuration
    pub fn set_config(
        mut self,
        config: ClientConfig,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolve the TLS policy for `conn_type`
    pub fn tls_info(
        &self,
        conn_type: ClientConnType,
        is_auto_tls: bool,
    ) -> Result<Option<TlsInfo>> {
        tls_info(conn_type, is_auto_tls, &self.scratch_dir, &self.tls_paths)
    }

    /// Dial a gRPC client, blocking until a connection is established
    pub async fn new_client(
        &self,
        endpoints: &[String],
        conn_type: ClientConnType,
        is_auto_tls: bool,
    ) -> Result<V3Client> {
        let tls = self.tls_info(conn_type, is_auto_tls)?;
        debug!("dialing {:?} over {} (tls: {})", endpoints, conn_type, tls.is_some());
        V3Client::connect(endpoints, tls.as_ref(), &self.config).await
    }

    /// Build an HTTP/JSON client
    pub async fn new_client_v2(
        &self,
        endpoints: &[String],
        conn_type: ClientConnType,
        is_auto_tls: bool,
    ) -> Result<V2Client> {
        let tls = self.tls_info(conn_type, is_auto_tls)?;
        V2Client::new(endpoints, tls.as_ref(), &self.config).await
    }
}
