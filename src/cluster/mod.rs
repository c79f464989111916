//! Process cluster collaborator.
//!
//! The harness never manages server processes itself. A [`ClusterLauncher`]
//! starts a [`ProcessCluster`] for a given [`ClusterConfig`]; the engine owns
//! the returned cluster until teardown and hands test bodies a read-only
//! [`ClusterHandle`].

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use tonic::async_trait;

use crate::ClusterConfig;
use crate::Result;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterLauncher: Send + Sync {
    /// Start every member of the cluster and return once they serve clients.
    async fn start(
        &self,
        config: &ClusterConfig,
    ) -> Result<Arc<dyn ProcessCluster>>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProcessCluster: Send + Sync {
    /// Client URLs of every member, in member order
    fn endpoints(&self) -> Vec<String>;

    /// Data directory of the first member
    fn data_dir(&self) -> PathBuf;

    /// Stop every member process
    async fn close(&self) -> Result<()>;
}

/// View of a running cluster handed to test bodies.
///
/// Exposes everything but `close`: only the engine's teardown stops the
/// cluster.
#[derive(Clone)]
pub struct ClusterHandle {
    inner: Arc<dyn ProcessCluster>,
    config: ClusterConfig,
}

impl ClusterHandle {
    pub(crate) fn new(
        inner: Arc<dyn ProcessCluster>,
        config: ClusterConfig,
    ) -> Self {
        Self { inner, config }
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.inner.endpoints()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.inner.data_dir()
    }

    /// Shape the cluster was started with
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }
}

impl fmt::Debug for ClusterHandle {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ClusterHandle")
            .field("endpoints", &self.inner.endpoints())
            .field("config", &self.config)
            .finish()
    }
}
