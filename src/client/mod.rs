//! Client factory for reaching a running cluster
//!
//! Provides the RPC clients test bodies use next to the CLI:
//! - [`V3Client`] - gRPC client (`Put`, `MemberList`)
//! - [`V2Client`] - HTTP/JSON client (`set`, `members`, `version`)
//! - [`ClientFactory`] - resolves the TLS policy and dials either family
//! - [`fill_with_data`] - concurrent bulk loader
//!
//! # Basic Usage
//! ```no_run
//! use ctl_e2e::client::ClientFactory;
//! use ctl_e2e::ClientConnType;
//!
//! # async fn run(factory: ClientFactory, endpoints: Vec<String>) -> ctl_e2e::Result<()> {
//! let client = factory.new_client(&endpoints, ClientConnType::NonTls, false).await?;
//! client.put("foo".to_string(), "bar".to_string()).await?;
//! let members = client.member_list().await?;
//! println!("Cluster members: {:?}", members.members);
//! # Ok(())
//! # }
//! ```

mod builder;
mod config;
mod fill;
mod tls;
mod v2;
mod v3;

pub use builder::*;
pub use config::*;
pub use fill::*;
pub use tls::*;
pub use v2::*;
pub use v3::*;

#[cfg(test)]
mod fill_test;
#[cfg(test)]
mod v2_test;
#[cfg(test)]
mod v3_test;

#[cfg(test)]
use mockall::automock;
use tonic::async_trait;

use crate::proto::MemberListResponse;
use crate::Result;

/// Single-key writes, as issued by the bulk loader
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KvPutter: Send + Sync {
    async fn put(
        &self,
        key: String,
        value: String,
    ) -> Result<()>;
}

/// Cluster membership queries
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MemberLister: Send + Sync {
    async fn member_list(&self) -> Result<MemberListResponse>;
}
