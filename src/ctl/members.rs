use tracing::debug;

use super::CtlCtx;
use crate::constants::VERSION_CHECK_ATTEMPTS;
use crate::constants::VERSION_CHECK_INTERVAL;
use crate::async_task::task_with_fixed_interval;
use crate::Error;
use crate::HarnessError;
use crate::MemberLister;
use crate::Result;
use crate::V2Client;
use crate::V3Client;

/// Member picked for removal in reconfiguration tests, formatted for use on
/// the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberToRemove {
    /// First client URL of the member
    pub endpoint: String,
    /// Member id in hex
    pub member_id: String,
    /// Cluster id in hex
    pub cluster_id: String,
}

/// Id of the member called `name`, `None` when no member has that name
pub async fn get_member_id_by_name<C>(
    client: &C,
    name: &str,
) -> Result<Option<u64>>
where
    C: MemberLister + ?Sized,
{
    let resp = client.member_list().await?;
    Ok(resp.members.iter().find(|m| m.name == name).map(|m| m.id))
}

/// Poll the v2 `/version` endpoint until its body mentions `expected`.
pub async fn cluster_version_check(
    client: &V2Client,
    expected: &str,
) -> Result<()> {
    task_with_fixed_interval(
        move || async move {
            let body = client.version().await?;
            if body.contains(expected) {
                Ok(())
            } else {
                Err(Error::Fatal(format!("unexpected /version body {body}")))
            }
        },
        VERSION_CHECK_ATTEMPTS,
        VERSION_CHECK_INTERVAL,
    )
    .await
    .map_err(|e| {
        HarnessError::ClusterVersionMismatch {
            expected: expected.to_string(),
            last_error: e.to_string(),
        }
        .into()
    })
}

impl CtlCtx {
    /// gRPC client for the running cluster, secured the way the cluster's
    /// client URLs are.
    pub async fn new_v3_client(&self) -> Result<V3Client> {
        self.client_factory()
            .new_client(&self.endpoints(), self.cfg.client_tls, self.cfg.is_client_auto_tls)
            .await
    }

    /// HTTP client for the running cluster's v2 API
    pub async fn new_v2_client(&self) -> Result<V2Client> {
        self.client_factory()
            .new_client_v2(&self.endpoints(), self.cfg.client_tls, self.cfg.is_client_auto_tls)
            .await
    }

    /// Always the second member of the list as the cluster returns it.
    ///
    /// Fails when the configured cluster has fewer than two members or the
    /// listed member count differs from the configured size.
    pub async fn member_to_remove<C>(
        &self,
        client: &C,
    ) -> Result<MemberToRemove>
    where
        C: MemberLister + ?Sized,
    {
        let size = self.cfg.cluster_size;
        if size < 2 {
            return Err(HarnessError::ClusterTooSmall { size }.into());
        }

        let resp = client.member_list().await?;
        if resp.members.len() != size {
            return Err(HarnessError::MemberCountMismatch {
                expected: size,
                actual: resp.members.len(),
            }
            .into());
        }

        let member = &resp.members[1];
        let endpoint = member
            .client_urls
            .first()
            .cloned()
            .ok_or(HarnessError::MemberWithoutClientUrl { member_id: member.id })?;
        debug!("member to remove: {} ({:x})", member.name, member.id);

        Ok(MemberToRemove {
            endpoint,
            member_id: format!("{:x}", member.id),
            cluster_id: format!("{:x}", resp.cluster_id()),
        })
    }
}
