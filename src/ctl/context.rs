use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use super::Encoding;
use super::FlagSet;
use super::InvocationVector;
use super::SharedEnv;
use crate::constants::DEFAULT_DIAL_TIMEOUT;
use crate::constants::DEFAULT_DRAIN_GRACE;
use crate::constants::FALLBACK_TEST_TIMEOUT;
use crate::time::flag_duration;
use crate::ClientConnType;
use crate::ClientFactory;
use crate::ClusterConfig;
use crate::ClusterHandle;
use crate::HarnessSettings;
use crate::Result;

/// Mutates a member's data directory, e.g. to simulate disk corruption
pub type CorruptFn = Arc<dyn Fn(&Path) -> Result<()> + Send + Sync>;

/// Configuration and live resources of one test run.
///
/// Built fresh per run with the defaults of [`CtlCtx::new`], mutated by the
/// option chain, then by the engine once the cluster is up. Test bodies
/// receive a clone.
#[derive(Clone)]
pub struct CtlCtx {
    pub api_prefix: String,
    pub cfg: ClusterConfig,
    pub quota_backend_bytes: i64,
    pub corrupt_fn: Option<CorruptFn>,
    pub no_strict_reconfig: bool,

    pub dial_timeout: Duration,
    /// Zero means "derive from the dial timeout"
    pub test_timeout: Duration,
    /// How long a cancelled body may keep running after the deadline
    pub drain_grace: Duration,

    /// Keep the configured cluster size instead of a single member
    pub quorum: bool,
    pub interactive: bool,

    pub user: String,
    pub pass: String,

    pub initial_corrupt_check: bool,
    pub compact_physical: bool,

    /// Run the offline utility instead of the client for suitable commands
    pub etcdutl: bool,

    /// Data directory of the first member, set once the cluster is up
    pub data_dir: PathBuf,

    /// Present only in environment-variable invocation mode
    pub(crate) env: Option<SharedEnv>,
    pub(crate) epc: Option<ClusterHandle>,
    pub(crate) settings: Arc<HarnessSettings>,
    pub(crate) scratch_dir: Arc<TempDir>,
    pub(crate) cancel: CancellationToken,
}

impl CtlCtx {
    pub fn new(settings: HarnessSettings) -> Result<Self> {
        Ok(Self {
            api_prefix: String::new(),
            cfg: ClusterConfig::auto_tls(),
            quota_backend_bytes: 0,
            corrupt_fn: None,
            no_strict_reconfig: false,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            test_timeout: Duration::ZERO,
            drain_grace: DEFAULT_DRAIN_GRACE,
            quorum: false,
            interactive: false,
            user: String::new(),
            pass: String::new(),
            initial_corrupt_check: false,
            compact_physical: false,
            etcdutl: false,
            data_dir: PathBuf::new(),
            env: None,
            epc: None,
            settings: Arc::new(settings),
            scratch_dir: Arc::new(tempfile::tempdir()?),
            cancel: CancellationToken::new(),
        })
    }

    /// Deadline for the test body: the test timeout when set, otherwise
    /// twice the dial timeout plus one second, otherwise 30 seconds.
    pub fn get_test_timeout(&self) -> Duration {
        if !self.test_timeout.is_zero() {
            return self.test_timeout;
        }
        if self.dial_timeout.is_zero() {
            return FALLBACK_TEST_TIMEOUT;
        }
        self.dial_timeout.saturating_mul(2).saturating_add(Duration::from_secs(1))
    }

    /// Fold the convenience fields into the cluster shape before start.
    pub(crate) fn derive_cluster_config(
        &mut self,
        keep_data_dir: bool,
    ) {
        if !self.quorum {
            self.cfg = self.cfg.standalone();
        }
        if self.quota_backend_bytes > 0 {
            self.cfg.quota_backend_bytes = self.quota_backend_bytes;
        }
        self.cfg.no_strict_reconfig = self.no_strict_reconfig;
        if self.initial_corrupt_check {
            self.cfg.initial_corrupt_check = true;
        }
        if keep_data_dir {
            self.cfg.keep_data_dir = true;
        }
    }

    pub(crate) fn attach_cluster(
        &mut self,
        handle: ClusterHandle,
    ) {
        self.data_dir = handle.data_dir();
        self.epc = Some(handle);
    }

    /// Running cluster, `None` before the engine started it
    pub fn epc(&self) -> Option<&ClusterHandle> {
        self.epc.as_ref()
    }

    /// Client URLs of the running cluster, empty before start
    pub fn endpoints(&self) -> Vec<String> {
        self.epc.as_ref().map(|epc| epc.endpoints()).unwrap_or_default()
    }

    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    /// Signalled when the run's deadline fires
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn client_factory(&self) -> ClientFactory {
        ClientFactory::new(self.scratch_dir.path().to_path_buf(), self.settings.tls_paths())
    }

    pub fn is_env_mode(&self) -> bool {
        self.env.is_some()
    }

    pub fn encoding(&self) -> Encoding {
        if self.is_env_mode() {
            Encoding::Env
        } else {
            Encoding::Flags
        }
    }

    /// Keyed connection and security fields for reaching `eps`
    pub fn flag_set(
        &self,
        eps: &[String],
    ) -> FlagSet {
        let mut fields = FlagSet::default();
        fields.insert("endpoints", eps.join(","));
        fields.insert("dial-timeout", flag_duration(self.dial_timeout));

        if self.cfg.client_tls == ClientConnType::Tls {
            let tls = self.settings.tls_paths();
            if self.cfg.is_client_auto_tls {
                fields.insert("insecure-transport", "false");
                fields.insert("insecure-skip-tls-verify", "true");
            } else if self.cfg.is_client_crl {
                fields.insert("cacert", tls.ca.display().to_string());
                fields.insert("cert", tls.revoked_cert.display().to_string());
                fields.insert("key", tls.revoked_key.display().to_string());
            } else {
                fields.insert("cacert", tls.ca.display().to_string());
                fields.insert("cert", tls.cert.display().to_string());
                fields.insert("key", tls.key.display().to_string());
            }
        }

        if !self.user.is_empty() {
            fields.insert("user", format!("{}:{}", self.user, self.pass));
        }
        fields
    }

    /// Client command prefix for `eps`.
    ///
    /// In flag mode the fields follow the binary as `--key=value`; in
    /// environment mode they are staged into the run's environment and only
    /// the binary is returned. Staged values reach the process environment
    /// through [`CtlCtx::export_env`].
    pub fn prefix_args_with(
        &self,
        eps: &[String],
    ) -> Vec<String> {
        let mut args = vec![self.settings.ctl_bin_path().display().to_string()];
        match self.encoding().encode(&self.flag_set(eps)) {
            InvocationVector::Flags(flags) => args.extend(flags),
            InvocationVector::Env(vars) => {
                if let Some(env) = &self.env {
                    env.lock().stage_all(vars);
                }
            }
        }
        args
    }

    /// Client command prefix for the running cluster
    pub fn prefix_args(&self) -> Vec<String> {
        self.prefix_args_with(&self.endpoints())
    }

    /// Prefix for commands that take no endpoint or security flags: the
    /// offline utility when requested, otherwise the bare client.
    pub fn prefix_args_utl(&self) -> Vec<String> {
        let bin = if self.etcdutl {
            self.settings.utl_bin_path()
        } else {
            self.settings.ctl_bin_path()
        };
        vec![bin.display().to_string()]
    }

    /// Apply staged entries to the process environment and return them.
    pub fn export_env(&self) -> BTreeMap<String, String> {
        match &self.env {
            Some(env) => {
                let mut env = env.lock();
                env.export();
                env.staged().clone()
            }
            None => BTreeMap::new(),
        }
    }

    /// Entries staged so far, empty in flag mode
    pub fn staged_env(&self) -> BTreeMap<String, String> {
        self.env
            .as_ref()
            .map(|env| env.lock().staged().clone())
            .unwrap_or_default()
    }

    /// Run the configured corruption function against the data directory
    pub fn corrupt_data_dir(&self) -> Result<()> {
        match &self.corrupt_fn {
            Some(corrupt) => corrupt(&self.data_dir),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for CtlCtx {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("CtlCtx")
            .field("api_prefix", &self.api_prefix)
            .field("cfg", &self.cfg)
            .field("quota_backend_bytes", &self.quota_backend_bytes)
            .field("no_strict_reconfig", &self.no_strict_reconfig)
            .field("dial_timeout", &self.dial_timeout)
            .field("test_timeout", &self.test_timeout)
            .field("quorum", &self.quorum)
            .field("interactive", &self.interactive)
            .field("user", &self.user)
            .field("initial_corrupt_check", &self.initial_corrupt_check)
            .field("compact_physical", &self.compact_physical)
            .field("etcdutl", &self.etcdutl)
            .field("data_dir", &self.data_dir)
            .field("env_mode", &self.is_env_mode())
            .field("epc", &self.epc)
            .finish_non_exhaustive()
    }
}
