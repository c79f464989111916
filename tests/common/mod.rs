use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use ctl_e2e::ClusterConfig;
use ctl_e2e::ClusterLauncher;
use ctl_e2e::HarnessSettings;
use ctl_e2e::ProcessCluster;
use ctl_e2e::Result;
use parking_lot::Mutex;
use tempfile::TempDir;
use tonic::async_trait;
use tracing::debug;

pub const VERSION: &str = "3.6.0";

// Stand-in for both client binaries: echoes its name, arguments and
// ETCDCTL_* environment, then answers the commands the tests issue.
const FAKE_CLIENT: &str = r#"#!/bin/sh
echo "$(basename "$0") $*"
env | grep '^ETCDCTL_' | sort
for arg in "$@"; do
  case "$arg" in
    put) echo OK ;;
    version) echo "etcdctl version: 3.6.0"; echo "API version: 3.6" ;;
    hang) sleep 30 ;;
  esac
done
"#;

/// Launches fake clusters whose members are plain directories and whose
/// client binaries are shell scripts.
pub struct ScriptLauncher {
    bin_dir: TempDir,
    started: Mutex<Vec<Arc<ScriptCluster>>>,
}

impl ScriptLauncher {
    pub fn new() -> Self {
        let bin_dir = tempfile::tempdir().unwrap();
        for name in ["etcdctl", "etcdutl"] {
            install_script(&bin_dir.path().join(name));
        }
        Self {
            bin_dir,
            started: Mutex::new(Vec::new()),
        }
    }

    pub fn settings(&self) -> HarnessSettings {
        HarnessSettings {
            bin_dir: self.bin_dir.path().to_path_buf(),
            ..HarnessSettings::default()
        }
    }

    pub fn started(&self) -> Vec<Arc<ScriptCluster>> {
        self.started.lock().clone()
    }
}

fn install_script(path: &Path) {
    fs::write(path, FAKE_CLIENT).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[async_trait]
impl ClusterLauncher for ScriptLauncher {
    async fn start(
        &self,
        config: &ClusterConfig,
    ) -> Result<Arc<dyn ProcessCluster>> {
        let cluster = Arc::new(ScriptCluster::new(config.clone())?);
        debug!("started fake cluster at {}", cluster.data_dir.display());
        self.started.lock().push(cluster.clone());
        Ok(cluster)
    }
}

pub struct ScriptCluster {
    pub config: ClusterConfig,
    data_root: TempDir,
    data_dir: PathBuf,
    closes: AtomicUsize,
}

impl ScriptCluster {
    fn new(config: ClusterConfig) -> Result<Self> {
        let data_root = tempfile::tempdir()?;
        let data_dir = data_root.path().join("member-0");
        fs::create_dir_all(data_dir.join("member").join("snap"))?;
        Ok(Self {
            config,
            data_root,
            data_dir,
            closes: AtomicUsize::new(0),
        })
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn root(&self) -> &Path {
        self.data_root.path()
    }
}

#[async_trait]
impl ProcessCluster for ScriptCluster {
    fn endpoints(&self) -> Vec<String> {
        (0..self.config.cluster_size)
            .map(|i| format!("http://127.0.0.1:{}", 2379 + i * 10000))
            .collect()
    }

    fn data_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if !self.config.keep_data_dir {
            tokio::fs::remove_dir_all(&self.data_dir).await?;
        }
        Ok(())
    }
}
