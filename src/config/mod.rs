//! Configuration management for the end-to-end harness.
//!
//! Harness settings are loaded from multiple sources with priority:
//! 1. Default values (hardcoded)
//! 2. Optional file named by `CONFIG_PATH`
//! 3. Environment variables prefixed with `E2E_` (highest priority)
//!
//! The cluster shape a test starts with lives in [`ClusterConfig`].

mod cluster;
mod tls;
pub use cluster::*;
pub use tls::*;


//---
use std::env;
use std::path::PathBuf;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use tracing::debug;

use crate::Result;

#[derive(Debug, Deserialize, Clone)]
pub struct HarnessSettings {
    /// Directory holding the target binaries
    /// Default: "./bin"
    #[serde(default = "default_bin_dir")]
    pub bin_dir: PathBuf,

    /// Directory holding the pre-provisioned TLS fixtures
    /// Default: "./fixtures"
    #[serde(default = "default_fixtures_dir")]
    pub fixtures_dir: PathBuf,

    /// File name of the administration client
    #[serde(default = "default_ctl_bin_name")]
    pub ctl_bin_name: String,

    /// File name of the offline utility binary
    #[serde(default = "default_utl_bin_name")]
    pub utl_bin_name: String,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            bin_dir: default_bin_dir(),
            fixtures_dir: default_fixtures_dir(),
            ctl_bin_name: default_ctl_bin_name(),
            utl_bin_name: default_utl_bin_name(),
        }
    }
}

impl HarnessSettings {
    /// Load settings from defaults, the optional `CONFIG_PATH` file and
    /// `E2E_*` environment variables, in that order of priority.
    pub fn load() -> Result<Self> {
        let mut config = Config::builder();

        if let Ok(path) = env::var("CONFIG_PATH") {
            debug!("loading harness settings from {}", path);
            config = config.add_source(File::with_name(&path).required(true));
        }

        config = config.add_source(
            Environment::with_prefix("E2E")
                .ignore_empty(true)
                .try_parsing(true),
        );

        Ok(config.build()?.try_deserialize()?)
    }

    pub fn ctl_bin_path(&self) -> PathBuf {
        self.bin_dir.join(&self.ctl_bin_name)
    }

    pub fn utl_bin_path(&self) -> PathBuf {
        self.bin_dir.join(&self.utl_bin_name)
    }

    pub fn tls_paths(&self) -> TlsPaths {
        TlsPaths::under(&self.fixtures_dir)
    }
}

fn default_bin_dir() -> PathBuf {
    PathBuf::from("./bin")
}
fn default_fixtures_dir() -> PathBuf {
    PathBuf::from("./fixtures")
}
fn default_ctl_bin_name() -> String {
    "etcdctl".into()
}
fn default_utl_bin_name() -> String {
    "etcdutl".into()
}
