use std::path::Path;
use std::path::PathBuf;

/// Locations of the pre-provisioned TLS fixtures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    /// Certificate Authority root certificate
    pub ca: PathBuf,

    /// Client certificate signed by `ca`
    pub cert: PathBuf,

    /// Private key of `cert`
    pub key: PathBuf,

    /// Certificate listed in the CA's revocation list
    pub revoked_cert: PathBuf,

    /// Private key of `revoked_cert`
    pub revoked_key: PathBuf,
}

impl TlsPaths {
    pub fn under(fixtures_dir: &Path) -> Self {
        Self {
            ca: fixtures_dir.join("ca.crt"),
            cert: fixtures_dir.join("server.crt"),
            key: fixtures_dir.join("server.key.insecure"),
            revoked_cert: fixtures_dir.join("server-revoked.crt"),
            revoked_key: fixtures_dir.join("server-revoked.key.insecure"),
        }
    }
}
