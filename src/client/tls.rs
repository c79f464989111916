use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use rcgen::generate_simple_self_signed;
use rcgen::CertifiedKey;
use rustls::client::danger::HandshakeSignatureValid;
use rustls::client::danger::ServerCertVerified;
use rustls::client::danger::ServerCertVerifier;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::CertificateDer;
use rustls::pki_types::PrivateKeyDer;
use rustls::pki_types::ServerName;
use rustls::pki_types::UnixTime;
use rustls::ClientConfig as RustlsClientConfig;
use rustls::DigitallySignedStruct;
use rustls::SignatureScheme;
use tokio_rustls::TlsConnector;
use tonic::transport::Certificate;
use tonic::transport::ClientTlsConfig;
use tonic::transport::Identity;
use tracing::debug;
use tracing::info;

use crate::ClientConnType;
use crate::ClientError;
use crate::Result;
use crate::TlsPaths;

/// TLS material a client presents and trusts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsInfo {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
    pub trusted_ca_file: Option<PathBuf>,
    /// Name checked against the server certificate
    pub server_name: String,
    /// Set for self-signed identities: the server's certificate is not verified
    pub insecure_skip_verify: bool,
}

impl TlsInfo {
    /// Fixed, pre-provisioned identity signed by the fixture CA
    pub fn from_fixtures(paths: &TlsPaths) -> Self {
        Self {
            cert_file: paths.cert.clone(),
            key_file: paths.key.clone(),
            trusted_ca_file: Some(paths.ca.clone()),
            server_name: "localhost".to_string(),
            insecure_skip_verify: false,
        }
    }

    /// Build the gRPC client TLS configuration for a verified connection.
    ///
    /// Requires a trust anchor; identities that skip verification go through
    /// [`TlsInfo::skip_verify_connector`] instead.
    pub async fn tonic_config(&self) -> Result<ClientTlsConfig> {
        let ca_file = self.trusted_ca_file.as_ref().ok_or_else(|| {
            ClientError::Tls(format!(
                "no trusted CA for {}, server certificate cannot be verified",
                self.cert_file.display()
            ))
        })?;
        let cert = read_pem(&self.cert_file).await?;
        let key = read_pem(&self.key_file).await?;
        let ca = read_pem(ca_file).await?;

        Ok(ClientTlsConfig::new()
            .domain_name(self.server_name.clone())
            .ca_certificate(Certificate::from_pem(ca))
            .identity(Identity::from_pem(cert, key)))
    }

    /// TLS connector that presents this identity and accepts any server
    /// certificate. Negotiates `h2` so it can carry a gRPC channel.
    pub async fn skip_verify_connector(&self) -> Result<TlsConnector> {
        let certs = parse_certs(&self.cert_file, &read_pem(&self.cert_file).await?)?;
        let key = parse_key(&self.key_file, &read_pem(&self.key_file).await?)?;

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let mut config = RustlsClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert(provider)))
            .with_client_auth_cert(certs, key)?;
        config.alpn_protocols = vec![b"h2".to_vec()];

        Ok(TlsConnector::from(Arc::new(config)))
    }

    /// Build the HTTP client TLS configuration onto `builder`.
    pub async fn apply_to_http(
        &self,
        builder: reqwest::ClientBuilder,
    ) -> Result<reqwest::ClientBuilder> {
        let mut identity_pem = read_pem(&self.cert_file).await?;
        identity_pem.extend(read_pem(&self.key_file).await?);

        let mut builder = builder.identity(reqwest::Identity::from_pem(&identity_pem)?);
        if let Some(ca) = &self.trusted_ca_file {
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&read_pem(ca).await?)?);
        }
        if self.insecure_skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        Ok(builder)
    }
}

async fn read_pem(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| ClientError::Tls(format!("failed to read {}: {}", path.display(), e)).into())
}

fn parse_certs(
    path: &Path,
    pem: &[u8],
) -> Result<Vec<CertificateDer<'static>>> {
    let certs = rustls_pemfile::certs(&mut &pem[..])
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ClientError::Tls(format!("invalid certificate in {}: {}", path.display(), e)))?;
    if certs.is_empty() {
        return Err(ClientError::Tls(format!("no certificate found in {}", path.display())).into());
    }
    Ok(certs)
}

fn parse_key(
    path: &Path,
    pem: &[u8],
) -> Result<PrivateKeyDer<'static>> {
    rustls_pemfile::private_key(&mut &pem[..])
        .map_err(|e| ClientError::Tls(format!("invalid private key in {}: {}", path.display(), e)))?
        .ok_or_else(|| ClientError::Tls(format!("no private key found in {}", path.display())).into())
}

/// Certificate verifier for self-signed servers. The chain is not checked,
/// handshake signatures still are.
#[derive(Debug)]
struct AcceptAnyServerCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

/// Resolve the TLS policy for a connection type.
///
/// - `NonTls` and `TlsAndNonTls`: no TLS, the plain listener is used
/// - `Tls` with auto-TLS: a fresh self-signed identity in `scratch_dir`
/// - `Tls`: the fixture identity
pub fn tls_info(
    conn_type: ClientConnType,
    is_auto_tls: bool,
    scratch_dir: &Path,
    paths: &TlsPaths,
) -> Result<Option<TlsInfo>> {
    match (conn_type, is_auto_tls) {
        (ClientConnType::NonTls, _) | (ClientConnType::TlsAndNonTls, _) => Ok(None),
        (ClientConnType::Tls, true) => self_cert(scratch_dir, vec!["localhost".to_string()]).map(Some),
        (ClientConnType::Tls, false) => Ok(Some(TlsInfo::from_fixtures(paths))),
    }
}

/// Generate a self-signed certificate for `hosts` and write it into `dir`.
pub fn self_cert(
    dir: &Path,
    hosts: Vec<String>,
) -> Result<TlsInfo> {
    info!("Generating self signed certificates in {}", dir.display());
    let CertifiedKey { cert, key_pair } = generate_simple_self_signed(hosts.clone())?;

    std::fs::create_dir_all(dir)?;
    let cert_file = dir.join("cert.pem");
    let key_file = dir.join("key.pem");
    std::fs::write(&cert_file, cert.pem())?;
    std::fs::write(&key_file, key_pair.serialize_pem())?;
    debug!("self signed certificate written to {}", cert_file.display());

    Ok(TlsInfo {
        cert_file,
        key_file,
        trusted_ca_file: None,
        server_name: hosts.into_iter().next().unwrap_or_else(|| "localhost".to_string()),
        insecure_skip_verify: true,
    })
}
