use std::time::Duration;

use rcgen::generate_simple_self_signed;
use rcgen::CertifiedKey;
use tokio::net::TcpListener;
use tonic::codegen::http::Uri;
use tonic::service::Routes;
use tonic::transport::server::TcpIncoming;
use tonic::transport::Identity;
use tonic::transport::Server;
use tonic::transport::ServerTlsConfig;

use super::v3::tls_connect;
use super::*;
use crate::ClientConnType;
use crate::ClientError;
use crate::Error;
use crate::TlsPaths;

/// Serve TLS with a freshly generated identity nobody else knows about.
/// Every RPC answers `Unimplemented`.
async fn spawn_self_signed_server() -> u16 {
    let CertifiedKey { cert, key_pair } = generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let incoming = TcpIncoming::from_listener(listener, true, None).unwrap();

    let mut server = Server::builder()
        .tls_config(ServerTlsConfig::new().identity(Identity::from_pem(cert.pem(), key_pair.serialize_pem())))
        .unwrap();
    let router = server.add_routes(Routes::default());
    tokio::spawn(router.serve_with_incoming(incoming));
    port
}

fn short_dial() -> ClientConfig {
    ClientConfig {
        dial_timeout: Duration::from_secs(2),
        ..ClientConfig::default()
    }
}

#[tokio::test]
async fn test_auto_tls_client_reaches_server_with_unknown_certificate() {
    let port = spawn_self_signed_server().await;
    let dir = tempfile::tempdir().unwrap();
    let factory = ClientFactory::new(dir.path().to_path_buf(), TlsPaths::under(dir.path())).set_config(short_dial());

    let client = factory
        .new_client(&[format!("https://127.0.0.1:{port}")], ClientConnType::Tls, true)
        .await
        .unwrap();

    assert_eq!(client.endpoint(), format!("http://127.0.0.1:{port}"));
    match client.member_list().await {
        Err(Error::Client(ClientError::Status(status))) => {
            assert_eq!(status.code(), tonic::Code::Unimplemented);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_verified_client_rejects_server_outside_trust_anchor() {
    let port = spawn_self_signed_server().await;
    let dir = tempfile::tempdir().unwrap();
    let mut info = self_cert(dir.path(), vec!["localhost".to_string()]).unwrap();
    info.trusted_ca_file = Some(info.cert_file.clone());
    info.insecure_skip_verify = false;

    let result = V3Client::connect(&[format!("127.0.0.1:{port}")], Some(&info), &short_dial()).await;

    assert!(matches!(result, Err(Error::Client(ClientError::Connect { .. }))));
}

#[tokio::test]
async fn test_tls_connect_reports_refused_port() {
    let dir = tempfile::tempdir().unwrap();
    let info = self_cert(dir.path(), vec!["localhost".to_string()]).unwrap();
    let tls = info.skip_verify_connector().await.unwrap();

    let result = tls_connect(tls, Uri::from_static("http://127.0.0.1:1")).await;

    assert!(result.is_err());
}
