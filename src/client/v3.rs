use std::io;

use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tonic::async_trait;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::codegen::http::Uri;
use tonic::transport::Channel;
use tonic::transport::ClientTlsConfig;
use tonic::transport::Endpoint;
use tracing::debug;
use tracing::warn;

use super::ClientConfig;
use super::KvPutter;
use super::MemberLister;
use super::TlsInfo;
use crate::proto::MemberListRequest;
use crate::proto::MemberListResponse;
use crate::proto::PutRequest;
use crate::proto::PutResponse;
use crate::proto::CLUSTER_MEMBER_LIST_PATH;
use crate::proto::KV_PUT_PATH;
use crate::ClientError;
use crate::Result;

/// How the channel secures its connection
enum DialTls {
    Plain,
    Verified(ClientTlsConfig),
    /// Self-signed servers: TLS is done by our own connector
    SkipVerify(TlsConnector),
}

/// gRPC client bound to one cluster endpoint
#[derive(Debug, Clone)]
pub struct V3Client {
    channel: Channel,
    endpoint: String,
}

impl V3Client {
    /// Dial `endpoints` in order and keep the first connection that
    /// completes. Each attempt is bounded by the configured dial timeout.
    pub async fn connect(
        endpoints: &[String],
        tls: Option<&TlsInfo>,
        config: &ClientConfig,
    ) -> Result<Self> {
        let dial_tls = match tls {
            None => DialTls::Plain,
            Some(info) if info.insecure_skip_verify => DialTls::SkipVerify(info.skip_verify_connector().await?),
            Some(info) => DialTls::Verified(info.tonic_config().await?),
        };

        let mut reason = "no endpoints".to_string();
        for ep in endpoints {
            // tonic refuses https URIs without its own TLS config, so the
            // skip-verify connector is dialed over an http URI.
            let target = dial_target(ep, matches!(dial_tls, DialTls::Verified(_)));
            let mut endpoint = Endpoint::from_shared(target.clone())
                .map_err(|_| ClientError::InvalidEndpoint(target.clone()))?
                .connect_timeout(config.dial_timeout)
                .tcp_keepalive(Some(config.tcp_keepalive))
                .http2_keep_alive_interval(config.http2_keepalive_interval);
            if let DialTls::Verified(tls_config) = &dial_tls {
                endpoint = endpoint.tls_config(tls_config.clone())?;
            }

            let connecting = async {
                match &dial_tls {
                    DialTls::SkipVerify(tls) => {
                        let tls = tls.clone();
                        endpoint
                            .connect_with_connector(tower::service_fn(move |uri: Uri| tls_connect(tls.clone(), uri)))
                            .await
                    }
                    _ => endpoint.connect().await,
                }
            };

            match tokio::time::timeout(config.dial_timeout, connecting).await {
                Ok(Ok(channel)) => {
                    debug!("connected to {}", target);
                    return Ok(Self {
                        channel,
                        endpoint: target,
                    });
                }
                Ok(Err(e)) => {
                    warn!("connect to {} failed: {}", target, e);
                    reason = e.to_string();
                }
                Err(_) => {
                    warn!("connect to {} timed out after {:?}", target, config.dial_timeout);
                    reason = format!("dial timed out after {:?}", config.dial_timeout);
                }
            }
        }

        Err(ClientError::Connect {
            endpoints: endpoints.to_vec(),
            reason,
        }
        .into())
    }

    /// Endpoint the client is connected to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn put(
        &self,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<PutResponse> {
        self.unary(PutRequest::new(key, value), KV_PUT_PATH).await
    }

    pub async fn member_list(&self) -> Result<MemberListResponse> {
        self.unary(MemberListRequest { linearizable: true }, CLUSTER_MEMBER_LIST_PATH)
            .await
    }

    async fn unary<Req, Resp>(
        &self,
        request: Req,
        path: &'static str,
    ) -> Result<Resp>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| tonic::Status::unknown(format!("Service was not ready: {}", e)))?;

        let codec = ProstCodec::<Req, Resp>::default();
        let response = grpc
            .unary(tonic::Request::new(request), PathAndQuery::from_static(path), codec)
            .await?;
        Ok(response.into_inner())
    }
}

#[async_trait]
impl KvPutter for V3Client {
    async fn put(
        &self,
        key: String,
        value: String,
    ) -> Result<()> {
        V3Client::put(self, key, value).await.map(|_| ())
    }
}

#[async_trait]
impl MemberLister for V3Client {
    async fn member_list(&self) -> Result<MemberListResponse> {
        V3Client::member_list(self).await
    }
}

/// Open a TCP connection to `uri` and run the TLS handshake over it.
pub(crate) async fn tls_connect(
    tls: TlsConnector,
    uri: Uri,
) -> io::Result<TokioIo<tokio_rustls::client::TlsStream<TcpStream>>> {
    let host = uri
        .host()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("no host in {uri}")))?
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string();
    let port = uri.port_u16().unwrap_or(443);

    let tcp = TcpStream::connect((host.as_str(), port)).await?;
    let server_name = ServerName::try_from(host).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let stream = tls.connect(server_name, tcp).await?;
    debug!("TLS handshake with {} done", uri);
    Ok(TokioIo::new(stream))
}

/// Normalize an endpoint into a dialable URI: add a scheme when missing and
/// switch `http` to `https` when TLS is in use.
pub(crate) fn dial_target(
    endpoint: &str,
    tls: bool,
) -> String {
    let scheme = if tls { "https" } else { "http" };
    match endpoint.split_once("://") {
        Some(("http", rest)) | Some(("https", rest)) => format!("{scheme}://{rest}"),
        Some(_) => endpoint.to_string(),
        None => format!("{scheme}://{endpoint}"),
    }
}
