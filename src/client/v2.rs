use reqwest::Method;
use reqwest::Response;
use serde::Deserialize;
use tracing::debug;
use tracing::warn;

use super::v3::dial_target;
use super::ClientConfig;
use super::TlsInfo;
use crate::ClientError;
use crate::Result;

/// Member record as served by the HTTP members endpoint
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct V2Member {
    pub id: String,
    pub name: String,
    #[serde(rename = "peerURLs", default)]
    pub peer_urls: Vec<String>,
    #[serde(rename = "clientURLs", default)]
    pub client_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct V2Members {
    members: Vec<V2Member>,
}

/// HTTP/JSON client over the cluster's client URLs
///
/// Requests go to the endpoints in order; the first endpoint that answers
/// serves the request.
#[derive(Debug, Clone)]
pub struct V2Client {
    http: reqwest::Client,
    endpoints: Vec<String>,
}

impl V2Client {
    pub async fn new(
        endpoints: &[String],
        tls: Option<&TlsInfo>,
        config: &ClientConfig,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .connect_timeout(config.dial_timeout)
            .timeout(config.dial_timeout)
            .tcp_keepalive(config.tcp_keepalive);
        if let Some(info) = tls {
            builder = info.apply_to_http(builder).await?;
        }

        Ok(Self {
            http: builder.build()?,
            endpoints: endpoints
                .iter()
                .map(|ep| dial_target(ep, tls.is_some()))
                .collect(),
        })
    }

    /// Store `value` under `key`
    pub async fn set(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let path = format!("/v2/keys/{}", key.trim_start_matches('/'));
        let form = [("value", value.to_string())];
        self.send(Method::PUT, &path, Some(&form[..])).await?.error_for_status()?;
        Ok(())
    }

    pub async fn members(&self) -> Result<Vec<V2Member>> {
        let response = self.send(Method::GET, "/v2/members", None).await?.error_for_status()?;
        Ok(response.json::<V2Members>().await?.members)
    }

    /// Raw body of the `/version` endpoint
    pub async fn version(&self) -> Result<String> {
        self.get_text("/version").await
    }

    pub async fn get_text(
        &self,
        path: &str,
    ) -> Result<String> {
        let response = self.send(Method::GET, path, None).await?.error_for_status()?;
        Ok(response.text().await?)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        form: Option<&[(&str, String)]>,
    ) -> Result<Response> {
        let mut last_err = None;
        for ep in &self.endpoints {
            let url = format!("{}{}", ep.trim_end_matches('/'), path);
            let mut request = self.http.request(method.clone(), &url);
            if let Some(form) = form {
                request = request.form(form);
            }
            match request.send().await {
                Ok(response) => {
                    debug!("{} {} -> {}", method, url, response.status());
                    return Ok(response);
                }
                Err(e) => {
                    warn!("{} {} failed: {}", method, url, e);
                    last_err = Some(e);
                }
            }
        }

        Err(match last_err {
            Some(e) => e.into(),
            None => ClientError::Connect {
                endpoints: self.endpoints.clone(),
                reason: "no endpoints".to_string(),
            }
            .into(),
        })
    }
}
