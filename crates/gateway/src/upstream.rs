// crates/gateway/src/upstream.rs
//! Upstream content API transport

use crate::error::{GatewayError, GatewayResult};
use contentguard_config::UpstreamSettings;
use reqwest::Client as ReqwestClient;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// A source of JSON documents addressed by path
///
/// Implementations report failures through [`GatewayError`] so that the
/// retry strategy and circuit breaker can classify them.
pub trait Upstream: Send + Sync {
    fn fetch(&self, path: &str) -> impl Future<Output = GatewayResult<Value>> + Send;
}

/// [`Upstream`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    inner: ReqwestClient,
    base_url: String,
    timeout: Duration,
}

impl HttpUpstream {
    /// Builds a client from the upstream config section
    pub fn new(settings: &UpstreamSettings) -> GatewayResult<Self> {
        let timeout = Duration::from_millis(settings.timeout_ms);
        let inner = ReqwestClient::builder()
            .timeout(timeout)
            .user_agent(&settings.user_agent)
            .build()
            .map_err(GatewayError::Http)?;

        Self::with_client(inner, &settings.base_url, timeout)
    }

    /// Wraps an existing client
    pub fn with_client(
        inner: ReqwestClient,
        base_url: &str,
        timeout: Duration,
    ) -> GatewayResult<Self> {
        let base_url = base_url.trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(GatewayError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            inner,
            base_url: base_url.to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full request URL for `path`
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn transport_error(&self, path: &str, error: reqwest::Error) -> GatewayError {
        if error.is_timeout() {
            GatewayError::Timeout {
                endpoint: path.to_string(),
                after: self.timeout,
            }
        } else if error.is_connect() {
            GatewayError::Unreachable {
                endpoint: path.to_string(),
                message: error.to_string(),
            }
        } else {
            GatewayError::Http(error)
        }
    }
}

impl Upstream for HttpUpstream {
    async fn fetch(&self, path: &str) -> GatewayResult<Value> {
        let url = self.url(path);
        log::debug!("GET {}", url);

        let response = self
            .inner
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(path, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                endpoint: path.to_string(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.transport_error(path, e)
                } else {
                    GatewayError::Decode {
                        endpoint: path.to_string(),
                        message: e.to_string(),
                    }
                }
            })
    }
}
