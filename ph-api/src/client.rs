//! HTTP client for the content server.
//!
//! Handles the base address, custom headers, timeout and TLS settings, and
//! the request/response lifecycle. Requests are sent exactly once: a failed
//! fetch falls back to the local store and a failed delivery stays queued,
//! so nothing here retries.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use ph_core::config::{AppConfig, ContentConfig, ServerConfig, SubmissionConfig};
use ph_core::error::{PhError, PhResult};

/// Resource paths, relative to the server address.
#[derive(Debug, Clone)]
pub struct Routes {
    pub timeline: String,
    pub stories: String,
    pub benefits: String,
    pub probe: String,
    pub submit: String,
}

impl Routes {
    pub fn new(content: &ContentConfig, submission: &SubmissionConfig) -> Self {
        Self {
            timeline: content.timeline_path.clone(),
            stories: content.stories_path.clone(),
            benefits: content.benefits_path.clone(),
            probe: content.probe_path.clone(),
            submit: submission.endpoint_path.clone(),
        }
    }
}

impl Default for Routes {
    fn default() -> Self {
        Self::new(&ContentConfig::default(), &SubmissionConfig::default())
    }
}

/// HTTP client for the content and submission endpoints.
#[derive(Clone)]
pub struct ApiClient {
    inner: Client,
    /// Sanitized server address (scheme + host + optional base path).
    base: String,
    routes: Routes,
    custom_headers: Vec<(String, String)>,
}

impl ApiClient {
    /// Create a client from server settings with default resource paths.
    pub fn new(config: &ServerConfig) -> PhResult<Self> {
        Self::with_routes(config, Routes::default())
    }

    /// Create a client from the full application configuration.
    pub fn from_config(config: &AppConfig) -> PhResult<Self> {
        Self::with_routes(
            &config.server,
            Routes::new(&config.content, &config.submission),
        )
    }

    pub fn with_routes(config: &ServerConfig, routes: Routes) -> PhResult<Self> {
        let base = AppConfig::sanitize_server_address(&config.address);
        if base.is_empty() {
            return Err(PhError::MissingConfig("server.address".into()));
        }

        let mut builder = Client::builder()
            .timeout(Duration::from_millis(config.api_timeout_ms))
            .connect_timeout(Duration::from_secs(15))
            .pool_max_idle_per_host(5);

        if config.accept_self_signed_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let inner = builder
            .build()
            .map_err(|e| PhError::Network(format!("failed to build HTTP client: {e}")))?;

        let custom_headers = config
            .custom_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            inner,
            base,
            routes,
            custom_headers,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    /// Full URL for a resource path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.inner.request(method, self.url(path));
        for (key, value) in &self.custom_headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> PhResult<Response> {
        builder.send().await.map_err(Self::classify_error)
    }

    /// GET a path and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> PhResult<T> {
        debug!("GET {path}");
        let response = self.send(self.build_request(Method::GET, path)).await?;
        let response = Self::check_status(response).await?;
        Self::decode(response).await
    }

    /// POST a JSON body. Any 2xx is success; the response body is ignored.
    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> PhResult<()> {
        debug!("POST {path}");
        let response = self
            .send(self.build_request(Method::POST, path).json(body))
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Probe the server. Any answer below 500 counts as reachable; returns
    /// the round-trip latency.
    pub async fn health_check(&self) -> PhResult<Duration> {
        let start = tokio::time::Instant::now();
        let response = self
            .send(self.build_request(Method::GET, &self.routes.probe))
            .await?;
        let status = response.status();
        if status.is_server_error() {
            return Err(PhError::ServerError {
                status: status.as_u16(),
                message: "probe failed".into(),
            });
        }
        Ok(start.elapsed())
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> PhResult<T> {
        let body = response
            .text()
            .await
            .map_err(|e| PhError::Network(format!("failed to read response body: {e}")))?;
        serde_json::from_str(&body).map_err(|e| PhError::Decode(e.to_string()))
    }

    /// Convert a non-2xx status into `PhError::ServerError`.
    async fn check_status(response: Response) -> PhResult<Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PhError::ServerError {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(response)
    }

    /// Classify a reqwest error into a PhError variant.
    fn classify_error(e: reqwest::Error) -> PhError {
        if e.is_timeout() {
            PhError::Timeout(e.to_string())
        } else if e.is_connect() {
            PhError::Network(format!("connection failed: {e}"))
        } else {
            PhError::Network(e.to_string())
        }
    }
}
