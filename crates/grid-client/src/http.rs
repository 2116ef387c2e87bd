//! # Grid HTTP Transport
//!
//! `GridTransport` over the Grid REST API.
//!
//! Every request carries `Authorization: Bearer <key>` and
//! `x-grid-environment`. JSON bodies are additionally signed with the
//! session secrets (`x-grid-session-id`, `x-grid-signature`). Non-2xx
//! responses are parsed as `{message, ...details}` and handed back as a
//! [`RawFailure`] with the HTTP status for the classifier.

use crate::config::GridConfig;
use crate::holder::ClientFactory;
use crate::session::SessionSecrets;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grid_core::{
    ApiMethod, ApiRequest, BoxedTransport, Failure, GridError, GridTransport, RawFailure,
};
use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Hard ceiling on a single HTTP exchange; the executor's timeout is
/// normally shorter.
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

pub const ENVIRONMENT_HEADER: &str = "x-grid-environment";
pub const SESSION_HEADER: &str = "x-grid-session-id";
pub const SIGNATURE_HEADER: &str = "x-grid-signature";

/// reqwest-backed Grid transport
pub struct HttpTransport {
    config: GridConfig,
    secrets: SessionSecrets,
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport for the configured endpoint.
    pub fn new(config: GridConfig, secrets: SessionSecrets) -> Result<Self, Failure> {
        let base_url = Url::parse(config.base_url()).map_err(|e| {
            GridError::config(format!("invalid Grid base URL {}: {}", config.base_url(), e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(GridError::config(format!(
                "Grid base URL cannot carry paths: {}",
                base_url
            ))
            .into());
        }

        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| RawFailure::new(format!("network error: failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            secrets,
            client,
            base_url,
        })
    }

    fn url_for(&self, request: &ApiRequest) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(request.segments.iter());
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        url
    }

    /// Send the request and return status + raw body text
    async fn exchange(&self, request: &ApiRequest) -> Result<(StatusCode, HeaderMap, String), Failure> {
        let url = self.url_for(request);

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), url)
            .header(AUTHORIZATION, self.config.auth_header())
            .header(ENVIRONMENT_HEADER, self.config.environment.as_str());

        if let Some(body) = &request.body {
            let bytes = serde_json::to_vec(body).map_err(|e| {
                GridError::unknown(format!("failed to encode request body: {}", e))
            })?;
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .header(SESSION_HEADER, self.secrets.session_id().to_string())
                .header(SIGNATURE_HEADER, self.secrets.sign(&bytes))
                .body(bytes);
        }

        let response = builder.send().await.map_err(transport_failure)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(transport_failure)?;

        Ok((status, headers, body))
    }
}

#[async_trait]
impl GridTransport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path()))]
    async fn send(&self, request: ApiRequest) -> Result<Value, Failure> {
        let (status, headers, body) = self.exchange(&request).await?;

        if !status.is_success() {
            error!("Grid API error: status={}, body={}", status, body);
            return Err(error_failure(status, &headers, &body).into());
        }

        debug!("Grid API success: status={}", status);
        parse_body(&body)
    }

    async fn probe(&self) -> Result<(), Failure> {
        let (status, headers, body) = self.exchange(&ApiRequest::get(["health"])).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(error_failure(status, &headers, &body).into())
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Production [`ClientFactory`]: one `HttpTransport` per initialization
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpClientFactory;

#[async_trait]
impl ClientFactory for HttpClientFactory {
    async fn connect(
        &self,
        config: &GridConfig,
        secrets: &SessionSecrets,
    ) -> Result<BoxedTransport, Failure> {
        let transport = HttpTransport::new(config.clone(), secrets.clone())?;
        Ok(Arc::new(transport))
    }
}

fn to_reqwest_method(method: ApiMethod) -> Method {
    match method {
        ApiMethod::Get => Method::GET,
        ApiMethod::Post => Method::POST,
        ApiMethod::Patch => Method::PATCH,
        ApiMethod::Delete => Method::DELETE,
    }
}

fn transport_failure(e: reqwest::Error) -> RawFailure {
    if e.is_timeout() {
        RawFailure::new(format!("timeout: {}", e))
    } else {
        RawFailure::new(format!("network error: {}", e))
    }
}

/// `Retry-After` as delta-seconds or an HTTP-date. A date in the past
/// means no wait.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    retry_after_at(value, Utc::now())
}

fn retry_after_at(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

/// Build the raw failure for a non-2xx response
fn error_failure(status: StatusCode, headers: &HeaderMap, body: &str) -> RawFailure {
    let details: Option<Value> = serde_json::from_str(body).ok();

    // Grid answers either `{message}` or `{error: {code, message}}`
    let message = details
        .as_ref()
        .and_then(|d| {
            d.get("message")
                .or_else(|| d.get("error").and_then(|e| e.get("message")))
        })
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )
        });

    RawFailure {
        status_code: Some(status.as_u16()),
        message,
        details,
        retry_after: parse_retry_after(headers),
    }
}

fn parse_body(body: &str) -> Result<Value, Failure> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| {
        GridError::unknown(format!("failed to parse Grid response: {}", e)).into()
    })
}
