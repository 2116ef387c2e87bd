//! # Grid Transport Trait
//!
//! The seam between the service facade and the wire. The facade builds an
//! [`ApiRequest`]; a transport sends it and hands back the JSON body or a
//! [`Failure`] for the classifier.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   GridTransport (trait)                     │
//! │  ├── send()                                                 │
//! │  ├── probe()                                                │
//! │  └── name()                                                 │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!              ┌─────────────┴─────────────┐
//!              │                           │
//!     ┌────────┴────────┐         ┌────────┴────────┐
//!     │  HttpTransport  │         │ScriptedTransport│
//!     │    (reqwest)    │         │     (tests)     │
//!     └─────────────────┘         └─────────────────┘
//! ```

use crate::classify::Failure;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// HTTP verb of a Grid call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl ApiMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMethod::Get => "GET",
            ApiMethod::Post => "POST",
            ApiMethod::Patch => "PATCH",
            ApiMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transport-agnostic Grid request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: ApiMethod,
    /// Path segments below the base URL, unescaped
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new<I, S>(method: ApiMethod, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ApiMethod::Get, segments)
    }

    pub fn post<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ApiMethod::Post, segments)
    }

    pub fn patch<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ApiMethod::Patch, segments)
    }

    pub fn delete<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ApiMethod::Delete, segments)
    }

    /// Builder: attach a JSON body
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Builder: append a query parameter when a value is present
    pub fn with_query(mut self, key: &str, value: Option<impl ToString>) -> Self {
        if let Some(value) = value {
            self.query.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Slash-joined path, for logging
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Core trait for Grid transports.
#[async_trait]
pub trait GridTransport: Send + Sync {
    /// Send a request and return the decoded JSON body of a 2xx response.
    async fn send(&self, request: ApiRequest) -> Result<Value, Failure>;

    /// Cheap reachability check used by health polling.
    async fn probe(&self) -> Result<(), Failure>;

    /// Transport name (for logging).
    fn name(&self) -> &'static str;
}

/// Type alias for a shared transport (dynamic dispatch)
pub type BoxedTransport = Arc<dyn GridTransport>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::RawFailure;
    use serde_json::json;

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::get(["accounts", "acc_1", "transactions"])
            .with_query("limit", Some(20))
            .with_query("status", None::<String>);

        assert_eq!(request.method, ApiMethod::Get);
        assert_eq!(request.path(), "/accounts/acc_1/transactions");
        assert_eq!(request.query, vec![("limit".to_string(), "20".to_string())]);
        assert!(request.body.is_none());
    }

    struct EchoTransport;

    #[async_trait]
    impl GridTransport for EchoTransport {
        async fn send(&self, request: ApiRequest) -> Result<Value, Failure> {
            Ok(json!({"method": request.method.as_str(), "path": request.path()}))
        }

        async fn probe(&self) -> Result<(), Failure> {
            Err(RawFailure::new("network error: unreachable").into())
        }

        fn name(&self) -> &'static str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_boxed_transport_dispatch() {
        let transport: BoxedTransport = Arc::new(EchoTransport);

        let body = transport
            .send(ApiRequest::delete(["accounts", "acc_1", "spending-limits", "lim_1"]))
            .await
            .unwrap();
        assert_eq!(body["method"], "DELETE");
        assert_eq!(body["path"], "/accounts/acc_1/spending-limits/lim_1");

        assert!(transport.probe().await.is_err());
        assert_eq!(transport.name(), "echo");
    }

    #[test]
    fn test_request_body() {
        let request = ApiRequest::post(["accounts"]).with_body(json!({"type": "email"}));
        assert_eq!(request.method.as_str(), "POST");
        assert_eq!(request.body, Some(json!({"type": "email"})));
    }
}
