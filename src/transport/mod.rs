//! Transport adapters.
//!
//! Each adapter wraps an injected "real" transport for one request API and
//! answers mocked URLs from the registry instead of calling through.
//!
//! - [`fetch`]: single-call API returning a response future
//! - [`xhr`]: open/send lifecycle with a ready-state callback
//! - [`http`]: a real transport backed by `reqwest`

pub mod fetch;
pub mod http;
pub mod xhr;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::MockError;

pub use fetch::{FetchAdapter, FetchResponse, ResponseBody};
pub use http::ReqwestTransport;
pub use xhr::{MockXhr, ReadyState, XhrAdapter, XhrResponse, XhrState};

/// An outgoing request as seen by the adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method
    pub method: String,
    /// Target URL
    pub url: String,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Request body, if any
    pub body: Option<String>,
}

impl Request {
    /// A GET request to `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Set the method.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Single-call request API.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Perform the request.
    async fn fetch(&self, request: Request) -> Result<FetchResponse, MockError>;
}

/// Transport behind the open/send request API.
#[async_trait]
pub trait XhrTransport: Send + Sync {
    /// Perform the request once `send` is called.
    async fn send(&self, request: Request) -> Result<XhrResponse, MockError>;
}

/// Header value as a string, with JSON strings unquoted.
pub(crate) fn header_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
