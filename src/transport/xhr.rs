//! Adapter for the open/send (XMLHttpRequest-style) request API.
//!
//! [`XhrAdapter::create`] plays the role of the request constructor: every
//! [`MockXhr`] it hands out captures the URL on `open`, and on `send` either
//! answers from the registry or forwards to the original transport.

use super::{header_value, Request, XhrTransport};
use crate::delay::schedule;
use crate::error::MockError;
use crate::registry::MockRegistry;
use crate::response::cast_to_string;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Request lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyState {
    #[default]
    Unsent = 0,
    Opened = 1,
    HeadersReceived = 2,
    Loading = 3,
    Done = 4,
}

/// Result of a real round-trip through an [`XhrTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XhrResponse {
    pub status: u16,
    pub status_text: String,
    pub response_text: String,
    pub response_url: String,
    pub headers: HashMap<String, String>,
}

/// Observable fields of a request object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XhrState {
    pub ready_state: ReadyState,
    pub status: u16,
    pub status_text: String,
    pub response: Value,
    pub response_text: String,
    pub response_url: String,
    pub timeout: u64,
    pub response_headers: HashMap<String, String>,
    /// Custom properties injected by the mock entry
    pub properties: HashMap<String, Value>,
}

impl XhrState {
    /// Completed, successful state carrying a mocked value.
    pub fn mocked(url: impl Into<String>, response: Value) -> Self {
        Self {
            ready_state: ReadyState::Done,
            status: 200,
            status_text: "OK".to_string(),
            response_text: cast_to_string(&response),
            response,
            response_url: url.into(),
            timeout: 0,
            response_headers: HashMap::new(),
            properties: HashMap::new(),
        }
    }

    /// Completed state from a real response.
    pub fn from_network(response: XhrResponse) -> Self {
        Self {
            ready_state: ReadyState::Done,
            status: response.status,
            status_text: response.status_text,
            response: Value::String(response.response_text.clone()),
            response_text: response.response_text,
            response_url: response.response_url,
            timeout: 0,
            response_headers: response.headers,
            properties: HashMap::new(),
        }
    }

    /// Apply `response_properties` overrides.
    pub fn apply_properties(&mut self, properties: &HashMap<String, Value>) {
        for (name, value) in properties {
            match (name.as_str(), value) {
                ("status", Value::Number(n)) => match n.as_u64().and_then(|s| u16::try_from(s).ok()) {
                    Some(status) => self.status = status,
                    None => {
                        self.properties.insert(name.clone(), value.clone());
                    }
                },
                ("statusText", Value::String(s)) => self.status_text = s.clone(),
                ("responseURL" | "responseUrl", Value::String(s)) => self.response_url = s.clone(),
                ("timeout", Value::Number(n)) => match n.as_u64() {
                    Some(timeout) => self.timeout = timeout,
                    None => {
                        self.properties.insert(name.clone(), value.clone());
                    }
                },
                ("headers", Value::Object(headers)) => {
                    for (header, value) in headers {
                        self.response_headers.insert(header.clone(), header_value(value));
                    }
                }
                _ => {
                    self.properties.insert(name.clone(), value.clone());
                }
            }
        }
    }
}

/// Callback fired when a request completes.
pub type ReadyStateCallback = Arc<dyn Fn(&XhrState) + Send + Sync>;

/// Factory for mock-aware request objects.
pub struct XhrAdapter {
    registry: Arc<MockRegistry>,
    original: Arc<dyn XhrTransport>,
}

impl XhrAdapter {
    /// Wrap `original` with mocks from `registry`.
    pub fn new(registry: Arc<MockRegistry>, original: Arc<dyn XhrTransport>) -> Self {
        Self { registry, original }
    }

    /// Create a new request object.
    pub fn create(&self) -> MockXhr {
        MockXhr {
            registry: self.registry.clone(),
            original: self.original.clone(),
            request: None,
            state: XhrState::default(),
            on_ready_state_change: None,
        }
    }

    /// The wrapped, unmocked transport.
    pub fn original(&self) -> Arc<dyn XhrTransport> {
        self.original.clone()
    }

    /// The registry consulted for mocks.
    pub fn registry(&self) -> &Arc<MockRegistry> {
        &self.registry
    }
}

/// A single request object.
pub struct MockXhr {
    registry: Arc<MockRegistry>,
    original: Arc<dyn XhrTransport>,
    request: Option<Request>,
    state: XhrState,
    on_ready_state_change: Option<ReadyStateCallback>,
}

impl MockXhr {
    /// Capture the method and target URL.
    pub fn open(&mut self, method: &str, url: &str) {
        self.request = Some(Request::new(url).with_method(method));
        self.state = XhrState {
            ready_state: ReadyState::Opened,
            ..Default::default()
        };
    }

    /// Add a request header. Must follow `open`.
    pub fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), MockError> {
        let request = self.request.as_mut().ok_or(MockError::NotOpened)?;
        request.headers.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Register the completion callback.
    pub fn on_ready_state_change<F>(&mut self, callback: F)
    where
        F: Fn(&XhrState) + Send + Sync + 'static,
    {
        self.on_ready_state_change = Some(Arc::new(callback));
    }

    /// Send the request.
    ///
    /// Mocked requests complete with a synthetic 200 and fire the callback
    /// inline, or after the entry's delay. Errors from a dynamic response
    /// function are returned here and the callback never fires.
    pub async fn send(&mut self, body: Option<&str>) -> Result<(), MockError> {
        let mut request = self.request.clone().ok_or(MockError::NotOpened)?;
        request.body = body.map(str::to_string);

        let resolved = self.registry.resolve(&request.url, body).await?;

        match resolved {
            Some(resolved) => {
                self.registry.stats().record_mocked();
                if self.registry.settings().log_matches {
                    info!(
                        method = %request.method,
                        url = %request.url,
                        key = %resolved.matched.key,
                        delay_ms = resolved.delay_ms,
                        "XHR matched mock"
                    );
                }

                let mut state = XhrState::mocked(&request.url, resolved.response);
                state.apply_properties(&resolved.response_properties);
                self.state = state.clone();

                if let Some(callback) = self.on_ready_state_change.clone() {
                    schedule(resolved.delay_ms, move || callback(&state));
                }
            }
            None => {
                self.registry.stats().record_passthrough();
                if self.registry.settings().log_unmatched {
                    warn!(method = %request.method, url = %request.url, "XHR passed through");
                }

                let response = self.original.send(request).await?;
                self.state = XhrState::from_network(response);

                if let Some(callback) = &self.on_ready_state_change {
                    callback(&self.state);
                }
            }
        }

        Ok(())
    }

    /// Snapshot of all observable fields.
    pub fn state(&self) -> &XhrState {
        &self.state
    }

    pub fn ready_state(&self) -> ReadyState {
        self.state.ready_state
    }

    pub fn status(&self) -> u16 {
        self.state.status
    }

    pub fn status_text(&self) -> &str {
        &self.state.status_text
    }

    pub fn response(&self) -> &Value {
        &self.state.response
    }

    pub fn response_text(&self) -> &str {
        &self.state.response_text
    }

    pub fn response_url(&self) -> &str {
        &self.state.response_url
    }

    pub fn timeout(&self) -> u64 {
        self.state.timeout
    }

    /// A custom property injected through `response_properties`.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.state.properties.get(name)
    }
}
