//! Adapter for the single-call (fetch-style) request API.

use super::{header_value, Fetch, Request};
use crate::delay::resolve_after;
use crate::error::MockError;
use crate::registry::MockRegistry;
use crate::response::{cast_to_string, ResolvedMock};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Body of a [`FetchResponse`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Mocked value
    Json(Value),
    /// Text received from the network
    Text(String),
}

/// Response returned by a [`Fetch`] implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub ok: bool,
    pub redirected: bool,
    pub response_type: String,
    pub headers: HashMap<String, String>,
    /// Custom properties injected by the mock entry
    pub properties: HashMap<String, Value>,
    pub body: ResponseBody,
}

impl FetchResponse {
    /// Synthetic 200 response carrying a mocked value.
    pub fn mocked(url: impl Into<String>, body: Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("status".to_string(), "200".to_string());

        Self {
            url: url.into(),
            status: 200,
            status_text: String::new(),
            ok: true,
            redirected: false,
            response_type: "basic".to_string(),
            headers,
            properties: HashMap::new(),
            body: ResponseBody::Json(body),
        }
    }

    /// Response built from a real network round-trip.
    pub fn network(
        url: impl Into<String>,
        status: u16,
        status_text: impl Into<String>,
        headers: HashMap<String, String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            status,
            status_text: status_text.into(),
            ok: (200..300).contains(&status),
            redirected: false,
            response_type: "basic".to_string(),
            headers,
            properties: HashMap::new(),
            body: ResponseBody::Text(text.into()),
        }
    }

    /// Body as text. Mocked non-string values are JSON-serialized.
    pub fn text(&self) -> String {
        match &self.body {
            ResponseBody::Json(value) => cast_to_string(value),
            ResponseBody::Text(text) => text.clone(),
        }
    }

    /// Body as JSON. Mocked values are returned as stored.
    pub fn json(&self) -> Result<Value, MockError> {
        match &self.body {
            ResponseBody::Json(value) => Ok(value.clone()),
            ResponseBody::Text(text) => Ok(serde_json::from_str(text)?),
        }
    }

    /// A custom property injected through `response_properties`.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Apply `response_properties` overrides.
    ///
    /// Known fields are overwritten, `headers` is merged into the header
    /// map and anything else is kept as a custom property.
    pub fn apply_properties(&mut self, properties: &HashMap<String, Value>) {
        for (name, value) in properties {
            match (name.as_str(), value) {
                ("status", Value::Number(n)) => match n.as_u64().and_then(|s| u16::try_from(s).ok()) {
                    Some(status) => {
                        self.status = status;
                        self.ok = (200..300).contains(&status);
                    }
                    None => {
                        self.properties.insert(name.clone(), value.clone());
                    }
                },
                ("statusText", Value::String(s)) => self.status_text = s.clone(),
                ("ok", Value::Bool(b)) => self.ok = *b,
                ("redirected", Value::Bool(b)) => self.redirected = *b,
                ("type", Value::String(s)) => self.response_type = s.clone(),
                ("url", Value::String(s)) => self.url = s.clone(),
                ("headers", Value::Object(headers)) => {
                    for (header, value) in headers {
                        self.headers.insert(header.clone(), header_value(value));
                    }
                }
                _ => {
                    self.properties.insert(name.clone(), value.clone());
                }
            }
        }
    }

    fn from_resolved(url: &str, resolved: ResolvedMock) -> Self {
        let mut response = Self::mocked(url, resolved.response);
        response.apply_properties(&resolved.response_properties);
        response
    }
}

/// Fetch decorator that answers mocked URLs from the registry.
///
/// Unmocked requests go to the wrapped transport unchanged.
pub struct FetchAdapter {
    registry: Arc<MockRegistry>,
    original: Arc<dyn Fetch>,
}

impl FetchAdapter {
    /// Wrap `original` with mocks from `registry`.
    pub fn new(registry: Arc<MockRegistry>, original: Arc<dyn Fetch>) -> Self {
        Self { registry, original }
    }

    /// The wrapped, unmocked transport.
    pub fn original(&self) -> Arc<dyn Fetch> {
        self.original.clone()
    }

    /// The registry consulted for mocks.
    pub fn registry(&self) -> &Arc<MockRegistry> {
        &self.registry
    }
}

#[async_trait]
impl Fetch for FetchAdapter {
    async fn fetch(&self, request: Request) -> Result<FetchResponse, MockError> {
        let resolved = self
            .registry
            .resolve(&request.url, request.body.as_deref())
            .await?;

        match resolved {
            Some(resolved) => {
                self.registry.stats().record_mocked();
                if self.registry.settings().log_matches {
                    info!(
                        method = %request.method,
                        url = %request.url,
                        key = %resolved.matched.key,
                        delay_ms = resolved.delay_ms,
                        "Fetch matched mock"
                    );
                }
                let delay_ms = resolved.delay_ms;
                let response = FetchResponse::from_resolved(&request.url, resolved);
                Ok(resolve_after(delay_ms, response).await)
            }
            None => {
                self.registry.stats().record_passthrough();
                if self.registry.settings().log_unmatched {
                    warn!(method = %request.method, url = %request.url, "Fetch passed through");
                }
                self.original.fetch(request).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::MockEntry;
    use crate::transport::testing::RecordingTransport;
    use serde_json::json;
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready, task};

    fn adapter() -> (FetchAdapter, RecordingTransport) {
        let transport = RecordingTransport::default();
        let adapter = FetchAdapter::new(
            Arc::new(MockRegistry::default()),
            Arc::new(transport.clone()),
        );
        (adapter, transport)
    }

    #[tokio::test]
    async fn test_configured_url_returns_mock() {
        let (adapter, transport) = adapter();
        adapter.registry().configure([("https://a/b", json!({ "v": 1 }))], true);

        let response = adapter.fetch(Request::new("https://a/b")).await.unwrap();
        assert_eq!(response.json().unwrap(), json!({ "v": 1 }));
        assert_eq!(response.status, 200);
        assert!(response.ok);
        assert_eq!(response.status_text, "");
        assert_eq!(response.headers["status"], "200");
        assert_eq!(response.response_type, "basic");
        assert!(!response.redirected);
        assert_eq!(response.url, "https://a/b");
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_pathname_scoped_text() {
        let (adapter, _) = adapter();
        adapter.registry().set_dynamic_mock_url_response(
            "/search",
            MockEntry::default()
                .use_pathname_for_all_queries(true)
                .with_dynamic_fn(|_req, _res, query| {
                    Ok(json!(format!("Q:{}", query.get("term").cloned().unwrap_or_default())))
                }),
        );

        let response = adapter.fetch(Request::new("/search?term=cats")).await.unwrap();
        assert_eq!(response.text(), "Q:cats");
    }

    #[tokio::test]
    async fn test_unmocked_request_passes_through_unchanged() {
        let (adapter, transport) = adapter();
        adapter.registry().set_mock_url_response("https://a/mocked", json!(1));

        let request = Request::new("https://a/real")
            .with_method("POST")
            .with_header("x-trace", "1")
            .with_body("payload");
        let response = adapter.fetch(request.clone()).await.unwrap();

        assert_eq!(transport.calls(), vec![request]);
        assert_eq!(response.text(), "from network");
        assert_eq!(response.body, ResponseBody::Text("from network".to_string()));

        let stats = adapter.registry().stats().snapshot();
        assert_eq!(stats.passed_through, 1);
        assert_eq!(stats.mocked, 0);
    }

    #[tokio::test]
    async fn test_request_body_feeds_dynamic_fn() {
        let (adapter, _) = adapter();
        adapter.registry().set_dynamic_mock_url_response(
            "https://example.com/someApi",
            MockEntry::default()
                .use_pathname_for_all_queries(true)
                .with_dynamic_fn(|request, _res, query| {
                    Ok(json!({ "request": request, "queryParamMap": query }))
                }),
        );

        for url in [
            "https://example.com/someApi",
            "https://example.com/someApi?",
            "https://example.com/someApi#",
            "https://example.com/someApi?#",
        ] {
            let response = adapter
                .fetch(
                    Request::new(url)
                        .with_method("POST")
                        .with_body(r#"{"data":"foo"}"#),
                )
                .await
                .unwrap()
                .json()
                .unwrap();
            assert_eq!(response["request"]["data"], "foo", "{url}");
            assert_eq!(response["queryParamMap"], json!({}), "{url}");
        }
    }

    #[tokio::test]
    async fn test_response_properties() {
        let (adapter, _) = adapter();
        adapter.registry().set_dynamic_mock_url_response(
            "/with-props",
            MockEntry::new("body")
                .with_response_property("headers", json!({ "x-mock": "yes", "x-count": 2 }))
                .with_response_property("statusText", "Created")
                .with_response_property("status", 201)
                .with_response_property("custom", json!({ "a": 1 })),
        );

        let response = adapter.fetch(Request::new("/with-props")).await.unwrap();
        assert_eq!(response.headers["x-mock"], "yes");
        assert_eq!(response.headers["x-count"], "2");
        assert_eq!(response.headers["status"], "200");
        assert_eq!(response.status, 201);
        assert!(response.ok);
        assert_eq!(response.status_text, "Created");
        assert_eq!(response.property("custom"), Some(&json!({ "a": 1 })));
    }

    #[tokio::test]
    async fn test_dynamic_fn_error_rejects_fetch() {
        let (adapter, transport) = adapter();
        adapter.registry().set_dynamic_mock_url_response(
            "/broken",
            MockEntry::default().with_dynamic_fn(|_, _, _| anyhow::bail!("boom")),
        );

        let err = adapter.fetch(Request::new("/broken")).await.unwrap_err();
        assert!(matches!(err, MockError::DynamicResponse { .. }));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_json_on_network_text() {
        let response = FetchResponse::network("/x", 404, "Not Found", HashMap::new(), r#"{"e":1}"#);
        assert!(!response.ok);
        assert_eq!(response.json().unwrap(), json!({ "e": 1 }));

        let response = FetchResponse::network("/x", 200, "OK", HashMap::new(), "not json");
        assert!(matches!(response.json(), Err(MockError::Json(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_honored() {
        let (adapter, _) = adapter();
        adapter.registry().set_dynamic_mock_url_response(
            "https://example.com/slow",
            MockEntry::new(json!({ "data": "some mock response" }))
                .with_dynamic_fn(|_, mut response, _| {
                    response["data"] = json!("new mock response");
                    Ok(response)
                })
                .with_delay(500),
        );

        let mut fut = task::spawn(adapter.fetch(Request::new("https://example.com/slow")));
        assert_pending!(fut.poll());

        tokio::time::advance(Duration::from_millis(499)).await;
        assert_pending!(fut.poll());

        tokio::time::advance(Duration::from_millis(1)).await;
        let response = assert_ready!(fut.poll()).unwrap();
        assert_eq!(response.json().unwrap(), json!({ "data": "new mock response" }));
    }
}
