//! Mock entries: the stored configuration for one registry key.

use crate::url::QueryParams;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Function computing the next response from the request payload, the
/// previous response and the request's query parameters.
///
/// The registry persists whatever the function returns; the function
/// itself never touches registry state.
pub type DynamicResponseFn = Arc<
    dyn Fn(Value, Value, QueryParams) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync,
>;

/// Configuration for a single mocked URL.
#[derive(Clone, Default)]
pub struct MockEntry {
    /// Current response value
    pub response: Value,
    /// Optional per-request update function
    pub dynamic_response_fn: Option<DynamicResponseFn>,
    /// Milliseconds before the mocked result resolves
    pub delay_ms: u64,
    /// Key the entry by pathname so all query/hash variants share it
    pub use_pathname_for_all_queries: bool,
    /// Extra fields applied to the synthetic response
    pub response_properties: HashMap<String, Value>,
}

impl MockEntry {
    /// Create an entry with a static response and default settings.
    pub fn new(response: impl Into<Value>) -> Self {
        Self {
            response: response.into(),
            ..Default::default()
        }
    }

    /// Attach a synchronous dynamic response function.
    pub fn with_dynamic_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(Value, Value, QueryParams) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let dynamic: DynamicResponseFn =
            Arc::new(move |request: Value, previous: Value, query: QueryParams| {
                let result = f(request, previous, query);
                async move { result }.boxed()
            });
        self.dynamic_response_fn = Some(dynamic);
        self
    }

    /// Attach an asynchronous dynamic response function.
    pub fn with_async_dynamic_fn<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Value, Value, QueryParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let dynamic: DynamicResponseFn =
            Arc::new(move |request: Value, previous: Value, query: QueryParams| {
                f(request, previous, query).boxed()
            });
        self.dynamic_response_fn = Some(dynamic);
        self
    }

    /// Set the resolution delay in milliseconds.
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Match every query/hash variant of the URL's pathname.
    pub fn use_pathname_for_all_queries(mut self, enabled: bool) -> Self {
        self.use_pathname_for_all_queries = enabled;
        self
    }

    /// Add a property to inject into the synthetic response.
    pub fn with_response_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.response_properties.insert(name.into(), value.into());
        self
    }

    /// Whether a dynamic response function is attached.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic_response_fn.is_some()
    }
}

impl fmt::Debug for MockEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockEntry")
            .field("response", &self.response)
            .field("dynamic", &self.is_dynamic())
            .field("delay_ms", &self.delay_ms)
            .field("use_pathname_for_all_queries", &self.use_pathname_for_all_queries)
            .field("response_properties", &self.response_properties)
            .finish()
    }
}

/// Convert a `{url: response}` map into entries with default settings.
pub fn map_static_config_to_dynamic(
    static_config: HashMap<String, Value>,
) -> HashMap<String, MockEntry> {
    static_config
        .into_iter()
        .map(|(url, response)| (url, MockEntry::new(response)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let entry = MockEntry::default();
        assert_eq!(entry.response, Value::Null);
        assert!(!entry.is_dynamic());
        assert_eq!(entry.delay_ms, 0);
        assert!(!entry.use_pathname_for_all_queries);
        assert!(entry.response_properties.is_empty());
    }

    #[tokio::test]
    async fn test_sync_and_async_fns_share_shape() {
        let sync_entry = MockEntry::new(json!(1))
            .with_dynamic_fn(|_req, prev, _q| Ok(json!(prev.as_i64().unwrap_or(0) + 1)));
        let async_entry = MockEntry::new(json!(1)).with_async_dynamic_fn(|req, _prev, _q| async move {
            Ok::<_, anyhow::Error>(json!({ "echo": req }))
        });

        let f = sync_entry.dynamic_response_fn.unwrap();
        assert_eq!(f(Value::Null, json!(1), QueryParams::new()).await.unwrap(), json!(2));

        let f = async_entry.dynamic_response_fn.unwrap();
        assert_eq!(
            f(json!("hi"), Value::Null, QueryParams::new()).await.unwrap(),
            json!({ "echo": "hi" })
        );
    }

    #[test]
    fn test_map_static_config_to_dynamic() {
        let mut bob = HashMap::new();
        bob.insert("https://example.com/home".to_string(), json!("Home page for Bob"));
        bob.insert("https://example.com/friends".to_string(), json!({ "friends": ["Alice"] }));

        let mut dynamic = map_static_config_to_dynamic(bob.clone());
        dynamic.get_mut("https://example.com/home").unwrap().delay_ms = 1500;

        for (url, response) in &bob {
            assert_eq!(&dynamic[url].response, response);
        }
        assert_eq!(dynamic["https://example.com/home"].delay_ms, 1500);
        assert_eq!(dynamic["https://example.com/friends"].delay_ms, 0);
    }

    #[test]
    fn test_debug_hides_function() {
        let entry = MockEntry::new("x").with_dynamic_fn(|_, prev, _| Ok(prev));
        let rendered = format!("{:?}", entry);
        assert!(rendered.contains("dynamic: true"));
    }
}
