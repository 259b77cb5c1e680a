//! The mock layer as a whole: one registry plus the installed adapters.

use crate::config::{MockRequestsConfig, Settings};
use crate::entry::MockEntry;
use crate::error::MockError;
use crate::registry::MockRegistry;
use crate::transport::{Fetch, FetchAdapter, FetchResponse, MockXhr, Request, XhrAdapter, XhrTransport};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Request mocking layer.
///
/// Adapters are only installed for the transports that were supplied; a
/// layer built without an XHR transport simply has no XHR adapter.
pub struct MockRequests {
    registry: Arc<MockRegistry>,
    fetch: Option<FetchAdapter>,
    xhr: Option<XhrAdapter>,
}

impl Default for MockRequests {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl MockRequests {
    /// Empty layer with no transports installed.
    pub fn new(settings: Settings) -> Self {
        info!(page_origin = ?settings.page_origin, "Mock layer created");
        Self {
            registry: Arc::new(MockRegistry::new(settings)),
            fetch: None,
            xhr: None,
        }
    }

    /// Layer preloaded from a configuration file.
    ///
    /// `responses` and `mocks` are merged, so a URL listed in both keeps
    /// the `mocks` definition.
    pub fn from_config(config: MockRequestsConfig) -> Self {
        let layer = Self::new(config.settings);
        layer.registry.configure(config.responses, false);
        let mocks = config
            .mocks
            .into_iter()
            .map(|(url, def)| (url, MockEntry::from(def)));
        layer.registry.configure_dynamic_responses(mocks, false);
        info!(mocks = layer.registry.len(), "Loaded mocks from configuration");
        layer
    }

    /// Install the fetch adapter around `original`.
    pub fn with_fetch(mut self, original: impl Fetch + 'static) -> Self {
        self.fetch = Some(FetchAdapter::new(self.registry.clone(), Arc::new(original)));
        info!("Fetch adapter installed");
        self
    }

    /// Install the XHR adapter around `original`.
    pub fn with_xhr(mut self, original: impl XhrTransport + 'static) -> Self {
        self.xhr = Some(XhrAdapter::new(self.registry.clone(), Arc::new(original)));
        info!("XHR adapter installed");
        self
    }

    /// The shared registry.
    pub fn registry(&self) -> &Arc<MockRegistry> {
        &self.registry
    }

    /// See [`MockRegistry::configure`].
    pub fn configure<I, K>(&self, responses: I, overwrite_previous: bool)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        self.registry.configure(responses, overwrite_previous);
    }

    /// See [`MockRegistry::configure_dynamic_responses`].
    pub fn configure_dynamic_responses<I, K>(&self, entries: I, overwrite_previous: bool)
    where
        I: IntoIterator<Item = (K, MockEntry)>,
        K: AsRef<str>,
    {
        self.registry.configure_dynamic_responses(entries, overwrite_previous);
    }

    /// See [`MockRegistry::set_mock_url_response`].
    pub fn set_mock_url_response(&self, url: &str, response: Value) {
        self.registry.set_mock_url_response(url, response);
    }

    /// See [`MockRegistry::set_dynamic_mock_url_response`].
    pub fn set_dynamic_mock_url_response(&self, url: &str, entry: MockEntry) {
        self.registry.set_dynamic_mock_url_response(url, entry);
    }

    /// See [`MockRegistry::get_response`].
    pub fn get_response(&self, url: &str) -> Option<Value> {
        self.registry.get_response(url)
    }

    /// See [`MockRegistry::delete_mock_url_response`].
    pub fn delete_mock_url_response(&self, url: &str) -> bool {
        self.registry.delete_mock_url_response(url)
    }

    /// See [`MockRegistry::clear_all_mocks`].
    pub fn clear_all_mocks(&self) {
        self.registry.clear_all_mocks();
    }

    /// Issue a request through the fetch adapter.
    pub async fn fetch(&self, request: Request) -> Result<FetchResponse, MockError> {
        match &self.fetch {
            Some(adapter) => adapter.fetch(request).await,
            None => Err(MockError::TransportUnavailable("fetch")),
        }
    }

    /// Create a request object through the XHR adapter.
    pub fn new_xhr(&self) -> Result<MockXhr, MockError> {
        self.xhr
            .as_ref()
            .map(XhrAdapter::create)
            .ok_or(MockError::TransportUnavailable("XHR"))
    }

    /// The unwrapped fetch transport, bypassing all mocks.
    pub fn original_fetch(&self) -> Option<Arc<dyn Fetch>> {
        self.fetch.as_ref().map(FetchAdapter::original)
    }

    /// The unwrapped XHR transport, bypassing all mocks.
    pub fn original_xhr(&self) -> Option<Arc<dyn XhrTransport>> {
        self.xhr.as_ref().map(XhrAdapter::original)
    }
}
