//! Response resolution.
//!
//! Produces the value a mocked request resolves with, running the entry's
//! dynamic response function and persisting its result.

use crate::error::MockError;
use crate::matcher::MatchResult;
use crate::registry::MockRegistry;
use crate::url::{QueryParams, UrlParts};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Everything a transport adapter needs to answer a mocked request.
#[derive(Debug, Clone)]
pub struct ResolvedMock {
    /// Registry key that governed the request
    pub matched: MatchResult,
    /// Response value (after any dynamic update)
    pub response: Value,
    /// Resolution delay in milliseconds
    pub delay_ms: u64,
    /// Extra fields for the synthetic response
    pub response_properties: HashMap<String, Value>,
    /// Query parameters of the request URL
    pub query_params: QueryParams,
}

/// Parse a request body as JSON, keeping it as a string when it is not JSON.
pub fn parse_payload(body: Option<&str>) -> Value {
    match body {
        None => Value::Null,
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}

/// Text form of a response: strings verbatim, everything else as JSON.
pub fn cast_to_string(response: &Value) -> String {
    match response {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl MockRegistry {
    /// Resolve the response for a request to `url` carrying `body`.
    ///
    /// Returns `Ok(None)` when `url` is not mocked. When the entry has a
    /// dynamic response function it is called with the parsed payload, the
    /// stored response and the query parameters; its result replaces the
    /// stored response for later requests.
    ///
    /// Concurrent requests for the same key are not serialized: each reads
    /// the stored response, awaits the function and writes back, so the
    /// last write wins.
    pub async fn resolve(&self, url: &str, body: Option<&str>) -> Result<Option<ResolvedMock>, MockError> {
        let (matched, slot) = match self.lookup(url) {
            Some(found) => found,
            None => return Ok(None),
        };
        let query_params = UrlParts::parse(url).query_params;
        let entry = slot.entry;

        let response = match &entry.dynamic_response_fn {
            Some(dynamic) => {
                let payload = parse_payload(body);
                let updated = dynamic(payload, entry.response, query_params.clone())
                    .await
                    .map_err(|e| MockError::DynamicResponse {
                        url: url.to_string(),
                        source: e.into(),
                    })?;
                self.store_response(&matched.key, slot.generation, updated.clone());
                debug!(key = %matched.key, "Dynamic response updated");
                updated
            }
            None => entry.response,
        };

        Ok(Some(ResolvedMock {
            matched,
            response,
            delay_ms: entry.delay_ms,
            response_properties: entry.response_properties,
            query_params,
        }))
    }
}
