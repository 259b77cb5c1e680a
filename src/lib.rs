//! Mock Requests
//!
//! A request mocking layer that sits in front of outgoing HTTP calls and
//! answers configured URLs with mock payloads instead of reaching the
//! network. Useful for front-end development, demos, and tests.
//!
//! # Features
//!
//! - **URL Matching**: Match by full URL, by pathname, or across every
//!   query/hash variant of a pathname
//! - **Static Responses**: Return a fixed value for a URL
//! - **Dynamic Responses**: Compute each response from the request payload,
//!   the previous response and the query parameters; results persist
//! - **Latency Simulation**: Per-URL resolution delay
//! - **Two Request APIs**: Fetch-style and XHR-style adapters over any
//!   real transport, with unmatched requests passed through untouched
//!
//! # Example Configuration
//!
//! ```yaml
//! settings:
//!   page_origin: "https://example.com"
//!
//! responses:
//!   https://example.com/home: "Home page"
//!
//! mocks:
//!   /api/search:
//!     response:
//!       results: []
//!     use_pathname_for_all_queries: true
//!     delay_ms: 250
//!     response_properties:
//!       headers:
//!         x-mocked: "true"
//! ```
//!
//! # Example
//!
//! ```no_run
//! use mock_requests::{MockEntry, MockRequests, ReqwestTransport, Request, Settings};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), mock_requests::MockError> {
//! let mocks = MockRequests::new(Settings::default()).with_fetch(ReqwestTransport::new());
//! mocks.set_dynamic_mock_url_response(
//!     "/api/counter",
//!     MockEntry::new(json!(0)).with_dynamic_fn(|_request, previous, _query| {
//!         Ok(json!(previous.as_i64().unwrap_or(0) + 1))
//!     }),
//! );
//!
//! let response = mocks.fetch(Request::new("/api/counter")).await?;
//! assert_eq!(response.json()?, json!(1));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod delay;
pub mod entry;
pub mod error;
pub mod layer;
pub mod matcher;
pub mod registry;
pub mod response;
pub mod transport;
pub mod url;

pub use config::{MockDefinition, MockRequestsConfig, Settings};
pub use entry::{map_static_config_to_dynamic, DynamicResponseFn, MockEntry};
pub use error::MockError;
pub use layer::MockRequests;
pub use matcher::{MatchKind, MatchResult};
pub use registry::{MockRegistry, StatsSnapshot};
pub use response::ResolvedMock;
pub use transport::{
    Fetch, FetchAdapter, FetchResponse, MockXhr, ReadyState, Request, ReqwestTransport, XhrAdapter,
    XhrResponse, XhrState, XhrTransport,
};
pub use url::{QueryParams, UrlParts};
