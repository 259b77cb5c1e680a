//! Real network transport backed by `reqwest`.

use super::{Fetch, FetchResponse, Request, XhrResponse, XhrTransport};
use crate::error::MockError;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use std::collections::HashMap;
use tracing::debug;

/// Performs requests over the network. Install it as the original transport
/// so unmocked URLs still reach a real server.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

/// Response fields shared by both request APIs.
struct NetworkResponse {
    url: String,
    status: u16,
    status_text: String,
    headers: HashMap<String, String>,
    text: String,
}

impl ReqwestTransport {
    /// Transport with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport sharing an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build(&self, request: Request) -> Result<reqwest::RequestBuilder, MockError> {
        let method = parse_method(&request.method)?;
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        Ok(builder)
    }

    async fn execute(&self, request: Request) -> Result<NetworkResponse, MockError> {
        debug!(method = %request.method, url = %request.url, "Sending request");
        let response = self.build(request)?.send().await?;

        let status = response.status();
        let url = response.url().to_string();
        let headers = header_map(response.headers());
        let text = response.text().await?;

        Ok(NetworkResponse {
            url,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            text,
        })
    }
}

fn parse_method(method: &str) -> Result<Method, MockError> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| MockError::Transport(format!("invalid HTTP method: {method}")))
}

/// Header values that are not valid UTF-8 are skipped.
fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect()
}

#[async_trait]
impl Fetch for ReqwestTransport {
    async fn fetch(&self, request: Request) -> Result<FetchResponse, MockError> {
        let response = self.execute(request).await?;
        Ok(FetchResponse::network(
            response.url,
            response.status,
            response.status_text,
            response.headers,
            response.text,
        ))
    }
}

#[async_trait]
impl XhrTransport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<XhrResponse, MockError> {
        let response = self.execute(request).await?;
        Ok(XhrResponse {
            status: response.status,
            status_text: response.status_text,
            response_text: response.text,
            response_url: response.url,
            headers: response.headers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method("POST").unwrap(), Method::POST);
        assert_eq!(parse_method("PURGE").unwrap().as_str(), "PURGE");
        assert!(matches!(parse_method("BAD METHOD"), Err(MockError::Transport(_))));
    }

    #[test]
    fn test_build_request() {
        let transport = ReqwestTransport::new();
        let built = transport
            .build(
                Request::new("http://localhost:1/api")
                    .with_method("put")
                    .with_header("x-test", "1")
                    .with_body("payload"),
            )
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(built.method(), Method::PUT);
        assert_eq!(built.url().as_str(), "http://localhost:1/api");
        assert_eq!(built.headers()["x-test"], "1");
        assert_eq!(built.body().and_then(|b| b.as_bytes()), Some(&b"payload"[..]));
    }

    #[test]
    fn test_header_map_skips_opaque_values() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.insert("x-binary", HeaderValue::from_bytes(&[0xfa, 0xfb]).unwrap());

        let map = header_map(&headers);
        assert_eq!(map.len(), 1);
        assert_eq!(map["content-type"], "application/json");
    }

    #[tokio::test]
    async fn test_invalid_url_is_an_error() {
        let transport = ReqwestTransport::new();
        let err = transport.fetch(Request::new("not a url")).await.unwrap_err();
        assert!(matches!(err, MockError::Http(_)));
    }
}
