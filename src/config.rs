//! Configuration for the mock layer.
//!
//! Declares static responses, mock entries and registry settings that can be
//! loaded from YAML (or JSON) instead of being set up in code.

use crate::entry::MockEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Main configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MockRequestsConfig {
    /// Registry settings
    #[serde(default)]
    pub settings: Settings,

    /// Static `url: response` pairs
    #[serde(default)]
    pub responses: BTreeMap<String, Value>,

    /// Mock entries with delay, matching mode and response properties
    #[serde(default)]
    pub mocks: BTreeMap<String, MockDefinition>,
}

impl MockRequestsConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        for url in self.responses.keys().chain(self.mocks.keys()) {
            if url.trim().is_empty() {
                anyhow::bail!("Mock URL cannot be empty");
            }
        }
        if let Some(origin) = &self.settings.page_origin {
            if !origin.contains("://") {
                anyhow::bail!("page_origin must include a scheme: {}", origin);
            }
        }
        Ok(())
    }

    /// Total number of configured URLs.
    pub fn mock_count(&self) -> usize {
        self.responses.len() + self.mocks.len()
    }
}

/// A mock entry as written in a configuration file.
///
/// Dynamic response functions can only be attached in code.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MockDefinition {
    /// Response value
    #[serde(default)]
    pub response: Value,

    /// Resolution delay in milliseconds
    #[serde(default)]
    pub delay_ms: u64,

    /// Match every query/hash variant of the pathname
    #[serde(default)]
    pub use_pathname_for_all_queries: bool,

    /// Extra fields for the synthetic response (e.g. headers)
    #[serde(default)]
    pub response_properties: HashMap<String, Value>,
}

impl From<MockDefinition> for MockEntry {
    fn from(def: MockDefinition) -> Self {
        MockEntry {
            response: def.response,
            dynamic_response_fn: None,
            delay_ms: def.delay_ms,
            use_pathname_for_all_queries: def.use_pathname_for_all_queries,
            response_properties: def.response_properties,
        }
    }
}

/// Registry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Origin of the host page, used to match relative mocks against
    /// absolute request URLs and vice versa
    #[serde(default)]
    pub page_origin: Option<String>,

    /// Log all mocked requests
    #[serde(default = "default_true")]
    pub log_matches: bool,

    /// Log requests passed through to the real transport
    #[serde(default = "default_true")]
    pub log_unmatched: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_origin: None,
            log_matches: true,
            log_unmatched: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_static_responses() {
        let yaml = r#"
responses:
  https://example.com/home: "Home page for Bob"
  https://example.com/friends:
    friends: [Alice]
"#;
        let config = MockRequestsConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.responses.len(), 2);
        assert_eq!(config.responses["https://example.com/friends"]["friends"][0], "Alice");
        assert!(config.settings.log_matches);
    }

    #[test]
    fn test_parse_mock_definitions() {
        let yaml = r#"
settings:
  page_origin: http://localhost:3000
  log_unmatched: false
mocks:
  /search:
    response: null
    delay_ms: 500
    use_pathname_for_all_queries: true
    response_properties:
      headers:
        x-mocked: "true"
"#;
        let config = MockRequestsConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.settings.page_origin.as_deref(), Some("http://localhost:3000"));
        assert!(!config.settings.log_unmatched);

        let entry: MockEntry = config.mocks["/search"].clone().into();
        assert_eq!(entry.delay_ms, 500);
        assert!(entry.use_pathname_for_all_queries);
        assert_eq!(entry.response, Value::Null);
        assert_eq!(entry.response_properties["headers"]["x-mocked"], "true");
    }

    #[test]
    fn test_defaults_for_omitted_fields() {
        let yaml = r#"
mocks:
  https://example.com/empty: {}
"#;
        let config = MockRequestsConfig::from_yaml(yaml).unwrap();
        let def = &config.mocks["https://example.com/empty"];
        assert_eq!(def.response, Value::Null);
        assert_eq!(def.delay_ms, 0);
        assert!(!def.use_pathname_for_all_queries);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let yaml = r#"
mocks:
  /x:
    respnse: 1
"#;
        assert!(MockRequestsConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_validation() {
        let yaml = r#"
responses:
  "": 1
"#;
        assert!(MockRequestsConfig::from_yaml(yaml).is_err());

        let yaml = r#"
settings:
  page_origin: localhost
"#;
        assert!(MockRequestsConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"responses": {{"https://a/b": {{"v": 1}}}}}}"#
        )
        .unwrap();

        let config = MockRequestsConfig::from_file(file.path()).unwrap();
        assert_eq!(config.mock_count(), 1);
        assert_eq!(config.responses["https://a/b"]["v"], 1);
    }

    #[test]
    fn test_default_config_parses() {
        let config = MockRequestsConfig::from_yaml(include_str!("../demos/default-config.yaml")).unwrap();
        assert_eq!(config.mock_count(), 4);
        assert!(config.mocks["/api/search"].use_pathname_for_all_queries);
        assert_eq!(config.mocks["/api/search"].delay_ms, 250);
        assert_eq!(
            config.mocks["https://example.com/api/created"].response_properties["status"],
            201
        );
    }
}
