//! Client configuration.

use std::time::Duration;

use relaycall_core::Headers;

/// Client-level configuration shared by every business object attached to
/// one [`ClientContext`](crate::ClientContext).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root every pending request path is joined onto.
    pub base_url: String,
    /// Default repository qualifier appended to resolved calls. `None` (or an
    /// empty string) means no implicit qualifier.
    pub repository: Option<String>,
    /// Global switch for the result cache.
    pub cache_enabled: bool,
    /// `None` keeps every entry until invalidated; `Some(n)` bounds the cache
    /// to roughly `n` entries.
    pub cache_capacity: Option<usize>,
    /// Deadline for a single remote round trip. Exceeding it is a transport
    /// failure.
    pub request_timeout: Duration,
    /// Value sent as `User-Agent`.
    pub user_agent: String,
    /// Headers added to every request. Request-specific headers win.
    pub default_headers: Vec<(String, String)>,
}

impl ClientConfig {
    /// Default configuration pointed at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// The repository qualifier, with empty strings treated as unset.
    #[must_use]
    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref().filter(|r| !r.is_empty())
    }

    /// Default headers as sent on the wire, `User-Agent` first.
    #[must_use]
    pub fn header_defaults(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("User-Agent", self.user_agent.as_str());
        for (name, value) in &self.default_headers {
            headers.insert(name.as_str(), value.as_str());
        }
        headers
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/v1".to_string(),
            repository: None,
            cache_enabled: true,
            cache_capacity: None,
            request_timeout: Duration::from_secs(30),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            default_headers: vec![("Accept".to_string(), "application/json".to_string())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080/api/v1");
        assert!(config.repository.is_none());
        assert!(config.cache_enabled);
        assert!(config.cache_capacity.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("relaycall-client/"));
    }

    #[test]
    fn empty_repository_reads_as_unset() {
        let config = ClientConfig {
            repository: Some(String::new()),
            ..ClientConfig::default()
        };
        assert!(config.repository().is_none());

        let config = ClientConfig {
            repository: Some("default".to_string()),
            ..ClientConfig::default()
        };
        assert_eq!(config.repository(), Some("default"));
    }

    #[test]
    fn header_defaults_include_user_agent_and_configured_headers() {
        let config = ClientConfig {
            user_agent: "test-agent".to_string(),
            default_headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("X-NXproperties".to_string(), "*".to_string()),
            ],
            ..ClientConfig::new("http://example.test")
        };
        let headers = config.header_defaults();
        assert_eq!(
            headers.to_string(),
            "User-Agent: test-agent\nAccept: application/json\nX-NXproperties: *\n"
        );
    }
}
