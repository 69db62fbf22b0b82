use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// A GET request issued against the GitHub API or an artifact download URL
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: Url,
    pub timeout: Duration,
}

/// Response as seen by the collector
///
/// Header names are stored lowercased.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a header value by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Abstraction over the HTTP client
/// This trait lets the GitHub client run against the real API or against
/// canned responses in tests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform a GET request
    /// Non-success statuses are returned as responses, only transport
    /// failures (DNS, TLS, timeout) are errors
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse>;
}
