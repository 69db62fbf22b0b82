use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT as USER_AGENT_HEADER};
use std::collections::HashMap;

use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::config::{ACCEPT_HEADER, API_VERSION, USER_AGENT};

/// HttpTransport implementation backed by reqwest
///
/// Every request carries the bearer token and the GitHub API version headers.
/// Redirects are followed, which artifact downloads rely on; reqwest drops the
/// Authorization header when the redirect leaves the original host.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(token: &str) -> Result<Self> {
        let client = Client::builder()
            .default_headers(default_headers(token)?)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }
}

/// Headers sent with every request; the Authorization value is marked sensitive
fn default_headers(token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
        .context("GitHub token contains characters not allowed in a header")?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));
    headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
    headers.insert(USER_AGENT_HEADER, HeaderValue::from_static(USER_AGENT));

    Ok(headers)
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let response = self
            .client
            .get(request.url.clone())
            .timeout(request.timeout)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", request.url))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {}", request.url))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
