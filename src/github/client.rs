use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use super::models::{Artifact, WorkflowRun};
use super::rate_limit::{is_rate_limited, rate_limit_wait};
use crate::config::{API_TIMEOUT, DOWNLOAD_TIMEOUT, PAGE_SIZE};
use crate::io::{ApiEndpoints, HttpRequest, HttpTransport};

/// Client for the GitHub Actions endpoints the collector needs
pub struct GithubClient {
    transport: Arc<dyn HttpTransport>,
    endpoints: ApiEndpoints,
    page_size: usize,
    max_rate_limit_retries: Option<u32>,
}

impl GithubClient {
    pub fn new(transport: Arc<dyn HttpTransport>, endpoints: ApiEndpoints) -> Self {
        Self {
            transport,
            endpoints,
            page_size: PAGE_SIZE,
            max_rate_limit_retries: None,
        }
    }

    #[cfg(test)]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Give up after this many consecutive rate-limited responses to one
    /// request. `None` retries for as long as GitHub keeps rejecting.
    pub fn with_max_rate_limit_retries(mut self, max: Option<u32>) -> Self {
        self.max_rate_limit_retries = max;
        self
    }

    /// Fetch all completed workflow runs of the repository
    pub async fn list_workflow_runs(&self) -> Result<Vec<WorkflowRun>> {
        let mut url = self.endpoints.workflow_runs();
        url.query_pairs_mut().append_pair("status", "completed");

        let runs = self
            .paginate(url, "workflow_runs")
            .await
            .context("Failed to list workflow runs")?;
        info!("Found {} completed workflow runs", runs.len());
        Ok(runs)
    }

    /// List the artifacts of one run (first page only)
    pub async fn list_artifacts(&self, run_id: u64) -> Result<Vec<Artifact>> {
        let mut url = self.endpoints.run_artifacts(run_id);
        url.query_pairs_mut()
            .append_pair("per_page", &self.page_size.to_string());

        let data = self.api_get(url).await?;
        items_from(&data, "artifacts")
            .with_context(|| format!("Failed to parse artifacts of run #{}", run_id))
    }

    /// Download an artifact archive
    ///
    /// Returns `None` (after logging a warning) when the artifact has no
    /// download URL or the download fails. Failures are not retried.
    pub async fn download_artifact(&self, artifact: &Artifact) -> Option<Vec<u8>> {
        let Some(download_url) = artifact.archive_download_url.as_deref() else {
            debug!("Artifact '{}' has no download URL", artifact.name);
            return None;
        };

        let url = match Url::parse(download_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(
                    "Could not download artifact {}: invalid URL {}: {}",
                    artifact.name, download_url, e
                );
                return None;
            }
        };

        let request = HttpRequest {
            url,
            timeout: DOWNLOAD_TIMEOUT,
        };

        match self.transport.get(&request).await {
            Ok(response) if response.status == 200 => Some(response.body),
            Ok(response) => {
                warn!(
                    "Could not download artifact {} - HTTP {}",
                    artifact.name, response.status
                );
                None
            }
            Err(e) => {
                warn!("Could not download artifact {}: {:#}", artifact.name, e);
                None
            }
        }
    }

    /// Fetch every page of a list endpoint, concatenating the `key` arrays
    /// in fetch order. A page shorter than the page size is the last one.
    async fn paginate<T: DeserializeOwned>(&self, url: Url, key: &str) -> Result<Vec<T>> {
        let mut results = Vec::new();
        let mut page = 1u32;

        loop {
            let mut page_url = url.clone();
            page_url
                .query_pairs_mut()
                .append_pair("per_page", &self.page_size.to_string())
                .append_pair("page", &page.to_string());

            let data = self.api_get(page_url).await?;
            let items: Vec<T> =
                items_from(&data, key).with_context(|| format!("Failed to parse page {}", page))?;
            let count = items.len();
            results.extend(items);

            debug!(page, count, "fetched page");
            if count < self.page_size {
                break;
            }
            page += 1;
        }

        Ok(results)
    }

    /// GET a JSON document, waiting out rate limits
    ///
    /// Rate-limited responses are retried in a loop (bounded only when
    /// `max_rate_limit_retries` is set). Any other non-success status is an
    /// error.
    async fn api_get(&self, url: Url) -> Result<serde_json::Value> {
        let request = HttpRequest {
            url,
            timeout: API_TIMEOUT,
        };
        let mut rate_limited = 0u32;

        loop {
            let response = self.transport.get(&request).await?;

            if is_rate_limited(response.status) {
                if let Some(max) = self.max_rate_limit_retries
                    && rate_limited >= max
                {
                    bail!(
                        "Still rate-limited after {} retries (HTTP {}) for {}",
                        rate_limited,
                        response.status,
                        request.url
                    );
                }

                let wait = rate_limit_wait(&response, Utc::now().timestamp());
                info!("Rate-limited. Waiting {}s ...", wait.as_secs());
                tokio::time::sleep(wait).await;
                rate_limited += 1;
                continue;
            }

            if !response.is_success() {
                bail!(
                    "GitHub API request {} failed with HTTP {}: {}",
                    request.url,
                    response.status,
                    String::from_utf8_lossy(&response.body)
                );
            }

            return serde_json::from_slice(&response.body)
                .with_context(|| format!("Invalid JSON in response from {}", request.url));
        }
    }
}

/// Deserialize `data[key]` as a list; a missing key counts as an empty list
fn items_from<T: DeserializeOwned>(data: &serde_json::Value, key: &str) -> Result<Vec<T>> {
    match data.get(key) {
        Some(items) => Ok(Vec::<T>::deserialize(items)?),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::RepoRef;
    use crate::io::transport::mock::*;
    use serde_json::json;
    use std::time::Duration;

    const RUNS: &str = "https://api.test/repos/o/r/actions/runs";

    fn client(transport: &Arc<MockTransport>) -> GithubClient {
        let endpoints =
            ApiEndpoints::new("https://api.test", RepoRef::parse("o/r").unwrap()).unwrap();
        GithubClient::new(transport.clone(), endpoints)
    }

    fn runs_page_url(per_page: usize, page: u32) -> String {
        format!("{RUNS}?status=completed&per_page={per_page}&page={page}")
    }

    fn runs(ids: std::ops::Range<u64>) -> serde_json::Value {
        let runs: Vec<_> = ids
            .map(|id| json!({"id": id, "name": "Tests", "head_branch": "main", "path": ".github/workflows/tests.yml"}))
            .collect();
        json!({"total_count": runs.len(), "workflow_runs": runs})
    }

    #[tokio::test]
    async fn test_pagination_stops_at_short_page() {
        let transport = Arc::new(MockTransport::new());
        transport
            .respond_json(&runs_page_url(3, 1), runs(0..3))
            .respond_json(&runs_page_url(3, 2), runs(3..6))
            .respond_json(&runs_page_url(3, 3), runs(6..8));

        let runs = client(&transport)
            .with_page_size(3)
            .list_workflow_runs()
            .await
            .unwrap();

        let ids: Vec<u64> = runs.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(
            transport.requested_urls(),
            vec![
                runs_page_url(3, 1),
                runs_page_url(3, 2),
                runs_page_url(3, 3)
            ]
        );
    }

    #[tokio::test]
    async fn test_pagination_full_last_page_fetches_empty_page() {
        let transport = Arc::new(MockTransport::new());
        transport
            .respond_json(&runs_page_url(2, 1), runs(0..2))
            .respond_json(&runs_page_url(2, 2), json!({"total_count": 2, "workflow_runs": []}));

        let runs = client(&transport)
            .with_page_size(2)
            .list_workflow_runs()
            .await
            .unwrap();

        assert_eq!(runs.len(), 2);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_pagination_with_default_page_size() {
        let transport = Arc::new(MockTransport::new());
        transport
            .respond_json(&runs_page_url(100, 1), runs(0..100))
            .respond_json(&runs_page_url(100, 2), runs(100..101));

        let runs = client(&transport).list_workflow_runs().await.unwrap();
        assert_eq!(runs.len(), 101);
        assert_eq!(runs.last().unwrap().id, 100);
    }

    #[tokio::test]
    async fn test_missing_key_counts_as_empty_page() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_json(&runs_page_url(100, 1), json!({"total_count": 0}));

        let runs = client(&transport).list_workflow_runs().await.unwrap();
        assert!(runs.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_is_retried() {
        let transport = Arc::new(MockTransport::new());
        let reset = Utc::now().timestamp() + 30;
        transport
            .respond(&runs_page_url(100, 1), rate_limited(403, Some(reset)))
            .respond(&runs_page_url(100, 1), rate_limited(429, None))
            .respond_json(&runs_page_url(100, 1), runs(0..1));

        let start = tokio::time::Instant::now();
        let runs = client(&transport).list_workflow_runs().await.unwrap();

        assert_eq!(runs.len(), 1);
        assert_eq!(transport.requests().len(), 3);
        // At least the 10s floor plus the 60s default for the headerless 429
        assert!(start.elapsed() >= Duration::from_secs(70));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_ceiling() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(&runs_page_url(100, 1), rate_limited(429, None));

        let result = client(&transport)
            .with_max_rate_limit_retries(Some(2))
            .list_workflow_runs()
            .await;

        assert!(result.is_err());
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_other_error_status_is_fatal() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(
            &runs_page_url(100, 1),
            json_response(404, json!({"message": "Not Found"})),
        );

        let err = client(&transport).list_workflow_runs().await.unwrap_err();
        assert!(format!("{:#}", err).contains("HTTP 404"));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_list_artifacts() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_json(
            "https://api.test/repos/o/r/actions/runs/42/artifacts?per_page=100",
            json!({
                "total_count": 2,
                "artifacts": [
                    {"name": "eco-ci-results-py3.11", "archive_download_url": "https://api.test/a/1/zip"},
                    {"name": "coverage", "archive_download_url": "https://api.test/a/2/zip"}
                ]
            }),
        );

        let artifacts = client(&transport).list_artifacts(42).await.unwrap();
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].name, "eco-ci-results-py3.11");
        assert_eq!(transport.requests()[0].timeout, API_TIMEOUT);
    }

    #[tokio::test]
    async fn test_download_artifact() {
        let transport = Arc::new(MockTransport::new());
        transport.respond("https://api.test/a/1/zip", bytes_response(200, b"PK".to_vec()));

        let artifact = Artifact {
            name: "eco-ci".to_string(),
            archive_download_url: Some("https://api.test/a/1/zip".to_string()),
        };
        let bytes = client(&transport).download_artifact(&artifact).await;

        assert_eq!(bytes, Some(b"PK".to_vec()));
        assert_eq!(transport.requests()[0].timeout, DOWNLOAD_TIMEOUT);
    }

    #[tokio::test]
    async fn test_download_failures_are_skipped() {
        let transport = Arc::new(MockTransport::new());
        transport.respond("https://api.test/a/gone/zip", bytes_response(410, vec![]));
        let client = client(&transport);

        let expired = Artifact {
            name: "eco-ci-expired".to_string(),
            archive_download_url: Some("https://api.test/a/gone/zip".to_string()),
        };
        let unreachable = Artifact {
            name: "eco-ci-unreachable".to_string(),
            archive_download_url: Some("https://api.test/a/none/zip".to_string()),
        };
        let no_url = Artifact {
            name: "eco-ci-no-url".to_string(),
            archive_download_url: None,
        };

        assert!(client.download_artifact(&expired).await.is_none());
        assert!(client.download_artifact(&unreachable).await.is_none());
        assert!(client.download_artifact(&no_url).await.is_none());
        // No retry, no request for the URL-less artifact
        assert_eq!(transport.requests().len(), 2);
    }
}
