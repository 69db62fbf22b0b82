//! High-level runner API for the Eco-CI collector.
//!
//! This module provides a simplified public interface that encapsulates the
//! setup of the HTTP transport, the GitHub client and the collector.
//!
//! This is the primary API for external users and for the CLI.

use anyhow::{Result, bail};
use derive_builder::Builder;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::collection::Collector;
use crate::config::{DEFAULT_API_URL, DEFAULT_OUTPUT_PATH, ECO_CI_MARKER};
use crate::formats::write_rows;
use crate::github::GithubClient;
use crate::io::{ApiEndpoints, HttpTransport, RepoRef, ReqwestTransport};

pub use crate::inference::ConfigRules;
pub use crate::telemetry::CollectionStats;

/// Arguments for running a collection
#[derive(Clone, Builder)]
pub struct CollectArgs {
    /// GitHub token with `actions:read` on the repository
    #[builder(setter(into))]
    pub token: String,
    /// Repository in `owner/name` form
    #[builder(setter(into))]
    pub repo: String,

    #[builder(setter(into), default = "DEFAULT_API_URL.to_string()")]
    pub api_url: String,
    #[builder(setter(into), default = "PathBuf::from(DEFAULT_OUTPUT_PATH)")]
    pub output_path: PathBuf,

    /// Substring identifying Eco-CI artifacts (case-insensitive)
    #[builder(setter(into), default = "ECO_CI_MARKER.to_string()")]
    pub marker: String,
    #[builder(default)]
    pub rules: ConfigRules,

    /// Optional ceiling on consecutive rate-limit retries (unbounded if None)
    #[builder(default)]
    pub max_rate_limit_retries: Option<u32>,
}

impl std::fmt::Debug for CollectArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectArgs")
            .field("token", &"<redacted>")
            .field("repo", &self.repo)
            .field("api_url", &self.api_url)
            .field("output_path", &self.output_path)
            .field("marker", &self.marker)
            .field("rules", &self.rules)
            .field("max_rate_limit_retries", &self.max_rate_limit_retries)
            .finish()
    }
}

/// Result of a completed collection
#[derive(Debug)]
pub struct CollectResult {
    pub rows_written: usize,
    /// Where the CSV was written; `None` when nothing was collected
    pub output_path: Option<PathBuf>,
    pub stats: CollectionStats,
    pub duration: Duration,
}

/// Run a collection with the specified arguments
///
/// Lists all completed runs of the repository, downloads their Eco-CI
/// artifacts and writes the consolidated CSV. When no measurement was
/// collected, no file is written and `output_path` is `None`.
///
/// # Example
///
/// ```no_run
/// use eco_ci_collector::runner::{CollectArgsBuilder, run_collect};
///
/// # async fn example() -> anyhow::Result<()> {
/// let args = CollectArgsBuilder::default()
///     .token("ghp_xxxxxxxxxxxxxxxxxxxx")
///     .repo("jdoe/httpie-cli-carbon-study")
///     .output_path("results/raw_data.csv")
///     .build()?;
///
/// let result = run_collect(args).await?;
/// println!("Wrote {} rows", result.rows_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_collect(args: CollectArgs) -> Result<CollectResult> {
    if args.token.trim().is_empty() {
        bail!("GitHub token is empty");
    }
    let transport = Arc::new(ReqwestTransport::new(args.token.trim())?);
    run_collect_with_transport(args, transport).await
}

/// Same as [`run_collect`] over a caller-provided transport
pub(crate) async fn run_collect_with_transport(
    args: CollectArgs,
    transport: Arc<dyn HttpTransport>,
) -> Result<CollectResult> {
    let start_time = Instant::now();

    let repo = RepoRef::parse(&args.repo)?;
    let endpoints = ApiEndpoints::new(&args.api_url, repo)?;
    let client = GithubClient::new(transport, endpoints)
        .with_max_rate_limit_retries(args.max_rate_limit_retries);

    let collector = Collector::new(client, args.rules, args.marker);
    let collection = collector.collect().await?;

    let output_path = if collection.rows.is_empty() {
        None
    } else {
        write_rows(&args.output_path, &collection.rows)?;
        Some(args.output_path)
    };

    Ok(CollectResult {
        rows_written: collection.rows.len(),
        output_path,
        stats: collection.stats,
        duration: start_time.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let args = CollectArgsBuilder::default()
            .token("t")
            .repo("o/r")
            .build()
            .unwrap();

        assert_eq!(args.api_url, "https://api.github.com");
        assert_eq!(args.output_path, PathBuf::from("results/raw_data.csv"));
        assert_eq!(args.marker, "eco-ci");
        assert_eq!(args.rules, ConfigRules::default());
        assert_eq!(args.max_rate_limit_retries, None);
    }

    #[test]
    fn test_builder_requires_token_and_repo() {
        assert!(CollectArgsBuilder::default().repo("o/r").build().is_err());
        assert!(CollectArgsBuilder::default().token("t").build().is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let args = CollectArgsBuilder::default()
            .token("ghp_secret0123456789")
            .repo("jdoe/study")
            .build()
            .unwrap();

        let printed = format!("{:?}", args);
        assert!(!printed.contains("ghp_secret0123456789"));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("jdoe/study"));
    }

    #[tokio::test]
    async fn test_empty_token_rejected() {
        let args = CollectArgsBuilder::default()
            .token("  ")
            .repo("o/r")
            .build()
            .unwrap();
        assert!(run_collect(args).await.is_err());
    }
}
