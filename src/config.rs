//! Configuration constants for the collector
//!
//! This module centralizes all tunable parameters and constants used throughout
//! the application.

use std::time::Duration;

// ============================================================================
// GitHub API Configuration
// ============================================================================

pub const DEFAULT_API_URL: &str = "https://api.github.com";

pub const API_VERSION: &str = "2022-11-28";

pub const ACCEPT_HEADER: &str = "application/vnd.github+json";

pub const USER_AGENT: &str = concat!("eco-ci-collector/", env!("CARGO_PKG_VERSION"));

/// Number of items requested per page when listing workflow runs
///
/// 100 is the maximum GitHub accepts. A page holding fewer items than this
/// is the last one.
pub const PAGE_SIZE: usize = 100;

pub const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for artifact archive downloads
///
/// Downloads follow a redirect to blob storage and carry the whole archive,
/// so they get a longer budget than the JSON API calls.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// Rate Limit Configuration
// ============================================================================

/// Lower bound on any rate-limit wait
///
/// Guards against clock skew between this host and GitHub making the reset
/// time appear to be in the past.
pub const MIN_RATE_LIMIT_WAIT: Duration = Duration::from_secs(10);

/// Wait used when a rate-limited response carries no reset header
pub const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

// ============================================================================
// Collection Configuration
// ============================================================================

pub const DEFAULT_OUTPUT_PATH: &str = "results/raw_data.csv";

/// Substring (lowercase) identifying Eco-CI artifacts among a run's artifacts
pub const ECO_CI_MARKER: &str = "eco-ci";

/// Token prefix carrying the Python version in artifact names
/// (e.g. `eco-ci-results-tests-py3.11-ubuntu-latest`)
pub const RUNTIME_VERSION_PREFIX: &str = "py";

pub const ARTIFACT_NAME_DELIMITER: char = '-';
