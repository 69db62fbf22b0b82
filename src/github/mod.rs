//! GitHub Actions API client: workflow runs, artifacts and downloads

pub mod client;
pub mod models;
pub mod rate_limit;

pub use client::GithubClient;
pub use models::WorkflowRun;
