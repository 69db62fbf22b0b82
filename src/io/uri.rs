use anyhow::{Context, Result, anyhow};
use url::Url;

/// A GitHub repository identifier in `owner/name` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parse an `owner/name` string
    pub fn parse(repo: &str) -> Result<Self> {
        let repo = repo.trim();
        let (owner, name) = repo
            .split_once('/')
            .ok_or_else(|| anyhow!("Repository must be in owner/name form: {}", repo))?;

        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(anyhow!("Repository must be in owner/name form: {}", repo));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Builds Actions endpoint URLs for one repository
#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    base: Url,
    repo: RepoRef,
}

impl ApiEndpoints {
    pub fn new(api_url: &str, repo: RepoRef) -> Result<Self> {
        let base = Url::parse(api_url).with_context(|| format!("Invalid API URL: {}", api_url))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("Invalid API URL: {}", api_url));
        }
        Ok(Self { base, repo })
    }

    /// `/repos/{owner}/{repo}/actions/runs`
    pub fn workflow_runs(&self) -> Url {
        self.actions_url(&["runs"])
    }

    /// `/repos/{owner}/{repo}/actions/runs/{run_id}/artifacts`
    pub fn run_artifacts(&self, run_id: u64) -> Url {
        self.actions_url(&["runs", run_id.to_string().as_str(), "artifacts"])
    }

    fn actions_url(&self, tail: &[&str]) -> Url {
        let mut url = self.base.clone();
        // cannot_be_a_base URLs are rejected in new(), so this always applies
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend([
                    "repos",
                    self.repo.owner.as_str(),
                    self.repo.name.as_str(),
                    "actions",
                ])
                .extend(tail);
        }
        url
    }
}
