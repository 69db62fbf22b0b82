use serde::Deserialize;

/// A completed GitHub Actions workflow run
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    /// `None` when GitHub reports `null`; a missing key reads as `unknown`
    #[serde(default = "unknown_label")]
    pub head_branch: Option<String>,
    /// Workflow display name
    #[serde(default = "unknown_label")]
    pub name: Option<String>,
    /// Workflow file path, e.g. `.github/workflows/tests.yml`
    #[serde(default)]
    pub path: Option<String>,
}

fn unknown_label() -> Option<String> {
    Some("unknown".to_string())
}

impl WorkflowRun {
    /// Branch name as reported in the output, empty when GitHub sent `null`
    pub fn branch_label(&self) -> &str {
        self.head_branch.as_deref().unwrap_or("")
    }

    /// Workflow display name as reported in the output
    pub fn workflow_label(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Last segment of the workflow path (`tests.yml`)
    pub fn workflow_file(&self) -> &str {
        self.path
            .as_deref()
            .and_then(|p| p.rsplit('/').next())
            .unwrap_or("")
    }
}

/// An artifact attached to a workflow run
#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    pub name: String,
    #[serde(default)]
    pub archive_download_url: Option<String>,
}

impl Artifact {
    /// Case-insensitive substring match on the artifact name
    pub fn matches_marker(&self, marker: &str) -> bool {
        self.name
            .to_lowercase()
            .contains(&marker.to_lowercase())
    }
}
