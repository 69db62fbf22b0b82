//! Experiment configuration and Python version inference
//!
//! Runs are assigned a configuration label (C1–C4) from their branch or,
//! failing that, from their workflow file. The Python version comes from the
//! artifact name.

use std::collections::HashMap;

use crate::config::{ARTIFACT_NAME_DELIMITER, RUNTIME_VERSION_PREFIX};
use crate::github::WorkflowRun;

pub const UNKNOWN_CONFIG: &str = "unknown";

/// Label tables mapping runs to experiment configurations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRules {
    /// (branch prefix, label), checked in order; the first match wins
    pub branch_rules: Vec<(String, String)>,
    /// workflow file name -> label
    pub workflow_rules: HashMap<String, String>,
}

impl Default for ConfigRules {
    fn default() -> Self {
        let branch_rules = [
            ("experiment/c1-baseline", "C1"),
            ("experiment/c2-pip-cache", "C2"),
            ("experiment/c3-consolidation", "C3"),
            ("experiment/c4-combined", "C4"),
        ];
        let workflow_rules = [
            ("tests.yml", "C1"),
            ("code-style.yml", "C1"),
            ("coverage.yml", "C1"),
            // consolidated workflow runs on every experiment branch; branch rules refine it
            ("ci-consolidated.yml", "C3"),
        ];

        Self {
            branch_rules: branch_rules
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            workflow_rules: workflow_rules
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl ConfigRules {
    /// Replace the default tables where overrides are given
    pub fn with_overrides(
        branch_rules: Option<Vec<(String, String)>>,
        workflow_rules: Option<Vec<(String, String)>>,
    ) -> Self {
        let mut rules = Self::default();
        if let Some(branch_rules) = branch_rules {
            rules.branch_rules = branch_rules;
        }
        if let Some(workflow_rules) = workflow_rules {
            rules.workflow_rules = workflow_rules.into_iter().collect();
        }
        rules
    }

    /// Branch rules take precedence over workflow file rules
    pub fn infer(&self, branch: &str, workflow_file: &str) -> String {
        // starts_with covers the exact match too
        if let Some((_, label)) = self
            .branch_rules
            .iter()
            .find(|(prefix, _)| branch.starts_with(prefix.as_str()))
        {
            return label.clone();
        }

        self.workflow_rules
            .get(workflow_file)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_CONFIG.to_string())
    }

    pub fn infer_for_run(&self, run: &WorkflowRun) -> String {
        self.infer(
            run.head_branch.as_deref().unwrap_or(""),
            run.workflow_file(),
        )
    }
}

/// Python version encoded in an artifact name
///
/// `eco-ci-results-tests-py3.11-ubuntu-latest` gives `3.11`; a name without a
/// `py` token gives an empty string.
pub fn infer_runtime_version(artifact_name: &str) -> String {
    artifact_name
        .split(ARTIFACT_NAME_DELIMITER)
        .find_map(|part| part.strip_prefix(RUNTIME_VERSION_PREFIX))
        .unwrap_or("")
        .to_string()
}
