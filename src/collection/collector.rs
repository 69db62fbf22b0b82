use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::formats::{OutputRow, extract_measurements};
use crate::github::{GithubClient, WorkflowRun};
use crate::inference::{ConfigRules, infer_runtime_version};
use crate::telemetry::{CollectionEvent, CollectionStats};

/// Rows gathered across all runs, with the statistics of the walk
#[derive(Debug, Default)]
pub struct Collection {
    pub rows: Vec<OutputRow>,
    pub stats: CollectionStats,
}

impl Collection {
    fn record(&mut self, event: CollectionEvent) {
        self.stats.update(&event);
    }
}

/// The Collector walks runs, artifacts and archives in sequence.
pub struct Collector {
    client: GithubClient,
    rules: ConfigRules,
    marker: String,
}

impl Collector {
    pub fn new(client: GithubClient, rules: ConfigRules, marker: impl Into<String>) -> Self {
        Self {
            client,
            rules,
            marker: marker.into(),
        }
    }

    /// Run the complete collection
    ///
    /// 1. List all completed workflow runs
    /// 2. For each run, list its artifacts and keep the Eco-CI ones
    /// 3. Download each artifact and extract its measurements
    /// 4. Join every measurement with its run's metadata
    ///
    /// API errors abort the collection; download and parse failures only
    /// drop the affected artifact.
    pub async fn collect(&self) -> Result<Collection> {
        let runs = self.client.list_workflow_runs().await?;
        let mut collection = Collection::default();

        for run in &runs {
            self.collect_run(run, &mut collection)
                .await
                .with_context(|| format!("Failed to process run #{}", run.id))?;
        }

        Ok(collection)
    }

    async fn collect_run(&self, run: &WorkflowRun, collection: &mut Collection) -> Result<()> {
        let config = self.rules.infer_for_run(run);
        info!(
            "Run #{} | branch={} | config={} | workflow={}",
            run.id,
            run.branch_label(),
            config,
            run.workflow_label()
        );

        let eco_ci_artifacts: Vec<_> = self
            .client
            .list_artifacts(run.id)
            .await?
            .into_iter()
            .filter(|artifact| artifact.matches_marker(&self.marker))
            .collect();

        collection.record(CollectionEvent::RunScanned {
            eco_ci_artifacts: eco_ci_artifacts.len(),
        });

        if eco_ci_artifacts.is_empty() {
            warn!("No Eco-CI artifacts found for run #{}", run.id);
            return Ok(());
        }

        for artifact in &eco_ci_artifacts {
            info!("Downloading: {}", artifact.name);
            let Some(raw) = self.client.download_artifact(artifact).await else {
                collection.record(CollectionEvent::ArtifactSkipped);
                continue;
            };

            let records = extract_measurements(&raw, &artifact.name);
            collection.record(CollectionEvent::ArtifactDownloaded {
                bytes: raw.len() as u64,
                records: records.len(),
            });

            let python_version = infer_runtime_version(&artifact.name);
            collection.rows.extend(
                records
                    .into_iter()
                    .map(|record| OutputRow::new(run, &config, &python_version, record)),
            );
        }

        Ok(())
    }
}
