/// Progress events emitted while walking runs and artifacts
#[derive(Debug, Clone)]
pub enum CollectionEvent {
    /// A workflow run's artifact list was inspected
    RunScanned { eco_ci_artifacts: usize },
    /// An artifact archive was downloaded and parsed
    ArtifactDownloaded { bytes: u64, records: usize },
    /// An artifact could not be downloaded
    ArtifactSkipped,
}

/// Statistics aggregated from collection events
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectionStats {
    pub runs_scanned: usize,
    pub runs_without_artifacts: usize,
    pub artifacts_downloaded: usize,
    pub artifacts_skipped: usize,
    /// Downloaded artifacts that yielded no records
    pub artifacts_empty: usize,
    pub bytes_downloaded: u64,
    pub records_extracted: usize,
}

impl CollectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with a collection event
    pub fn update(&mut self, event: &CollectionEvent) {
        match event {
            CollectionEvent::RunScanned { eco_ci_artifacts } => {
                self.runs_scanned += 1;
                if *eco_ci_artifacts == 0 {
                    self.runs_without_artifacts += 1;
                }
            }
            CollectionEvent::ArtifactDownloaded { bytes, records } => {
                self.artifacts_downloaded += 1;
                self.bytes_downloaded += bytes;
                self.records_extracted += records;
                if *records == 0 {
                    self.artifacts_empty += 1;
                }
            }
            CollectionEvent::ArtifactSkipped => {
                self.artifacts_skipped += 1;
            }
        }
    }

    /// Human-readable summary, one counter per line
    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            format!("Runs scanned: {}", self.runs_scanned),
            format!(
                "Runs without Eco-CI artifacts: {}",
                self.runs_without_artifacts
            ),
            format!("Artifacts downloaded: {}", self.artifacts_downloaded),
            format!("Artifacts skipped: {}", self.artifacts_skipped),
            format!("Artifacts without measurements: {}", self.artifacts_empty),
            format!(
                "Data downloaded: {:.2} KiB",
                self.bytes_downloaded as f64 / 1024.0
            ),
            format!("Measurements extracted: {}", self.records_extracted),
        ]
    }
}
