use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use super::eco_ci::MeasurementRecord;
use crate::github::WorkflowRun;

/// One row of the consolidated dataset
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow {
    pub run_id: u64,
    pub config: String,
    pub workflow: String,
    pub branch: String,
    pub stage: String,
    pub energy_joules: f64,
    pub duration_seconds: f64,
    pub timestamp: String,
    pub python_version: String,
}

impl OutputRow {
    pub fn new(
        run: &WorkflowRun,
        config: &str,
        python_version: &str,
        record: MeasurementRecord,
    ) -> Self {
        Self {
            run_id: run.id,
            config: config.to_string(),
            workflow: run.workflow_label().to_string(),
            branch: run.branch_label().to_string(),
            stage: record.stage,
            energy_joules: record.energy_joules,
            duration_seconds: record.duration_seconds,
            timestamp: record.timestamp,
            python_version: python_version.to_string(),
        }
    }
}

/// Write the header and all rows to `path`, creating parent directories
pub fn write_rows(path: &Path, rows: &[OutputRow]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .context("Failed to write CSV record")?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;

    Ok(())
}
