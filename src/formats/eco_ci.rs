//! Extraction of Eco-CI measurements from artifact archives
//!
//! Eco-CI writes one or more JSON files into the artifact zip. Depending on
//! the Eco-CI version a file holds a bare array of measurements, an object
//! wrapping them under `measurements`, or a single measurement object:
//!
//! ```json
//! [
//!   {
//!     "label": "dependency-installation",
//!     "cpu_energy_J": 1.234,
//!     "total_energy_J": 1.567,
//!     "duration": 42.1,
//!     "time": "2024-01-01T12:00:00Z"
//!   }
//! ]
//! ```

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::io::{Cursor, Read};
use tracing::{debug, warn};
use zip::ZipArchive;

/// One energy measurement of a CI stage
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub stage: String,
    pub energy_joules: f64,
    pub duration_seconds: f64,
    /// ISO-8601 timestamp as written by Eco-CI, empty if absent
    pub timestamp: String,
}

/// Shape of one Eco-CI JSON document
#[derive(Debug)]
enum EcoCiPayload {
    /// `[ {...}, {...} ]`
    List(Vec<Value>),
    /// `{ "measurements": [ {...} ], ... }`
    Wrapped(Vec<Value>),
    /// `{ "label": ..., ... }`
    Single(Map<String, Value>),
    /// Scalars and strings carry no measurements
    Unsupported,
}

impl EcoCiPayload {
    fn classify(value: Value) -> Self {
        match value {
            Value::Array(items) => EcoCiPayload::List(items),
            Value::Object(mut object) => match object.remove("measurements") {
                Some(Value::Array(items)) => EcoCiPayload::Wrapped(items),
                Some(other) => {
                    object.insert("measurements".to_string(), other);
                    EcoCiPayload::Single(object)
                }
                None => EcoCiPayload::Single(object),
            },
            _ => EcoCiPayload::Unsupported,
        }
    }

    fn into_records(self, member: &str) -> Vec<MeasurementRecord> {
        let items = match self {
            EcoCiPayload::List(items) | EcoCiPayload::Wrapped(items) => items,
            EcoCiPayload::Single(object) => return vec![MeasurementRecord::from_object(&object)],
            EcoCiPayload::Unsupported => {
                debug!("Ignoring {}: not an object or array", member);
                return Vec::new();
            }
        };

        items
            .iter()
            .filter_map(|item| match item {
                Value::Object(object) => Some(MeasurementRecord::from_object(object)),
                other => {
                    warn!("Skipping non-object measurement in {}: {}", member, other);
                    None
                }
            })
            .collect()
    }
}

impl MeasurementRecord {
    fn from_object(object: &Map<String, Value>) -> Self {
        let energy = field(object, "total_energy_J").or_else(|| field(object, "cpu_energy_J"));

        Self {
            stage: field(object, "label")
                .map(text)
                .unwrap_or_else(|| "unknown".to_string()),
            energy_joules: energy.map(number).unwrap_or(0.0),
            duration_seconds: field(object, "duration").map(number).unwrap_or(0.0),
            timestamp: field(object, "time").map(text).unwrap_or_default(),
        }
    }
}

/// Field lookup treating JSON null as absent
fn field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|v| !v.is_null())
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numbers pass through, numeric strings are parsed, anything else is 0.0
fn number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Extract every measurement from an artifact archive
///
/// Never fails: an invalid archive or a malformed JSON member logs a warning
/// and yields no records for the whole artifact.
pub fn extract_measurements(raw: &[u8], artifact_name: &str) -> Vec<MeasurementRecord> {
    match parse_archive(raw, artifact_name) {
        Ok(records) => records,
        Err(e) => {
            warn!("Artifact '{}': {:#}", artifact_name, e);
            Vec::new()
        }
    }
}

fn parse_archive(raw: &[u8], artifact_name: &str) -> Result<Vec<MeasurementRecord>> {
    let mut archive = ZipArchive::new(Cursor::new(raw)).context("not a valid zip file")?;

    let mut records = Vec::new();
    let mut json_members = 0usize;

    // Archive order, so rows come out in the order Eco-CI wrote them
    for index in 0..archive.len() {
        let mut member = archive
            .by_index(index)
            .with_context(|| format!("unreadable archive member #{}", index))?;

        if !member.is_file() || !member.name().ends_with(".json") {
            continue;
        }
        json_members += 1;

        let name = member.name().to_string();
        let mut contents = Vec::new();
        member
            .read_to_end(&mut contents)
            .with_context(|| format!("failed to read {}", name))?;

        let payload: Value = serde_json::from_slice(&contents)
            .with_context(|| format!("JSON parse error in {}", name))?;
        records.extend(EcoCiPayload::classify(payload).into_records(&name));
    }

    if json_members == 0 {
        warn!("No JSON files found in artifact '{}'", artifact_name);
    }

    Ok(records)
}
