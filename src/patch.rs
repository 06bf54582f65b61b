//! Conversion of a change-set into a patch record and a flat text summary.
//!
//! The record has the shape `{"patch": {"roads": [...]}}` with one entry per
//! line feature, in input order. The summary carries the same entries, one
//! line each.

use crate::error::{Result, ResultExt as _};
use crate::snapshot::{Properties, SourceFeature, read_features};
use geo::Geometry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Identifier used when a feature carries neither `@id` nor `osm_id`.
pub const UNKNOWN_ID: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadEntry {
    pub id: Value,
    pub geometry: Vec<[f64; 2]>,
    #[serde(rename = "ref")]
    pub reference: String,
    pub name: String,
    pub highway: String,
}

impl RoadEntry {
    /// `ID: <id> | Ref: <ref> | Name: <name> | Type: <highway> | Points: <n>`
    pub fn summary_line(&self) -> String {
        format!(
            "ID: {} | Ref: {} | Name: {} | Type: {} | Points: {}",
            value_text(&self.id),
            self.reference,
            self.name,
            self.highway,
            self.geometry.len()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadList {
    pub roads: Vec<RoadEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub patch: RoadList,
}

impl Patch {
    pub fn roads(&self) -> &[RoadEntry] {
        &self.patch.roads
    }

    pub fn summary(&self) -> String {
        self.roads()
            .iter()
            .map(RoadEntry::summary_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Where a patch was written and how many entries it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSummary {
    pub entries: usize,
    pub json_output: PathBuf,
    pub summary_output: PathBuf,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn entry_id(properties: &Properties) -> Value {
    if let Some(id) = properties.get("@id").filter(|v| is_truthy(v)) {
        return id.clone();
    }
    match properties.get("osm_id") {
        Some(id) if !id.is_null() => id.clone(),
        _ => Value::from(UNKNOWN_ID),
    }
}

fn text_field(properties: &Properties, key: &str) -> String {
    match properties.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(value) => value_text(value),
    }
}

/// Builds the patch from features; anything that is not a `LineString` is skipped.
pub fn build_patch(features: &[SourceFeature]) -> Patch {
    let roads = features
        .iter()
        .filter_map(|feature| match &feature.geometry {
            Some(Geometry::LineString(line)) => Some(RoadEntry {
                id: entry_id(&feature.properties),
                geometry: line.coords().map(|c| [c.x, c.y]).collect(),
                reference: text_field(&feature.properties, "ref"),
                name: text_field(&feature.properties, "name"),
                highway: text_field(&feature.properties, "highway"),
            }),
            _ => None,
        })
        .collect();

    Patch {
        patch: RoadList { roads },
    }
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

/// Writes the patch record and its summary for the change-set at `input`.
///
/// An input that cannot be loaded is logged and yields `Ok(None)` with no
/// files written; only write failures are returned as errors.
pub fn export_patch(
    input: &Path,
    json_output: &Path,
    summary_output: &Path,
) -> Result<Option<PatchSummary>> {
    let features = match read_features(input) {
        Ok(features) => features,
        Err(e) => {
            tracing::error!("Failed to load GeoJSON: {e}");
            return Ok(None);
        }
    };

    let patch = build_patch(&features);
    write_text(json_output, &serde_json::to_string_pretty(&patch)?)?;
    write_text(summary_output, &patch.summary())?;

    tracing::info!(
        "Patch exported: {} roads to {} and {}",
        patch.roads().len(),
        json_output.display(),
        summary_output.display()
    );

    Ok(Some(PatchSummary {
        entries: patch.roads().len(),
        json_output: json_output.to_path_buf(),
        summary_output: summary_output.to_path_buf(),
    }))
}
