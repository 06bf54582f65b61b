//! GeoJSON reading and writing.

use super::{Properties, Road};
use crate::error::{Result, RoadwatchError, ResultExt as _};
use geo::Geometry;
use geojson::{Feature, FeatureCollection, GeoJson};
use std::path::Path;

/// A feature as read from disk, before any filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFeature {
    pub geometry: Option<Geometry<f64>>,
    pub properties: Properties,
}

fn convert_feature(feature: Feature) -> Result<SourceFeature> {
    let geometry = match feature.geometry {
        Some(geometry) => Some(Geometry::<f64>::try_from(geometry.value)?),
        None => None,
    };
    Ok(SourceFeature {
        geometry,
        properties: feature.properties.unwrap_or_default(),
    })
}

/// Parses GeoJSON text into features.
///
/// A bare `Feature` or `Geometry` document is treated as a one-element
/// collection.
pub fn parse_features(contents: &str) -> Result<Vec<SourceFeature>> {
    let geojson: GeoJson = contents.parse()?;
    match geojson {
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .map(convert_feature)
            .collect(),
        GeoJson::Feature(feature) => Ok(vec![convert_feature(feature)?]),
        GeoJson::Geometry(geometry) => Ok(vec![SourceFeature {
            geometry: Some(Geometry::<f64>::try_from(geometry.value)?),
            properties: Properties::new(),
        }]),
    }
}

/// Reads every feature of a GeoJSON file.
///
/// # Errors
///
/// Returns error if the file cannot be read or does not parse as GeoJSON.
pub fn read_features(path: &Path) -> Result<Vec<SourceFeature>> {
    if !path.exists() {
        return Err(RoadwatchError::InvalidPath(format!(
            "{} does not exist",
            path.display()
        )));
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_features(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn to_feature_collection(roads: &[Road]) -> FeatureCollection {
    let features = roads
        .iter()
        .map(|road| Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&road.geometry))),
            id: None,
            properties: Some(road.properties.clone()),
            foreign_members: None,
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Writes roads as a GeoJSON `FeatureCollection`, replacing any existing file.
pub fn write_features(path: &Path, roads: &[Road]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let document = GeoJson::FeatureCollection(to_feature_collection(roads)).to_string();
    std::fs::write(path, document)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
