//! Road-network snapshots.
//!
//! A snapshot is the set of line geometries read from one GeoJSON file,
//! restricted to an area of interest. Each [`Road`] keeps the feature's
//! attribute map untouched so it can be written back out verbatim.

pub mod exclusion;
pub mod io;

pub use exclusion::ExclusionRule;
pub use io::{SourceFeature, read_features, write_features};

use crate::config::BoundingBox;
use crate::error::Result;
use geo::{Geometry, Intersects as _, LineString};
use serde_json::{Map, Value};
use std::path::Path;

/// Attribute map of a feature.
pub type Properties = Map<String, Value>;

/// A single line geometry plus its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Road {
    pub geometry: LineString<f64>,
    pub properties: Properties,
}

impl Road {
    pub fn new(geometry: LineString<f64>, properties: Properties) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    /// String value of an attribute; `None` when missing, null or not a string.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.property_str("name")
    }

    pub fn reference(&self) -> Option<&str> {
        self.property_str("ref")
    }

    pub fn highway(&self) -> Option<&str> {
        self.property_str("highway")
    }

    pub fn point_count(&self) -> usize {
        self.geometry.0.len()
    }
}

/// Line geometries of one snapshot file inside a bounding box.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub roads: Vec<Road>,
}

impl Snapshot {
    /// Loads `path`, keeping only `LineString` features that intersect `bbox`.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing or is not valid GeoJSON.
    pub fn load(path: &Path, bbox: &BoundingBox) -> Result<Self> {
        tracing::info!("Loading map: {}", path.display());
        let features = read_features(path)?;
        Ok(Self::from_features(features, bbox))
    }

    pub fn from_features(features: Vec<SourceFeature>, bbox: &BoundingBox) -> Self {
        let rect = bbox.to_rect();
        let roads = features
            .into_iter()
            .filter_map(|feature| match feature.geometry {
                Some(Geometry::LineString(line)) if line.intersects(&rect) => {
                    Some(Road::new(line, feature.properties))
                }
                _ => None,
            })
            .collect();
        Self { roads }
    }

    pub fn len(&self) -> usize {
        self.roads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty()
    }

    /// Drops every road matched by `rule`.
    #[must_use]
    pub fn without(self, rule: &ExclusionRule) -> Self {
        Self {
            roads: rule.apply(self.roads),
        }
    }
}
