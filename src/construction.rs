//! Fetches ways tagged `highway=construction` from an Overpass interpreter.
//!
//! One GET per run, bounded by the configured timeout. Any failure (transport,
//! non-success status, undecodable body) is logged and turns into an empty
//! result so the rest of the pipeline keeps going.

use crate::config::{BoundingBox, ConstructionSettings};
use crate::error::Result;
use crate::http;
use crate::snapshot::{Properties, Road, write_features};
use geo::{Coord, LineString};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// Server-side budget embedded in the query, in seconds.
const QUERY_TIMEOUT: u32 = 25;

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: u64,
    #[serde(default)]
    tags: Properties,
    geometry: Option<Vec<Option<OverpassPoint>>>,
}

#[derive(Debug, Deserialize)]
struct OverpassPoint {
    lat: f64,
    lon: f64,
}

/// Overpass QL for construction ways inside `bbox`, with inline geometry.
pub fn build_query(bbox: &BoundingBox) -> String {
    format!(
        "[out:json][timeout:{QUERY_TIMEOUT}];\nway[\"highway\"=\"construction\"]({});\nout geom;\n",
        bbox.to_overpass()
    )
}

/// Converts an Overpass JSON body into construction lines.
///
/// Only `way` elements with inline geometry are kept, and only when at least
/// two points survive. Tags are copied and `osm_id` is set to the way id.
pub fn parse_elements(body: &str) -> Result<Vec<Road>> {
    let response: OverpassResponse = serde_json::from_str(body)?;

    let roads = response
        .elements
        .into_iter()
        .filter(|el| el.kind == "way")
        .filter_map(|el| {
            let points = el.geometry?;
            let coords: Vec<Coord<f64>> = points
                .into_iter()
                .flatten()
                .map(|p| Coord { x: p.lon, y: p.lat })
                .collect();
            if coords.len() < 2 {
                return None;
            }
            let mut tags = el.tags;
            tags.insert("osm_id".to_owned(), Value::from(el.id));
            Some(Road::new(LineString::new(coords), tags))
        })
        .collect();

    Ok(roads)
}

fn request(settings: &ConstructionSettings, bbox: &BoundingBox) -> Result<String> {
    let client = http::client(settings.timeout())?;
    let query = build_query(bbox);
    let body = client
        .get(&settings.endpoint)
        .query(&[("data", query.as_str())])
        .send()?
        .error_for_status()?
        .text()?;
    Ok(body)
}

/// Queries the interpreter; never fails, an unusable answer is an empty set.
pub fn fetch_construction(settings: &ConstructionSettings, bbox: &BoundingBox) -> Vec<Road> {
    tracing::info!("Querying Overpass API for: {}", settings.label);

    let roads = match request(settings, bbox).and_then(|body| parse_elements(&body)) {
        Ok(roads) => roads,
        Err(e) => {
            tracing::warn!("Overpass API request failed: {e}");
            return Vec::new();
        }
    };

    tracing::info!("Overpass returned {} constructions.", roads.len());
    roads
}

/// Fetches construction ways and writes them to `output` when there are any.
///
/// Returns the number of features found.
pub fn run_construction(
    settings: &ConstructionSettings,
    bbox: &BoundingBox,
    output: &Path,
) -> Result<usize> {
    let roads = fetch_construction(settings, bbox);
    if !roads.is_empty() {
        write_features(output, &roads)?;
        tracing::info!("Saved construction features to {}", output.display());
    }
    Ok(roads.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_query() {
        let query = build_query(&BoundingBox::default());
        assert!(query.starts_with("[out:json][timeout:25];"));
        assert!(query.contains("way[\"highway\"=\"construction\"](52.49,13.27,52.52,13.31);"));
        assert!(query.trim_end().ends_with("out geom;"));
    }

    #[test]
    fn test_parse_elements() {
        let body = json!({
            "version": 0.6,
            "elements": [
                {
                    "type": "way",
                    "id": 407967885,
                    "tags": {"highway": "construction", "construction": "motorway"},
                    "geometry": [{"lat": 52.49, "lon": 13.28}, {"lat": 52.50, "lon": 13.29}]
                },
                {
                    "type": "way",
                    "id": 2,
                    "geometry": [{"lat": 52.49, "lon": 13.28}]
                },
                {
                    "type": "way",
                    "id": 3,
                    "tags": {"highway": "construction"}
                },
                {
                    "type": "node",
                    "id": 4,
                    "lat": 52.49,
                    "lon": 13.28
                }
            ]
        })
        .to_string();

        let roads = parse_elements(&body).unwrap();
        assert_eq!(roads.len(), 1);
        let road = &roads[0];
        assert_eq!(road.properties["osm_id"], json!(407_967_885_u64));
        assert_eq!(road.property_str("construction"), Some("motorway"));
        assert_eq!(road.geometry.0[0], Coord { x: 13.28, y: 52.49 });
    }

    #[test]
    fn test_parse_skips_null_points() {
        let body = r#"{"elements": [{"type": "way", "id": 9,
            "geometry": [{"lat": 1.0, "lon": 2.0}, null, {"lat": 3.0, "lon": 4.0}]}]}"#;
        let roads = parse_elements(body).unwrap();
        assert_eq!(roads[0].point_count(), 2);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_elements("<html>rate limited</html>").is_err());
    }

    #[test]
    fn test_unreachable_endpoint_yields_empty_set() {
        let settings = ConstructionSettings {
            endpoint: "http://127.0.0.1:9/api/interpreter".to_owned(),
            timeout_secs: 2,
            ..Default::default()
        };
        assert!(fetch_construction(&settings, &BoundingBox::default()).is_empty());
    }

    #[test]
    fn test_run_writes_nothing_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("overpass.geojson");
        let settings = ConstructionSettings {
            endpoint: "http://127.0.0.1:9/api/interpreter".to_owned(),
            timeout_secs: 2,
            ..Default::default()
        };
        let count = run_construction(&settings, &BoundingBox::default(), &output).unwrap();
        assert_eq!(count, 0);
        assert!(!output.exists());
    }
}
