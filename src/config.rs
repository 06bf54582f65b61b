//! Pipeline configuration.
//!
//! Every constant the pipeline needs (area of interest, exclusion rule, way
//! ids, endpoints, timeouts, artifact names) lives in [`PipelineConfig`] and is
//! handed to each stage explicitly. The defaults reproduce the fixed A100 run,
//! so a missing config file means "run exactly as shipped".

use crate::error::{Result, ResultExt as _};
use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Rectangular filter in geographic coordinates (degrees, WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    pub fn to_rect(self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.min_lon,
                y: self.min_lat,
            },
            Coord {
                x: self.max_lon,
                y: self.max_lat,
            },
        )
    }

    /// Overpass bbox order: south, west, north, east.
    pub fn to_overpass(self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new(13.270, 52.490, 13.310, 52.520)
    }
}

/// One older/newer snapshot pair to run through the change detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionPair {
    pub old: PathBuf,
    pub new: PathBuf,
    pub output: PathBuf,
}

impl DetectionPair {
    pub fn new(old: &str, new: &str, output: &str) -> Self {
        Self {
            old: PathBuf::from(old),
            new: PathBuf::from(new),
            output: PathBuf::from(output),
        }
    }
}

/// Change detector settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    /// Substring matched against `name`/`ref` to drop features before comparison
    pub exclusion: String,
    /// Buffer distance in metres around every older geometry
    pub buffer_distance: f64,
    /// UTM zone used as the planar frame
    pub utm_zone: u8,
    pub utm_north: bool,
    pub pairs: Vec<DetectionPair>,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            exclusion: "A100".to_owned(),
            buffer_distance: 5.0,
            utm_zone: 33,
            utm_north: true,
            pairs: vec![
                DetectionPair::new("2016.geojson", "2017.geojson", "changes_2016_2017.geojson"),
                DetectionPair::new("2017.geojson", "2020.geojson", "changes_2017_2020.geojson"),
            ],
        }
    }
}

/// Construction fetcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructionSettings {
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Free-text label, only used in log lines
    pub label: String,
    pub output: PathBuf,
}

impl Default for ConstructionSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://overpass.kumi.systems/api/interpreter".to_owned(),
            timeout_secs: 20,
            label: "2016 to 2017".to_owned(),
            output: PathBuf::from("overpass_2016_2017.geojson"),
        }
    }
}

impl ConstructionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// History lookup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// API root, `/way/{id}/history` is appended
    pub base_url: String,
    pub timeout_secs: u64,
    pub way_ids: Vec<u64>,
    pub output: PathBuf,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openstreetmap.org/api/0.6".to_owned(),
            timeout_secs: 10,
            way_ids: vec![26_144_116, 169_762_615, 227_985_279, 407_967_885, 410_233_146],
            output: PathBuf::from("a100_timestamps.csv"),
        }
    }
}

impl HistorySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Visual comparator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareSettings {
    pub first: PathBuf,
    pub second: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Stroke width in pixels
    pub stroke_width: f64,
    /// Side of the square SSIM window (odd)
    pub window: usize,
}

impl Default for CompareSettings {
    fn default() -> Self {
        Self {
            first: PathBuf::from("2016.geojson"),
            second: PathBuf::from("2017.geojson"),
            output: PathBuf::from("ssim_2016_2017.png"),
            width: 1200,
            height: 1200,
            stroke_width: 4.0,
            window: 5,
        }
    }
}

/// Patch exporter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchSettings {
    pub input: PathBuf,
    pub json_output: PathBuf,
    pub summary_output: PathBuf,
}

impl Default for PatchSettings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("changes_2016_2017.geojson"),
            json_output: PathBuf::from("patch_2016_2017.json"),
            summary_output: PathBuf::from("patch_2016_2017.txt"),
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory every relative path is resolved against
    pub work_dir: PathBuf,
    pub log_file: String,
    pub bbox: BoundingBox,
    pub detection: DetectionSettings,
    pub construction: ConstructionSettings,
    pub history: HistorySettings,
    pub compare: CompareSettings,
    pub patch: PatchSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            log_file: "pipeline_log.txt".to_owned(),
            bbox: BoundingBox::default(),
            detection: DetectionSettings::default(),
            construction: ConstructionSettings::default(),
            history: HistorySettings::default(),
            compare: CompareSettings::default(),
            patch: PatchSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self =
            serde_json::from_str(&contents).context("Failed to parse pipeline config JSON")?;

        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize pipeline config")?;

        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }

    /// Resolve a configured path against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_a100_run() {
        let config = PipelineConfig::default();
        assert_eq!(config.bbox, BoundingBox::new(13.270, 52.490, 13.310, 52.520));
        assert_eq!(config.detection.exclusion, "A100");
        assert_eq!(config.history.way_ids.len(), 5);
        assert_eq!(config.detection.pairs.len(), 2);
        assert_eq!(config.construction.timeout(), Duration::from_secs(20));
        assert_eq!(config.history.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_overpass_bbox_order() {
        let bbox = BoundingBox::new(13.27, 52.49, 13.31, 52.52);
        assert_eq!(bbox.to_overpass(), "52.49,13.27,52.52,13.31");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"detection": {"exclusion": "B96"}}"#).unwrap();
        assert_eq!(config.detection.exclusion, "B96");
        assert!((config.detection.buffer_distance - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.log_file, "pipeline_log.txt");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("roadwatch.json");

        let mut config = PipelineConfig::default();
        config.history.way_ids = vec![1, 2, 3];
        config.save(&path).unwrap();

        let loaded = PipelineConfig::load(&path).unwrap();
        assert_eq!(loaded.history.way_ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(PipelineConfig::load(Path::new("/nonexistent/roadwatch.json")).is_err());
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let config = PipelineConfig {
            work_dir: PathBuf::from("/data/run"),
            ..Default::default()
        };
        assert_eq!(
            config.resolve(Path::new("2016.geojson")),
            PathBuf::from("/data/run/2016.geojson")
        );
        assert_eq!(
            config.resolve(Path::new("/tmp/x.geojson")),
            PathBuf::from("/tmp/x.geojson")
        );
    }
}
