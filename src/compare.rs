//! Visual comparison of two snapshots.
//!
//! Both snapshots are drawn in a shared frame (the union of their extents)
//! onto equally sized canvases, binarised, and scored with windowed SSIM.
//! The per-pixel difference is written as a heat-coloured image.

pub mod heatmap;
pub mod render;
pub mod ssim;

use crate::config::CompareSettings;
use crate::error::{Result, RoadwatchError};
use crate::snapshot::read_features;
use geo::Geometry;
use render::{Frame, total_bounds};
use std::path::{Path, PathBuf};

/// Binary images span `0.0..=1.0`.
const DATA_RANGE: f64 = 1.0;

/// Outcome of one visual comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct SsimReport {
    /// Score rounded to four decimals
    pub score: f64,
    pub raw_score: f64,
    /// Otsu levels chosen for the first and second rendering
    pub thresholds: (u8, u8),
    pub width: u32,
    pub height: u32,
    /// Pixels whose binary value differs between the two renderings
    pub changed_pixels: usize,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct VisualComparator {
    width: u32,
    height: u32,
    stroke_width: f64,
    window: usize,
}

impl VisualComparator {
    pub fn new(width: u32, height: u32, stroke_width: f64, window: usize) -> Self {
        Self {
            width,
            height,
            stroke_width,
            window,
        }
    }

    pub fn from_settings(settings: &CompareSettings) -> Self {
        Self::new(
            settings.width,
            settings.height,
            settings.stroke_width,
            settings.window,
        )
    }

    fn geometries(path: &Path) -> Result<Vec<Geometry<f64>>> {
        Ok(read_features(path)?
            .into_iter()
            .filter_map(|feature| feature.geometry)
            .collect())
    }

    /// Scores two in-memory geometry sets and returns the score with the diff.
    pub fn score(
        &self,
        first: &[Geometry<f64>],
        second: &[Geometry<f64>],
    ) -> Result<(f64, (u8, u8), ndarray::Array2<f64>)> {
        let combined: Vec<Geometry<f64>> = first.iter().chain(second).cloned().collect();
        let bounds = total_bounds(&combined).ok_or_else(|| {
            RoadwatchError::Geometry("both snapshots are empty, nothing to compare".to_owned())
        })?;
        let frame = Frame::new(bounds, self.width, self.height);

        let (a, level_a) = ssim::binarize(&render::render(first, &frame, self.stroke_width));
        let (b, level_b) = ssim::binarize(&render::render(second, &frame, self.stroke_width));

        let raw = ssim::structural_similarity(&a, &b, self.window, DATA_RANGE)?;
        Ok((raw, (level_a, level_b), ssim::abs_diff(&a, &b)))
    }

    /// Compares two GeoJSON files and writes the difference image to `output`.
    ///
    /// # Errors
    ///
    /// Fails on unreadable inputs, when neither file has any geometry, or
    /// when the image cannot be written.
    pub fn run(&self, first: &Path, second: &Path, output: &Path) -> Result<SsimReport> {
        tracing::info!(
            "Comparing rendered snapshots: {} vs {}",
            first.display(),
            second.display()
        );

        let first_geoms = Self::geometries(first)?;
        let second_geoms = Self::geometries(second)?;
        let (raw_score, thresholds, diff) = self.score(&first_geoms, &second_geoms)?;
        let score = ssim::round4(raw_score);

        heatmap::save_heatmap(&diff, output)?;
        let changed_pixels = diff.iter().filter(|&&v| v > 0.0).count();

        tracing::info!("SSIM Score: {score:.4}");
        tracing::debug!(
            "Otsu levels {:?}, {changed_pixels} changed pixels, diff saved to {}",
            thresholds,
            output.display()
        );

        Ok(SsimReport {
            score,
            raw_score,
            thresholds,
            width: self.width,
            height: self.height,
            changed_pixels,
            output: output.to_path_buf(),
        })
    }
}
