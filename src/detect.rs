//! Change detection between two road-network snapshots.
//!
//! Both snapshots are cut to the area of interest, stripped of excluded roads
//! and projected to UTM. Every older road is grown by a fixed buffer; a newer
//! road is a candidate when it touches none of those buffers. Candidates are
//! projected back to WGS84 before they are written.
//!
//! The test is an existential scan over all older roads (`O(n*m)`), with a
//! bounding-box reject in front of each exact distance check.

use crate::config::{BoundingBox, DetectionSettings};
use crate::error::Result;
use crate::projection::{UtmZone, vertex_count};
use crate::snapshot::{ExclusionRule, Road, Snapshot, write_features};
use geo::{BoundingRect as _, Coord, EuclideanDistance as _, LineString, Rect};
use std::path::{Path, PathBuf};

/// A planar line grown by `distance` on every side (round caps and joins).
///
/// Intersecting the buffer is equivalent to lying within `distance` of the
/// line, so the buffer polygon itself is never materialised.
#[derive(Debug, Clone)]
pub struct BufferedLine {
    line: LineString<f64>,
    distance: f64,
    envelope: Option<Rect<f64>>,
}

impl BufferedLine {
    pub fn new(line: LineString<f64>, distance: f64) -> Self {
        let envelope = line.bounding_rect().map(|r| {
            Rect::new(
                Coord {
                    x: r.min().x - distance,
                    y: r.min().y - distance,
                },
                Coord {
                    x: r.max().x + distance,
                    y: r.max().y + distance,
                },
            )
        });
        Self {
            line,
            distance,
            envelope,
        }
    }

    pub fn intersects(&self, other: &LineString<f64>) -> bool {
        let (Some(envelope), Some(bounds)) = (self.envelope, other.bounding_rect()) else {
            return false;
        };
        let disjoint = bounds.max().x < envelope.min().x
            || bounds.min().x > envelope.max().x
            || bounds.max().y < envelope.min().y
            || bounds.min().y > envelope.max().y;
        if disjoint {
            return false;
        }
        self.line.euclidean_distance(other) <= self.distance
    }
}

/// Returns the newer roads that touch no buffered older road, in input order.
///
/// Both slices must already be in the same planar frame.
pub fn find_new_roads(old: &[Road], new: &[Road], distance: f64) -> Vec<Road> {
    let buffered: Vec<BufferedLine> = old
        .iter()
        .map(|road| BufferedLine::new(road.geometry.clone(), distance))
        .collect();

    new.iter()
        .filter(|road| !buffered.iter().any(|b| b.intersects(&road.geometry)))
        .cloned()
        .collect()
}

/// Outcome of comparing one snapshot pair.
#[derive(Debug, Clone)]
pub struct DetectionReport {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    /// Roads compared after bbox, kind and exclusion filtering
    pub old_count: usize,
    pub new_count: usize,
    /// New-road candidates in WGS84
    pub candidates: Vec<Road>,
    /// Set only when candidates were written
    pub output: Option<PathBuf>,
}

impl DetectionReport {
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }
}

/// Stateless detector configured from [`DetectionSettings`].
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    exclusion: ExclusionRule,
    zone: UtmZone,
    buffer_distance: f64,
}

impl ChangeDetector {
    pub fn new(exclusion: ExclusionRule, zone: UtmZone, buffer_distance: f64) -> Self {
        Self {
            exclusion,
            zone,
            buffer_distance,
        }
    }

    pub fn from_settings(settings: &DetectionSettings) -> Self {
        Self::new(
            ExclusionRule::new(settings.exclusion.clone()),
            UtmZone::new(settings.utm_zone, settings.utm_north),
            settings.buffer_distance,
        )
    }

    fn project(&self, snapshot: Snapshot) -> Vec<Road> {
        snapshot
            .without(&self.exclusion)
            .roads
            .into_iter()
            .map(|road| Road::new(self.zone.project_line(&road.geometry), road.properties))
            .collect()
    }

    /// Compares two loaded snapshots, returning candidates in WGS84.
    pub fn compare(&self, old: Snapshot, new: Snapshot) -> (usize, usize, Vec<Road>) {
        let old_planar = self.project(old);
        let new_planar = self.project(new);

        tracing::debug!(
            "Comparing {} old roads ({} vertices) with {} new roads ({} vertices) in EPSG:{}",
            old_planar.len(),
            vertex_count(old_planar.iter().map(|r| &r.geometry)),
            new_planar.len(),
            vertex_count(new_planar.iter().map(|r| &r.geometry)),
            self.zone.epsg()
        );

        let candidates = find_new_roads(&old_planar, &new_planar, self.buffer_distance)
            .into_iter()
            .map(|road| Road::new(self.zone.unproject_line(&road.geometry), road.properties))
            .collect();

        (old_planar.len(), new_planar.len(), candidates)
    }

    /// Loads both snapshots, compares them and writes candidates to `output`.
    ///
    /// Nothing is written when there are no candidates.
    ///
    /// # Errors
    ///
    /// Any unreadable or malformed input aborts the comparison.
    pub fn detect(
        &self,
        old_path: &Path,
        new_path: &Path,
        bbox: &BoundingBox,
        output: &Path,
    ) -> Result<DetectionReport> {
        tracing::info!(
            "Detecting changes: {} -> {}",
            old_path.display(),
            new_path.display()
        );

        let old = Snapshot::load(old_path, bbox)?;
        let new = Snapshot::load(new_path, bbox)?;
        let (old_count, new_count, candidates) = self.compare(old, new);

        let output = if candidates.is_empty() {
            tracing::info!("No new roads detected.");
            None
        } else {
            write_features(output, &candidates)?;
            tracing::info!(
                "Saved {} detected roads to {}",
                candidates.len(),
                output.display()
            );
            Some(output.to_path_buf())
        };

        Ok(DetectionReport {
            old_path: old_path.to_path_buf(),
            new_path: new_path.to_path_buf(),
            old_count,
            new_count,
            candidates,
            output,
        })
    }
}
