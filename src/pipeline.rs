//! Sequential driver for one full change-detection run.
//!
//! Stages run in a fixed order, each reading its inputs from and writing its
//! outputs to the work directory:
//!
//! 1. change detection for every configured snapshot pair
//! 2. construction fetch
//! 3. history table
//! 4. visual comparison
//! 5. patch export
//!
//! Network stages never abort the run. A missing or malformed snapshot does.
//!
//! ```no_run
//! use roadwatch::config::PipelineConfig;
//! use roadwatch::pipeline::run_pipeline;
//!
//! let config = PipelineConfig::default();
//! let report = run_pipeline(&config)?;
//! println!("{}", report.summary());
//! # Ok::<(), roadwatch::error::RoadwatchError>(())
//! ```

use crate::compare::{SsimReport, VisualComparator};
use crate::config::PipelineConfig;
use crate::construction::run_construction;
use crate::detect::ChangeDetector;
use crate::error::Result;
use crate::history::{NO_HISTORY, TimestampRecord, run_history};
use crate::patch::{PatchSummary, export_patch};
use std::path::PathBuf;

/// Candidate count for one snapshot pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairOutcome {
    pub old: PathBuf,
    pub new: PathBuf,
    pub candidates: usize,
    pub output: Option<PathBuf>,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub pairs: Vec<PairOutcome>,

    /// Construction ways returned by the interpreter
    pub construction: usize,

    pub timestamps: Vec<TimestampRecord>,

    pub ssim: SsimReport,

    /// `None` when the patch input could not be loaded
    pub patch: Option<PatchSummary>,

    /// Degraded stages that did not stop the run
    pub warnings: Vec<String>,

    pub started_at: chrono::DateTime<chrono::Local>,

    /// Time taken for execution
    pub duration: std::time::Duration,
}

impl RunReport {
    pub fn total_candidates(&self) -> usize {
        self.pairs.iter().map(|p| p.candidates).sum()
    }

    /// Create a summary message
    pub fn summary(&self) -> String {
        let resolved = self
            .timestamps
            .iter()
            .filter(|r| is_resolved(&r.timestamp))
            .count();
        format!(
            "Pipeline completed: {} new roads over {} pairs, {} constructions, {}/{} timestamps, SSIM {:.4}, {} patch entries, {:.2}s",
            self.total_candidates(),
            self.pairs.len(),
            self.construction,
            resolved,
            self.timestamps.len(),
            self.ssim.score,
            self.patch.as_ref().map_or(0, |p| p.entries),
            self.duration.as_secs_f64()
        )
    }
}

fn is_resolved(timestamp: &str) -> bool {
    !(timestamp == NO_HISTORY
        || timestamp.starts_with("Failed to fetch: ")
        || timestamp.starts_with("Error: "))
}

/// Runs every stage against `config`.
///
/// # Errors
///
/// Returns error if a snapshot or comparison input cannot be loaded, or if an
/// output file cannot be written.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunReport> {
    let start = std::time::Instant::now();
    let started_at = chrono::Local::now();
    let mut warnings = Vec::new();
    tracing::info!(
        "Pipeline started at {} in {}",
        started_at.format("%Y-%m-%d %H:%M:%S"),
        config.work_dir.display()
    );

    let detector = ChangeDetector::from_settings(&config.detection);
    let mut pairs = Vec::with_capacity(config.detection.pairs.len());
    for pair in &config.detection.pairs {
        let report = detector.detect(
            &config.resolve(&pair.old),
            &config.resolve(&pair.new),
            &config.bbox,
            &config.resolve(&pair.output),
        )?;
        pairs.push(PairOutcome {
            old: report.old_path.clone(),
            new: report.new_path.clone(),
            candidates: report.candidate_count(),
            output: report.output.clone(),
        });
    }

    let construction = run_construction(
        &config.construction,
        &config.bbox,
        &config.resolve(&config.construction.output),
    )?;
    if construction == 0 {
        warnings.push(format!(
            "No construction features for {}",
            config.construction.label
        ));
    }

    let timestamps = run_history(&config.history, &config.resolve(&config.history.output))?;
    for record in timestamps.iter().filter(|r| !is_resolved(&r.timestamp)) {
        warnings.push(format!("Way {}: {}", record.way_id, record.timestamp));
    }

    let ssim = VisualComparator::from_settings(&config.compare).run(
        &config.resolve(&config.compare.first),
        &config.resolve(&config.compare.second),
        &config.resolve(&config.compare.output),
    )?;

    let patch = export_patch(
        &config.resolve(&config.patch.input),
        &config.resolve(&config.patch.json_output),
        &config.resolve(&config.patch.summary_output),
    )?;
    if patch.is_none() {
        warnings.push(format!(
            "Patch skipped: {} could not be loaded",
            config.patch.input.display()
        ));
    }

    for warning in &warnings {
        tracing::warn!("{warning}");
    }

    let report = RunReport {
        pairs,
        construction,
        timestamps,
        ssim,
        patch,
        warnings,
        started_at,
        duration: start.elapsed(),
    };
    tracing::info!("{}", report.summary());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn report(timestamps: Vec<TimestampRecord>) -> RunReport {
        RunReport {
            pairs: vec![
                PairOutcome {
                    old: "2016.geojson".into(),
                    new: "2017.geojson".into(),
                    candidates: 2,
                    output: Some("changes_2016_2017.geojson".into()),
                },
                PairOutcome {
                    old: "2017.geojson".into(),
                    new: "2020.geojson".into(),
                    candidates: 0,
                    output: None,
                },
            ],
            construction: 0,
            timestamps,
            ssim: SsimReport {
                score: 0.9321,
                raw_score: 0.932_14,
                thresholds: (0, 0),
                width: 10,
                height: 10,
                changed_pixels: 4,
                output: "ssim.png".into(),
            },
            patch: None,
            warnings: Vec::new(),
            started_at: chrono::Local::now(),
            duration: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_summary() {
        let r = report(vec![
            TimestampRecord {
                way_id: 1,
                timestamp: "2008-09-21T21:34:58Z".to_owned(),
            },
            TimestampRecord {
                way_id: 2,
                timestamp: "Failed to fetch: 410".to_owned(),
            },
        ]);
        assert_eq!(r.total_candidates(), 2);
        assert_eq!(
            r.summary(),
            "Pipeline completed: 2 new roads over 2 pairs, 0 constructions, 1/2 timestamps, SSIM 0.9321, 0 patch entries, 1.50s"
        );
    }

    #[test]
    fn test_is_resolved() {
        assert!(is_resolved("2011-02-03T10:00:00Z"));
        assert!(is_resolved(""));
        assert!(!is_resolved(NO_HISTORY));
        assert!(!is_resolved("Error: connection refused"));
    }
}
