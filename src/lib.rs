//! # roadwatch - road change detection over OSM snapshots
//!
//! roadwatch finds roads that appear between successive GeoJSON snapshots of
//! one area, cross-checks them against live construction tagging, looks up
//! when known ways were first mapped, scores how different two snapshots look
//! and writes the detected changes as a patch record.
//!
//! ## Quick Start
//!
//! ```no_run
//! use roadwatch::config::PipelineConfig;
//!
//! let config = PipelineConfig::default();
//! roadwatch::logging::init(&config.work_dir, &config.log_file)?;
//! let report = roadwatch::pipeline::run_pipeline(&config)?;
//! println!("{}", report.summary());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`snapshot`]: loading, clipping and filtering road snapshots
//! - [`detect`]: buffer-based new-road detection in UTM
//! - [`construction`]: Overpass query for `highway=construction` ways
//! - [`history`]: first-mapped timestamps from the OSM history API
//! - [`compare`]: rasterisation, Otsu binarisation and SSIM scoring
//! - [`patch`]: patch record and summary export
//! - [`pipeline`]: the sequential driver
//! - [`config`], [`error`], [`logging`]: run settings, errors, run log
//!
//! ## Error policy
//!
//! Network stages degrade instead of failing: the construction fetch yields an
//! empty set and the history lookup yields a descriptive string per way.
//! Unreadable snapshots abort the run, except for patch export which logs the
//! failure and writes nothing.

#![warn(clippy::all, rust_2018_idioms)]

pub mod compare;
pub mod config;
pub mod construction;
pub mod detect;
pub mod error;
pub mod history;
pub mod http;
pub mod logging;
pub mod patch;
pub mod pipeline;
pub mod projection;
pub mod snapshot;
