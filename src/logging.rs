//! Run logging for roadwatch
//!
//! Every step of a pipeline run is written twice: to the console and to an
//! append-only run log (`pipeline_log.txt` by default) in the working
//! directory. Each line carries a local `%Y-%m-%d %H:%M:%S` timestamp and level.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! roadwatch::logging::init(Path::new("."), "pipeline_log.txt")?;
//! tracing::info!("Starting pipeline");
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::ChronoLocal, layer::SubscriberExt as _,
    util::SubscriberInitExt as _,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Splits `pipeline_log.txt` into the appender's prefix and suffix.
fn split_file_name(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rsplit_once('.') {
        Some((prefix, suffix)) if !prefix.is_empty() && !suffix.is_empty() => {
            (prefix, Some(suffix))
        }
        _ => (file_name, None),
    }
}

/// Path of the run log inside `dir`.
pub fn log_path(dir: &Path, file_name: &str) -> PathBuf {
    dir.join(file_name)
}

/// Initializes console and run-log output.
///
/// The run log is never rotated; lines from successive runs accumulate in
/// the same file. `RUST_LOG` overrides the default `info` filter.
///
/// # Errors
///
/// Returns error if the log directory cannot be created, the file appender
/// cannot be opened, or a global subscriber is already installed.
pub fn init(dir: &Path, file_name: &str) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    }

    let (prefix, suffix) = split_file_name(file_name);
    let mut builder = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(prefix);
    if let Some(suffix) = suffix {
        builder = builder.filename_suffix(suffix);
    }
    let run_log_appender = builder
        .build(dir)
        .context("Failed to create run-log file appender")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    let stdout_layer = fmt::layer()
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_owned()))
        .with_target(false)
        .compact();

    let run_log_layer = fmt::layer()
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_owned()))
        .with_target(true)
        .with_ansi(false)
        .with_writer(run_log_appender);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(run_log_layer)
        .try_init()
        .context("Failed to install global subscriber")?;

    tracing::debug!(
        "Logging initialized, run log: {}",
        log_path(dir, file_name).display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_file_name() {
        assert_eq!(split_file_name("pipeline_log.txt"), ("pipeline_log", Some("txt")));
        assert_eq!(split_file_name("run.log.txt"), ("run.log", Some("txt")));
        assert_eq!(split_file_name("runlog"), ("runlog", None));
        assert_eq!(split_file_name(".hidden"), (".hidden", None));
    }

    #[test]
    fn test_log_path() {
        let path = log_path(Path::new("/tmp/run"), "pipeline_log.txt");
        assert!(path.ends_with("run/pipeline_log.txt"));
    }
}
