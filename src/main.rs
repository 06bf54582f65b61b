//! # roadwatch
//!
//! Runs the change-detection pipeline from the command line.
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Load configuration, apply --work-dir
//!   ├─> Start console + run-log output (not for init-config)
//!   └─> Run the chosen stage, or the whole pipeline when none is given
//! ```
//!
//! ```bash
//! roadwatch                          # full run with built-in defaults
//! roadwatch --work-dir data run
//! roadwatch detect 2016.geojson 2017.geojson -o changes.geojson
//! roadwatch init-config roadwatch.json
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // Allow println! in main binary

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = cli.load_config()?;

    if cli.writes_run_log() {
        roadwatch::logging::init(&config.work_dir, &config.log_file)?;
    }

    if let Err(e) = cli::run_command(cli.command, &config) {
        tracing::error!("{e:#}");
        return Err(e);
    }
    Ok(())
}
