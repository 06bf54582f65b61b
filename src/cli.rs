use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use roadwatch::compare::VisualComparator;
use roadwatch::config::PipelineConfig;
use roadwatch::construction::run_construction;
use roadwatch::detect::ChangeDetector;
use roadwatch::history::run_history;
use roadwatch::patch::export_patch;
use roadwatch::pipeline::run_pipeline;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "roadwatch",
    version,
    about = "Detect newly built roads between OSM snapshots"
)]
pub struct Cli {
    /// JSON configuration file. Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory that relative input and output paths resolve against
    #[arg(long, global = true)]
    pub work_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every stage in order (the default)
    Run,
    /// Compare two snapshots and write the new-road candidates
    Detect {
        /// Older snapshot
        old: PathBuf,

        /// Newer snapshot
        new: PathBuf,

        /// Output GeoJSON for candidates
        #[arg(short, long, default_value = "changes.geojson")]
        output: PathBuf,
    },
    /// Fetch highway=construction ways inside the bounding box
    Construction {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Look up first-mapped timestamps for OSM ways
    History {
        /// Way ids; the configured list is used when none are given
        ways: Vec<u64>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Score the visual similarity of two GeoJSON files
    Compare {
        first: PathBuf,
        second: PathBuf,

        /// Difference image
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert a change-set into a patch record and text summary
    Patch {
        input: PathBuf,

        #[arg(long)]
        json: Option<PathBuf>,

        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Write the default configuration to a file
    InitConfig {
        #[arg(default_value = "roadwatch.json")]
        path: PathBuf,
    },
}

impl Cli {
    /// Whether the chosen command is a pipeline stage that writes to the run log.
    pub fn writes_run_log(&self) -> bool {
        !matches!(self.command, Some(Commands::InitConfig { .. }))
    }

    /// Loads the configuration file if one was given and applies overrides.
    pub fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(dir) = &self.work_dir {
            config.work_dir.clone_from(dir);
        }
        Ok(config)
    }
}

pub fn run_command(command: Option<Commands>, config: &PipelineConfig) -> Result<()> {
    match command.unwrap_or(Commands::Run) {
        Commands::Run => handle_run(config),
        Commands::Detect { old, new, output } => handle_detect(config, old, new, output),
        Commands::Construction { output } => handle_construction(config, output),
        Commands::History { ways, output } => handle_history(config, ways, output),
        Commands::Compare {
            first,
            second,
            output,
        } => handle_compare(config, first, second, output),
        Commands::Patch {
            input,
            json,
            summary,
        } => handle_patch(config, input, json, summary),
        Commands::InitConfig { path } => handle_init_config(config, path),
    }
}

fn handle_run(config: &PipelineConfig) -> Result<()> {
    let report = run_pipeline(config).context("Pipeline failed")?;
    println!("{}", report.summary());
    Ok(())
}

fn handle_detect(
    config: &PipelineConfig,
    old: PathBuf,
    new: PathBuf,
    output: PathBuf,
) -> Result<()> {
    let detector = ChangeDetector::from_settings(&config.detection);
    let report = detector.detect(
        &config.resolve(&old),
        &config.resolve(&new),
        &config.bbox,
        &config.resolve(&output),
    )?;
    println!(
        "{} new roads ({} old, {} new compared)",
        report.candidate_count(),
        report.old_count,
        report.new_count
    );
    Ok(())
}

fn handle_construction(config: &PipelineConfig, output: Option<PathBuf>) -> Result<()> {
    let output = config.resolve(&output.unwrap_or_else(|| config.construction.output.clone()));
    let count = run_construction(&config.construction, &config.bbox, &output)?;
    println!("{count} construction features");
    Ok(())
}

fn handle_history(config: &PipelineConfig, ways: Vec<u64>, output: Option<PathBuf>) -> Result<()> {
    let mut settings = config.history.clone();
    if !ways.is_empty() {
        settings.way_ids = ways;
    }
    let output = config.resolve(&output.unwrap_or_else(|| settings.output.clone()));
    let records = run_history(&settings, &output)?;
    for record in records {
        println!("{}\t{}", record.way_id, record.timestamp);
    }
    Ok(())
}

fn handle_compare(
    config: &PipelineConfig,
    first: PathBuf,
    second: PathBuf,
    output: Option<PathBuf>,
) -> Result<()> {
    let output = config.resolve(&output.unwrap_or_else(|| config.compare.output.clone()));
    let report = VisualComparator::from_settings(&config.compare).run(
        &config.resolve(&first),
        &config.resolve(&second),
        &output,
    )?;
    println!("SSIM Score: {:.4}", report.score);
    Ok(())
}

fn handle_patch(
    config: &PipelineConfig,
    input: PathBuf,
    json: Option<PathBuf>,
    summary: Option<PathBuf>,
) -> Result<()> {
    let json = config.resolve(&json.unwrap_or_else(|| config.patch.json_output.clone()));
    let summary = config.resolve(&summary.unwrap_or_else(|| config.patch.summary_output.clone()));
    match export_patch(&config.resolve(&input), &json, &summary)? {
        Some(written) => println!("{} roads written to {}", written.entries, json.display()),
        None => println!("No patch written"),
    }
    Ok(())
}

fn handle_init_config(config: &PipelineConfig, path: PathBuf) -> Result<()> {
    let path = config.resolve(&path);
    config
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["roadwatch"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli =
            Cli::try_parse_from(["roadwatch", "history", "1", "2", "--work-dir", "/tmp/run"])
                .unwrap();
        assert_eq!(cli.work_dir, Some(PathBuf::from("/tmp/run")));
        match cli.command {
            Some(Commands::History { ways, output }) => {
                assert_eq!(ways, vec![1, 2]);
                assert!(output.is_none());
            }
            _ => panic!("expected history"),
        }
    }

    #[test]
    fn test_work_dir_override() {
        let cli = Cli::try_parse_from(["roadwatch", "--work-dir", "data"]).unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config.work_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_init_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roadwatch.json");
        handle_init_config(&PipelineConfig::default(), path.clone()).unwrap();

        let cli = Cli::try_parse_from(["roadwatch", "--config", path.to_str().unwrap()]).unwrap();
        let loaded = cli.load_config().unwrap();
        assert_eq!(loaded.history.way_ids, PipelineConfig::default().history.way_ids);
    }

    #[test]
    fn test_init_config_resolves_against_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "roadwatch",
            "--work-dir",
            dir.path().to_str().unwrap(),
            "init-config",
            "settings/roadwatch.json",
        ])
        .unwrap();
        assert!(!cli.writes_run_log());

        let config = cli.load_config().unwrap();
        run_command(cli.command, &config).unwrap();

        assert!(dir.path().join("settings/roadwatch.json").exists());
        assert!(!dir.path().join("pipeline_log.txt").exists());
    }

    #[test]
    fn test_stages_write_run_log() {
        assert!(Cli::try_parse_from(["roadwatch"]).unwrap().writes_run_log());
        assert!(
            Cli::try_parse_from(["roadwatch", "history"])
                .unwrap()
                .writes_run_log()
        );
    }
}
