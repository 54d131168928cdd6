use anyhow::{Context, Result};
use cascade_sim::{ConcurrencyMode, LevelScheme, OutputFormat, RunConfig, SectorTransport, SimulationEngine};
use clap::{ArgAction, Parser};
use log::{info, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "cascade_sim")]
#[command(about = "Gamma-ray cascade simulation with listmode output", long_about = None)]
struct Cli {
    /// Level scheme file
    #[arg(short = 'l', long)]
    level_scheme: Option<PathBuf>,

    /// Number of detectors
    #[arg(short = 'n', long)]
    detectors: Option<usize>,

    /// Listmode output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short, long)]
    threads: Option<usize>,

    /// Interactive visualisation (not available in this build)
    #[arg(short, long, action = ArgAction::SetTrue)]
    visualise: bool,

    /// Total number of events
    #[arg(short, long)]
    events: Option<u64>,

    /// Base random seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Config TOML file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listmode output layout
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Write per-detector energy spectra to this file
    #[arg(long, value_name = "FILE")]
    histograms: Option<PathBuf>,

    /// Reject unreadable or inconsistent level schemes
    #[arg(long, action = ArgAction::SetTrue)]
    strict: bool,

    /// Run the workers one after another on the main thread
    #[arg(long, action = ArgAction::SetTrue)]
    sequential: bool,
}

impl Cli {
    fn into_config(self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => RunConfig::new(),
        };

        if let Some(level_scheme) = self.level_scheme {
            config.level_scheme = level_scheme;
        }
        if let Some(detectors) = self.detectors {
            config.detectors = detectors;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(events) = self.events {
            config.events = events;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if self.histograms.is_some() {
            config.histograms = self.histograms;
        }
        config.strict |= self.strict;
        if self.sequential {
            config.concurrency_mode = ConcurrencyMode::Sequential;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if cli.visualise {
        warn!("Visualisation is not available, running in batch mode");
    }
    let config = cli.into_config()?;

    let (scheme, _report) = if config.strict {
        LevelScheme::load_path(&config.level_scheme, true)?
    } else {
        LevelScheme::load_path_or_empty(&config.level_scheme)?
    };
    if scheme.is_empty() {
        warn!("Level scheme is empty, events will carry no gammas");
    } else {
        info!("Level scheme:\n{}", scheme);
    }

    let output = File::create(&config.output)
        .with_context(|| format!("Failed to create output {}", config.output.display()))?;
    let detectors = config.detectors;
    let histogram_path = config.histograms.clone();
    let output_path = config.output.clone();

    let engine = SimulationEngine::new(config, Arc::new(scheme))?;
    let start = Instant::now();
    let (summary, _) = engine.run(BufWriter::new(output), |_| SectorTransport::new(detectors))?;
    let elapsed = start.elapsed();

    if let Some(path) = histogram_path {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create histogram file {}", path.display()))?;
        let mut out = BufWriter::new(file);
        summary.write_histograms(&mut out)?;
        out.flush()?;
        info!("Energy spectra written to {}", path.display());
    }

    info!(
        "Wrote {} records ({} with data, {} detector hits) to {} in {:.2?}",
        summary.records,
        summary.records_with_data,
        summary.detectors_fired(),
        output_path.display(),
        elapsed
    );
    for report in &summary.workers {
        info!(
            "  worker {}: {} events, {} gammas, {} deposits",
            report.worker, report.events, report.gammas, report.hits
        );
    }
    Ok(())
}
