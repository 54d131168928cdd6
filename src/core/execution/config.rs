//! Configuration for a cascade simulation run
//!
//! This module provides the run configuration: detector layout and response,
//! worker count and concurrency mode, event count, seeding and output options.
//! It can be built in code or read from a TOML file.

use crate::core::detector::DetectorConfig;
use crate::core::errors::ConfigError;
use crate::core::record::OutputFormat;
use crate::core::types::{WorkerId, FIELDS_PER_DETECTOR};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

/// Enumeration of supported concurrency modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcurrencyMode {
    /// Workers run one after another on the calling thread
    Sequential,
    /// Workers run concurrently on a dedicated Rayon pool, one thread each
    #[default]
    Rayon,
}

/// Configuration for a simulation run
///
/// Missing keys in a TOML file fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Path of the level scheme description
    pub level_scheme: PathBuf,
    /// Number of detectors
    pub detectors: usize,
    /// Values stored per detector in each record
    pub fields: usize,
    /// Number of worker threads
    pub threads: usize,
    /// Total number of events, shared out between the workers
    pub events: u64,
    /// Base seed; a random one is drawn when absent
    pub seed: Option<u64>,
    /// How the workers are scheduled
    pub concurrency_mode: ConcurrencyMode,
    /// Records that may wait in the merge channel before workers block
    pub channel_capacity: usize,
    /// Listmode output path
    pub output: PathBuf,
    /// Listmode output layout
    pub format: OutputFormat,
    /// Optional path for the per-detector energy spectra
    pub histograms: Option<PathBuf>,
    /// Treat unreadable files, malformed lines and unresolved transitions
    /// in the level scheme as errors
    pub strict: bool,
    /// Per-detector response; detectors beyond the list, and keys left out
    /// of a `[[detector]]` table, use that detector's defaults
    #[serde(rename = "detector", deserialize_with = "detector_tables")]
    pub detector_configs: Vec<DetectorConfig>,
}

/// One `[[detector]]` table as written in the file
#[derive(Deserialize)]
struct DetectorTable {
    sigma0: Option<f64>,
    sigma1: Option<f64>,
    time_offset: Option<f64>,
}

fn detector_tables<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<DetectorConfig>, D::Error> {
    let tables = Vec::<DetectorTable>::deserialize(deserializer)?;
    Ok(tables
        .into_iter()
        .enumerate()
        .map(|(index, table)| {
            let default = DetectorConfig::default_for(index);
            DetectorConfig::new(
                table.sigma0.unwrap_or(default.sigma0),
                table.sigma1.unwrap_or(default.sigma1),
                table.time_offset.unwrap_or(default.time_offset),
            )
        })
        .collect())
}

impl RunConfig {
    /// Create a new run configuration with default values
    pub fn new() -> Self {
        Self {
            level_scheme: PathBuf::from("levelscheme.dat"),
            detectors: 6,
            fields: FIELDS_PER_DETECTOR,
            threads: 3,
            events: 10_000,
            seed: None,
            concurrency_mode: ConcurrencyMode::default(),
            channel_capacity: 1024,
            output: PathBuf::from("cascade_sim.dat"),
            format: OutputFormat::default(),
            histograms: None,
            strict: false,
            detector_configs: Vec::new(),
        }
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Set the concurrency mode for the run
    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Set the number of worker threads
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the number of detectors
    pub fn with_detectors(mut self, detectors: usize) -> Self {
        self.detectors = detectors;
        self
    }

    /// Set the total number of events
    pub fn with_events(mut self, events: u64) -> Self {
        self.events = events;
        self
    }

    /// Fix the base seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the merge channel capacity
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the output layout
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the response of each detector, in detector order
    pub fn with_detector_configs(mut self, configs: Vec<DetectorConfig>) -> Self {
        self.detector_configs = configs;
        self
    }

    /// Check the values that would make a run impossible
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::Invalid("at least one worker thread is required".to_string()));
        }
        if self.detectors == 0 {
            return Err(ConfigError::Invalid("at least one detector is required".to_string()));
        }
        if self.fields == 0 {
            return Err(ConfigError::Invalid("at least one field per detector is required".to_string()));
        }
        if self.detector_configs.len() > self.detectors {
            return Err(ConfigError::Invalid(format!(
                "{} detector responses given for {} detectors",
                self.detector_configs.len(),
                self.detectors
            )));
        }
        Ok(())
    }

    /// Response of detector `index`
    pub fn detector_config(&self, index: usize) -> DetectorConfig {
        self.detector_configs
            .get(index)
            .copied()
            .unwrap_or_else(|| DetectorConfig::default_for(index))
    }

    /// Number of events processed by worker `worker`
    pub fn events_for_worker(&self, worker: WorkerId) -> u64 {
        let threads = self.threads.max(1) as u64;
        let worker = worker as u64;
        self.events / threads + u64::from(worker < self.events % threads)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert_eq!(config.concurrency_mode, ConcurrencyMode::Rayon);
        assert_eq!(config.detectors, 6);
        assert_eq!(config.fields, 5);
        assert_eq!(config.threads, 3);
        assert_eq!(config.seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = RunConfig::new()
            .with_concurrency(ConcurrencyMode::Sequential)
            .with_threads(4)
            .with_events(10)
            .with_seed(42);

        assert_eq!(config.concurrency_mode, ConcurrencyMode::Sequential);
        assert_eq!(config.threads, 4);
        assert_eq!(config.events, 10);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_events_split_between_workers() {
        let config = RunConfig::new().with_threads(3).with_events(10);
        let shares: Vec<u64> = (0..3).map(|w| config.events_for_worker(w)).collect();
        assert_eq!(shares, vec![4, 3, 3]);
        assert_eq!(shares.iter().sum::<u64>(), 10);
    }

    #[test]
    fn test_detector_config_fallback() {
        let config = RunConfig::new()
            .with_detectors(3)
            .with_detector_configs(vec![DetectorConfig::new(1.0, 0.0, 7.0)]);
        assert_eq!(config.detector_config(0).time_offset, 7.0);
        assert_eq!(config.detector_config(1), DetectorConfig::default_for(1));
    }

    #[test]
    fn test_invalid_configs() {
        assert!(RunConfig::new().with_threads(0).validate().is_err());
        assert!(RunConfig::new().with_detectors(0).validate().is_err());
        let too_many = RunConfig::new()
            .with_detectors(1)
            .with_detector_configs(vec![DetectorConfig::default(); 2]);
        assert!(too_many.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let text = r#"
            level_scheme = "co60.dat"
            detectors = 2
            threads = 8
            events = 500
            seed = 7
            concurrency_mode = "sequential"
            format = "text"

            [[detector]]
            sigma0 = 3.0
            sigma1 = 0.01
            time_offset = 120.0
        "#;
        let config = RunConfig::from_toml_str(text).unwrap();
        assert_eq!(config.level_scheme, PathBuf::from("co60.dat"));
        assert_eq!(config.detectors, 2);
        assert_eq!(config.threads, 8);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.concurrency_mode, ConcurrencyMode::Sequential);
        assert_eq!(config.format, OutputFormat::Text);
        assert_eq!(config.detector_config(0), DetectorConfig::new(3.0, 0.01, 120.0));
        assert_eq!(config.detector_config(1), DetectorConfig::default_for(1));
        // Unspecified keys keep their defaults
        assert_eq!(config.fields, 5);
        assert_eq!(config.channel_capacity, 1024);
    }

    #[test]
    fn test_partial_detector_tables_use_detector_defaults() {
        let text = r#"
            detectors = 3

            [[detector]]
            sigma0 = 3.0

            [[detector]]
            time_offset = 10.0
        "#;
        let config = RunConfig::from_toml_str(text).unwrap();
        let first = config.detector_config(0);
        assert_eq!(first.sigma0, 3.0);
        assert_eq!(first.sigma1, DetectorConfig::default_for(0).sigma1);
        assert_eq!(first.time_offset, 200.0);
        assert_eq!(config.detector_config(1), DetectorConfig::new(5.0, 5e-3, 10.0));
        assert_eq!(config.detector_config(2), DetectorConfig::default_for(2));
    }

    #[test]
    fn test_from_toml_rejects_invalid() {
        assert!(matches!(
            RunConfig::from_toml_str("threads = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RunConfig::from_toml_str("threads = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
