//! Error types for the cascade simulation

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a level scheme
#[derive(Error, Debug)]
pub enum SchemeError {
    #[error("Unable to read level scheme {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error while reading level scheme: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed line {line}: {text:?}")]
    MalformedLine { line: usize, text: String },

    #[error("Transition on line {line} has no level within {tolerance} keV of {energy} keV")]
    UnresolvedTransition {
        line: usize,
        energy: f64,
        tolerance: f64,
    },

    #[error("Cycle detected in level scheme through level at {energy} keV")]
    Cycle { energy: f64 },
}

/// Errors raised by the run configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised while handing records to the output stream
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Output stream closed before worker {worker} finished")]
    Disconnected { worker: usize },

    #[error("Output IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error for a simulation run
#[derive(Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Scheme(#[from] SchemeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Output writer thread panicked")]
    WriterPanicked,
}
