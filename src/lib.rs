pub mod core;

// Re-export commonly used types
pub use crate::core::cascade::{Cascade, CascadeGenerator, EmittedGamma};
pub use crate::core::detector::{DetectorConfig, DetectorHitAccumulator, EnergyHistogram};
pub use crate::core::errors::{ConfigError, MergeError, SchemeError, SimError};
pub use crate::core::execution::{ConcurrencyMode, RunConfig, RunSummary, SimulationEngine, StopHandle};
pub use crate::core::random::RandomSource;
pub use crate::core::record::{OutputFormat, RecordBuffer, RecordWriter};
pub use crate::core::scheme::{LevelScheme, LoadReport};
pub use crate::core::transport::{HitSink, SectorTransport, Transport};
