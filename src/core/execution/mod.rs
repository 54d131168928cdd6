pub mod config;
pub mod simulation_engine;
pub mod worker;

// Re-export commonly used types
pub use config::{ConcurrencyMode, RunConfig};
pub use simulation_engine::{RunSummary, SimulationEngine, StopHandle};
pub use worker::{Worker, WorkerReport};
