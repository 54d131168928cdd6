pub mod accumulator;
pub mod histogram;

pub use accumulator::{DetectorHitAccumulator, DetectorRecord, ENERGY_THRESHOLD};
pub use histogram::EnergyHistogram;

use serde::{Deserialize, Serialize};

/// Default resolution offset (keV)
pub const DEFAULT_SIGMA0: f64 = 5.0;
/// Default resolution slope
pub const DEFAULT_SIGMA1: f64 = 5e-3;
/// Default cable/electronics delays (ps), assigned to detectors in turn
pub const DEFAULT_TIME_OFFSETS: [f64; 8] = [200.0, 300.0, 50.0, 150.0, 330.0, 180.0, 250.0, 190.0];

/// Response parameters of one detector.
///
/// The energy resolution is linear: `sigma = sigma0 + sigma1 * E`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub sigma0: f64,
    pub sigma1: f64,
    pub time_offset: f64,
}

impl DetectorConfig {
    pub fn new(sigma0: f64, sigma1: f64, time_offset: f64) -> Self {
        Self {
            sigma0,
            sigma1,
            time_offset,
        }
    }

    /// Default response for the detector at `index`
    pub fn default_for(index: usize) -> Self {
        Self {
            time_offset: DEFAULT_TIME_OFFSETS[index % DEFAULT_TIME_OFFSETS.len()],
            ..Self::default()
        }
    }

    /// Standard deviation of the smeared energy for a deposit of `energy`
    pub fn sigma(&self, energy: f64) -> f64 {
        self.sigma0 + self.sigma1 * energy
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sigma0: DEFAULT_SIGMA0,
            sigma1: DEFAULT_SIGMA1,
            time_offset: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_offsets_cycle() {
        assert_eq!(DetectorConfig::default_for(0).time_offset, 200.0);
        assert_eq!(DetectorConfig::default_for(5).time_offset, 180.0);
        assert_eq!(DetectorConfig::default_for(8).time_offset, 200.0);
        assert_eq!(DetectorConfig::default_for(3).sigma0, DEFAULT_SIGMA0);
    }

    #[test]
    fn test_linear_sigma() {
        let config = DetectorConfig::new(5.0, 5e-3, 0.0);
        assert!((config.sigma(1000.0) - 10.0).abs() < 1e-12);
        assert_eq!(config.sigma(0.0), 5.0);
    }
}
