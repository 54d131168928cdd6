use super::DetectorConfig;
use crate::core::random::RandomSource;
use crate::core::types::{DetectorId, Position};

/// Summed deposits below this energy (keV) do not fire the detector
pub const ENERGY_THRESHOLD: f64 = 0.01;

/// Finalised per-event values of one detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorRecord {
    /// Smeared energy (keV)
    pub energy: f64,
    /// Mean hit time plus detector offset (ps)
    pub time: f64,
    /// Mean hit position in the detector frame (mm)
    pub position: Position,
}

impl DetectorRecord {
    /// Values in record field order (energy, time, x, y, z)
    pub fn values(&self) -> [f64; 5] {
        [
            self.energy,
            self.time,
            self.position.x,
            self.position.y,
            self.position.z,
        ]
    }
}

/// Sums the hits one detector receives during an event.
///
/// Owned by a single worker; reset at the start of every event.
#[derive(Debug, Clone)]
pub struct DetectorHitAccumulator {
    id: DetectorId,
    config: DetectorConfig,
    sum_energy: f64,
    sum_time: f64,
    sum_x: f64,
    sum_y: f64,
    sum_z: f64,
    hit_count: u32,
}

impl DetectorHitAccumulator {
    pub fn new(id: DetectorId, config: DetectorConfig) -> Self {
        Self {
            id,
            config,
            sum_energy: 0.0,
            sum_time: 0.0,
            sum_x: 0.0,
            sum_y: 0.0,
            sum_z: 0.0,
            hit_count: 0,
        }
    }

    pub fn id(&self) -> DetectorId {
        self.id
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn hit_count(&self) -> u32 {
        self.hit_count
    }

    pub fn sum_energy(&self) -> f64 {
        self.sum_energy
    }

    /// Zero the sums for a new event
    pub fn reset(&mut self) {
        self.sum_energy = 0.0;
        self.sum_time = 0.0;
        self.sum_x = 0.0;
        self.sum_y = 0.0;
        self.sum_z = 0.0;
        self.hit_count = 0;
    }

    /// Add one energy deposit
    pub fn record_hit(&mut self, deposited_energy: f64, global_time: f64, local_position: Position) {
        self.sum_energy += deposited_energy;
        self.sum_time += global_time;
        self.sum_x += local_position.x;
        self.sum_y += local_position.y;
        self.sum_z += local_position.z;
        self.hit_count += 1;
    }

    /// Close the event for this detector.
    ///
    /// Returns `None` when the summed energy is below threshold. Otherwise the
    /// energy is smeared with the detector resolution and the time and
    /// position are averaged over the hits.
    pub fn finalize(&self, rng: &mut RandomSource) -> Option<DetectorRecord> {
        // Also guarantees at least one hit before dividing by the count
        if !(self.sum_energy >= ENERGY_THRESHOLD) || self.hit_count == 0 {
            return None;
        }

        let n = f64::from(self.hit_count);
        let energy = rng.gaussian(self.sum_energy, self.config.sigma(self.sum_energy));
        Some(DetectorRecord {
            energy,
            time: self.sum_time / n + self.config.time_offset,
            position: Position::new(self.sum_x / n, self.sum_y / n, self.sum_z / n),
        })
    }
}
