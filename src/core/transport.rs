//! Boundary to the particle-transport engine.
//!
//! A transport takes the gammas of one cascade and reports the energy they
//! deposit, detector by detector, through a [`HitSink`]. The
//! [`SectorTransport`] provided here is a simple stand-in that lets the
//! pipeline run end to end without a real transport engine.

use crate::core::cascade::EmittedGamma;
use crate::core::random::RandomSource;
use crate::core::types::{DetectorId, Position};
use std::f64::consts::TAU;

/// Speed of light (mm/ps)
pub const SPEED_OF_LIGHT: f64 = 0.299_792_458;

/// Receives energy deposits during an event
pub trait HitSink {
    /// One deposit of `energy` (keV) at `time` (ps) and `position` in the
    /// detector's local frame (mm)
    fn record_hit(&mut self, detector: DetectorId, energy: f64, time: f64, position: Position);
}

/// Propagates the gammas of one event and reports their deposits
pub trait Transport: Send {
    fn transport(&mut self, gammas: &[EmittedGamma], rng: &mut RandomSource, hits: &mut dyn HitSink);
}

/// Full-absorption transport with detectors arranged in azimuthal sectors
/// of the horizontal plane.
///
/// Each gamma leaves the source isotropically. If its direction lies within
/// `acceptance` of the horizontal plane (`|cos theta| < acceptance`) it is
/// absorbed in the detector covering its azimuth, at a uniformly sampled
/// depth along the detector axis; otherwise it escapes.
#[derive(Debug, Clone)]
pub struct SectorTransport {
    detectors: usize,
    acceptance: f64,
    front_distance: f64,
    length: f64,
}

impl SectorTransport {
    pub fn new(detectors: usize) -> Self {
        Self {
            detectors,
            acceptance: 0.43,
            front_distance: 40.0,
            length: 38.1,
        }
    }

    /// Set the maximum `|cos theta|` that still reaches a detector
    pub fn with_acceptance(mut self, acceptance: f64) -> Self {
        self.acceptance = acceptance;
        self
    }

    /// Set the source-to-detector distance and the crystal length (mm)
    pub fn with_geometry(mut self, front_distance: f64, length: f64) -> Self {
        self.front_distance = front_distance;
        self.length = length;
        self
    }

    fn sector(&self, phi: f64) -> DetectorId {
        let width = TAU / self.detectors as f64;
        ((phi / width) as usize).min(self.detectors - 1)
    }
}

impl Transport for SectorTransport {
    fn transport(&mut self, gammas: &[EmittedGamma], rng: &mut RandomSource, hits: &mut dyn HitSink) {
        if self.detectors == 0 {
            return;
        }
        for gamma in gammas {
            let direction = rng.isotropic_direction();
            if !(direction.cos_theta.abs() < self.acceptance) {
                continue;
            }
            let detector = self.sector(direction.phi);
            let depth = rng.uniform() * self.length;
            let flight = (self.front_distance + depth) / SPEED_OF_LIGHT;
            let local = Position::new(0.0, 0.0, depth - self.length / 2.0);
            hits.record_hit(detector, gamma.energy, gamma.time + flight, local);
        }
    }
}
