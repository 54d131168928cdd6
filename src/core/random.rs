use crate::core::types::{Direction, WorkerId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, Normal};
use std::f64::consts::TAU;

/// Seedable random source owned by exactly one worker.
///
/// Every worker derives its generator from the run's base seed, using the
/// worker index as the ChaCha stream. Sequences are therefore reproducible
/// per worker and independent across workers, without any shared state.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: ChaCha8Rng,
}

impl RandomSource {
    /// Create a source from a plain seed (stream 0)
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Create the source for a given worker of a run
    pub fn for_worker(base_seed: u64, worker: WorkerId) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(base_seed);
        rng.set_stream(worker as u64);
        Self { rng }
    }

    /// Uniform draw in [0, 1)
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Exponentially distributed draw with the given mean.
    /// A non-positive mean yields zero delay.
    pub fn exponential(&mut self, mean: f64) -> f64 {
        if !(mean > 0.0) {
            return 0.0;
        }
        match Exp::new(1.0 / mean) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => 0.0,
        }
    }

    /// Gaussian draw. A non-positive sigma returns the mean unchanged.
    pub fn gaussian(&mut self, mean: f64, sigma: f64) -> f64 {
        if !(sigma > 0.0) {
            return mean;
        }
        match Normal::new(mean, sigma) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => mean,
        }
    }

    /// Isotropic direction: linear in cos(theta) and in phi
    pub fn isotropic_direction(&mut self) -> Direction {
        let cos_theta = 2.0 * self.uniform() - 1.0;
        let phi = TAU * self.uniform();
        Direction { cos_theta, phi }
    }
}
