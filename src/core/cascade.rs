//! Sampling of gamma cascades through a level scheme.
//!
//! Times are relative to the start of each cascade. Keeping the origin per
//! event preserves picosecond resolution that would be lost if the delays
//! were added to an absolute clock spanning the parent's half-life.

use crate::core::errors::SchemeError;
use crate::core::random::RandomSource;
use crate::core::scheme::{LevelId, LevelScheme, TransitionId};
use std::sync::Arc;

/// One gamma emitted during a cascade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmittedGamma {
    /// Gamma energy (keV)
    pub energy: f64,
    /// Emission time relative to the cascade start (ps)
    pub time: f64,
    /// Transition that produced the gamma
    pub transition: TransitionId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CascadeState {
    Start,
    Depopulate(LevelId),
    Terminal,
}

/// Produces cascades from a shared, read-only level scheme
#[derive(Debug, Clone)]
pub struct CascadeGenerator {
    scheme: Arc<LevelScheme>,
}

impl CascadeGenerator {
    /// Create a generator. Schemes that would allow a cascade to loop
    /// forever are rejected.
    pub fn new(scheme: Arc<LevelScheme>) -> Result<Self, SchemeError> {
        scheme.check_acyclic()?;
        Ok(Self { scheme })
    }

    pub fn scheme(&self) -> &LevelScheme {
        &self.scheme
    }

    /// Start a fresh cascade. The returned iterator lazily yields the
    /// emitted gammas in emission order and then ends.
    pub fn cascade<'a>(&'a self, rng: &'a mut RandomSource) -> Cascade<'a> {
        Cascade {
            scheme: &self.scheme,
            rng,
            state: CascadeState::Start,
            time: 0.0,
        }
    }

    /// Sample a whole cascade into a vector
    pub fn generate(&self, rng: &mut RandomSource) -> Vec<EmittedGamma> {
        self.cascade(rng).collect()
    }
}

/// A single in-progress cascade
pub struct Cascade<'a> {
    scheme: &'a LevelScheme,
    rng: &'a mut RandomSource,
    state: CascadeState,
    time: f64,
}

impl<'a> Cascade<'a> {
    /// Absolute in-cascade time reached so far (ps)
    pub fn elapsed(&self) -> f64 {
        self.time
    }

    fn depopulate(&mut self, level_id: LevelId) -> Option<EmittedGamma> {
        self.state = CascadeState::Terminal;
        let scheme = self.scheme;

        let level = scheme.level(level_id)?;
        if level.is_stable() || !(level.total_decay_weight() > 0.0) {
            return None;
        }

        let transition_id = level.pick_transition(scheme.transitions(), self.rng)?;
        let transition = scheme.transition(transition_id)?;
        let gamma = EmittedGamma {
            energy: transition.energy(),
            time: self.time,
            transition: transition_id,
        };

        let target = scheme.level(transition.target())?;
        if !target.is_stable() {
            // Wait out the lifetime of the populated level
            self.time += self.rng.exponential(target.tau());
            self.state = CascadeState::Depopulate(transition.target());
        }

        Some(gamma)
    }
}

impl<'a> Iterator for Cascade<'a> {
    type Item = EmittedGamma;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            CascadeState::Start => match self.scheme.pick_primary_level(self.rng) {
                Some(level) => self.depopulate(level),
                None => {
                    self.state = CascadeState::Terminal;
                    None
                }
            },
            CascadeState::Depopulate(level) => self.depopulate(level),
            CascadeState::Terminal => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_gamma_scheme() -> Arc<LevelScheme> {
        let mut scheme = LevelScheme::new();
        scheme.add_level(1000.0, 1000.0, 100.0);
        scheme.add_level(0.0, -1.0, 0.0);
        scheme.add_transition(1000.0, 0.0, 100.0).unwrap();
        Arc::new(scheme)
    }

    fn two_step_scheme(tau: f64) -> Arc<LevelScheme> {
        let mut scheme = LevelScheme::new();
        scheme.add_level(0.0, -1.0, 0.0);
        scheme.add_level(344.3, tau, 0.0);
        scheme.add_level(1299.1, 5.0, 1.0);
        scheme.add_transition(1299.1, 344.3, 1.0).unwrap();
        scheme.add_transition(344.3, 0.0, 1.0).unwrap();
        Arc::new(scheme)
    }

    #[test]
    fn test_single_gamma_cascade() {
        let generator = CascadeGenerator::new(single_gamma_scheme()).unwrap();
        let mut rng = RandomSource::from_seed(5);
        for _ in 0..1000 {
            let gammas = generator.generate(&mut rng);
            assert_eq!(gammas.len(), 1);
            assert_eq!(gammas[0].energy, 1000.0);
            assert_eq!(gammas[0].time, 0.0);
        }
    }

    #[test]
    fn test_inter_emission_delay_is_exponential() {
        let tau = 1000.0;
        let generator = CascadeGenerator::new(two_step_scheme(tau)).unwrap();
        let mut rng = RandomSource::from_seed(99);
        let n = 50_000;
        let mut sum = 0.0;
        for _ in 0..n {
            let gammas = generator.generate(&mut rng);
            assert_eq!(gammas.len(), 2);
            let delay = gammas[1].time - gammas[0].time;
            assert!(delay >= 0.0);
            sum += delay;
        }
        let mean = sum / n as f64;
        // Standard error is tau / sqrt(n) ~ 4.5
        assert!((mean - tau).abs() < 25.0, "mean delay was {}", mean);
    }

    #[test]
    fn test_time_origin_resets_per_cascade() {
        let generator = CascadeGenerator::new(two_step_scheme(50.0)).unwrap();
        let mut rng = RandomSource::from_seed(8);
        for _ in 0..100 {
            let first = generator.cascade(&mut rng).next().unwrap();
            assert_eq!(first.time, 0.0);
        }
    }

    #[test]
    fn test_energies_match_level_differences() {
        let scheme = two_step_scheme(1.0);
        let generator = CascadeGenerator::new(scheme.clone()).unwrap();
        let mut rng = RandomSource::from_seed(3);
        for gamma in generator.generate(&mut rng) {
            let transition = scheme.transition(gamma.transition).unwrap();
            let target = scheme.level(transition.target()).unwrap();
            let source = scheme
                .levels()
                .iter()
                .find(|l| l.transitions().contains(&gamma.transition))
                .unwrap();
            assert_eq!(gamma.energy, source.energy() - target.energy());
        }
    }

    #[test]
    fn test_empty_scheme_yields_nothing() {
        let generator = CascadeGenerator::new(Arc::new(LevelScheme::new())).unwrap();
        let mut rng = RandomSource::from_seed(1);
        assert!(generator.generate(&mut rng).is_empty());
    }

    #[test]
    fn test_level_without_transitions_terminates() {
        let mut scheme = LevelScheme::new();
        scheme.add_level(800.0, 10.0, 1.0);
        let generator = CascadeGenerator::new(Arc::new(scheme)).unwrap();
        let mut rng = RandomSource::from_seed(1);
        assert!(generator.generate(&mut rng).is_empty());
    }

    #[test]
    fn test_stable_entry_level_terminates() {
        let mut scheme = LevelScheme::new();
        scheme.add_level(0.0, -1.0, 1.0);
        scheme.add_level(100.0, 1.0, 0.0);
        scheme.add_transition(0.0, 100.0, 1.0).unwrap();
        let generator = CascadeGenerator::new(Arc::new(scheme)).unwrap();
        let mut rng = RandomSource::from_seed(1);
        assert!(generator.generate(&mut rng).is_empty());
    }

    #[test]
    fn test_cyclic_scheme_rejected() {
        let mut scheme = LevelScheme::new();
        scheme.add_level(100.0, 1.0, 1.0);
        scheme.add_level(200.0, 1.0, 0.0);
        scheme.add_transition(100.0, 200.0, 1.0).unwrap();
        scheme.add_transition(200.0, 100.0, 1.0).unwrap();
        assert!(CascadeGenerator::new(Arc::new(scheme)).is_err());
    }

    #[test]
    fn test_cascade_is_not_restartable() {
        let generator = CascadeGenerator::new(single_gamma_scheme()).unwrap();
        let mut rng = RandomSource::from_seed(4);
        let mut cascade = generator.cascade(&mut rng);
        assert!(cascade.next().is_some());
        assert!(cascade.next().is_none());
        assert!(cascade.next().is_none());
    }
}
