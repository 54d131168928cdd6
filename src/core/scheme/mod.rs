//! Nuclear level scheme: levels and gamma transitions held in an arena.
//!
//! The scheme is built once at startup and is read-only afterwards, so it
//! can be shared between worker threads behind an `Arc` without locking.

pub mod level;
pub mod order;
pub mod parser;

pub use level::{Level, LevelId, Transition, TransitionId};
pub use parser::LoadReport;

use crate::core::random::RandomSource;
use level::weighted_pick;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum distance (keV) between a transition endpoint and the level it
/// is attached to
pub const NEAREST_LEVEL_TOLERANCE: f64 = 2.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelScheme {
    levels: Vec<Level>,
    transitions: Vec<Transition>,
    total_population: f64,
}

impl LevelScheme {
    /// Create an empty level scheme
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a level. A negative `tau` marks a stable level.
    pub fn add_level(&mut self, energy: f64, tau: f64, population: f64) -> LevelId {
        self.levels.push(Level::new(energy, tau, population));
        self.total_population += population;
        self.levels.len() - 1
    }

    /// Add a transition between the levels nearest `from` and `to`.
    ///
    /// The gamma energy is `from - to`. Returns `None` (and adds nothing)
    /// when either endpoint has no level within the tolerance.
    pub fn add_transition(&mut self, from: f64, to: f64, intensity: f64) -> Option<TransitionId> {
        let initial = self.nearest_level(from)?;
        let target = self.nearest_level(to)?;
        let id = self.transitions.len();
        self.transitions
            .push(Transition::new(from - to, intensity, target));
        self.levels[initial].add_transition(id, intensity);
        Some(id)
    }

    /// Level closest to `energy`, if it lies within the tolerance
    pub fn nearest_level(&self, energy: f64) -> Option<LevelId> {
        let mut best: Option<(LevelId, f64)> = None;
        for (id, level) in self.levels.iter().enumerate() {
            let diff = (level.energy() - energy).abs();
            if best.map_or(true, |(_, d)| diff < d) {
                best = Some((id, diff));
            }
        }
        best.filter(|&(_, diff)| diff < NEAREST_LEVEL_TOLERANCE)
            .map(|(id, _)| id)
    }

    pub fn level(&self, id: LevelId) -> Option<&Level> {
        self.levels.get(id)
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.transitions.get(id)
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Sum of all level populations; zero for an empty scheme
    pub fn total_population(&self) -> f64 {
        self.total_population
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Pick the cascade's entry level at random, weighted by population.
    /// Returns `None` when no level has a positive population.
    pub fn pick_primary_level(&self, rng: &mut RandomSource) -> Option<LevelId> {
        if !(self.total_population > 0.0) {
            return None;
        }
        let r = rng.uniform() * self.total_population;
        weighted_pick(
            self.levels
                .iter()
                .enumerate()
                .map(|(id, level)| (id, level.population())),
            r,
        )
    }

    /// Pick a depopulating transition of `level`, weighted by intensity
    pub fn pick_transition(&self, level: LevelId, rng: &mut RandomSource) -> Option<TransitionId> {
        self.levels
            .get(level)?
            .pick_transition(&self.transitions, rng)
    }
}

impl fmt::Display for LevelScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let share = |population: f64| {
            if self.total_population > 0.0 {
                population * 100.0 / self.total_population
            } else {
                0.0
            }
        };
        for level in &self.levels {
            if level.is_stable() {
                writeln!(
                    f,
                    "Level: energy = {:8.3} keV stable            population from parent = {:.2} %",
                    level.energy(),
                    share(level.population())
                )?;
            } else {
                writeln!(
                    f,
                    "Level: energy = {:8.3} keV tau = {:8.2} ps population from parent = {:.2} %",
                    level.energy(),
                    level.tau(),
                    share(level.population())
                )?;
            }
            let decay = level.total_decay_weight();
            for &id in level.transitions() {
                let transition = &self.transitions[id];
                let branching = if decay > 0.0 {
                    transition.intensity() * 100.0 / decay
                } else {
                    0.0
                };
                writeln!(
                    f,
                    "\tTransition: energy = {:7.2} keV intensity = {:.2} %",
                    transition.energy(),
                    branching
                )?;
            }
        }
        Ok(())
    }
}
