use crate::core::random::RandomSource;
use serde::{Deserialize, Serialize};

/// Index of a level inside its scheme's arena
pub type LevelId = usize;

/// Index of a transition inside its scheme's arena
pub type TransitionId = usize;

/// A gamma transition between two levels.
///
/// The energy is taken from the scheme description (`E1 - E2`), not
/// re-derived from the resolved levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    energy: f64,
    intensity: f64,
    target: LevelId,
}

impl Transition {
    pub fn new(energy: f64, intensity: f64, target: LevelId) -> Self {
        Self {
            energy,
            intensity,
            target,
        }
    }

    /// Gamma energy (keV)
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Relative branching weight among the transitions leaving one level
    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    /// Level populated by this transition
    pub fn target(&self) -> LevelId {
        self.target
    }
}

/// A nuclear level with its lifetime, feeding and depopulating transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    energy: f64,
    tau: f64,
    population: f64,
    transitions: Vec<TransitionId>,
    total_decay: f64,
}

impl Level {
    /// Create a level. A negative `tau` marks it stable.
    pub fn new(energy: f64, tau: f64, population: f64) -> Self {
        Self {
            energy,
            tau,
            population,
            transitions: Vec::new(),
            total_decay: 0.0,
        }
    }

    /// Level energy (keV)
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Mean lifetime (ps); negative for a stable level
    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Relative probability of this level being the cascade entry point
    pub fn population(&self) -> f64 {
        self.population
    }

    pub fn is_stable(&self) -> bool {
        self.tau < 0.0
    }

    /// Depopulating transitions, in the order they were added
    pub fn transitions(&self) -> &[TransitionId] {
        &self.transitions
    }

    /// Sum of the intensities of all depopulating transitions
    pub fn total_decay_weight(&self) -> f64 {
        self.total_decay
    }

    pub(crate) fn add_transition(&mut self, id: TransitionId, intensity: f64) {
        self.transitions.push(id);
        self.total_decay += intensity;
    }

    /// Pick a depopulating transition at random, weighted by intensity.
    ///
    /// `transitions` is the scheme's transition arena.
    pub fn pick_transition(
        &self,
        transitions: &[Transition],
        rng: &mut RandomSource,
    ) -> Option<TransitionId> {
        if !(self.total_decay > 0.0) {
            return None;
        }
        let r = rng.uniform() * self.total_decay;
        weighted_pick(
            self.transitions
                .iter()
                .map(|&id| (id, transitions[id].intensity())),
            r,
        )
    }
}

/// Walk `(item, weight)` pairs accumulating weights and return the first
/// item whose cumulative sum exceeds `r`.
///
/// If rounding leaves `r` at or above the final sum, the last item with a
/// positive weight is returned instead of nothing.
pub(crate) fn weighted_pick<I>(items: I, r: f64) -> Option<usize>
where
    I: IntoIterator<Item = (usize, f64)>,
{
    let mut sum = 0.0;
    let mut last_positive = None;
    for (id, weight) in items {
        sum += weight;
        if weight > 0.0 {
            last_positive = Some(id);
        }
        if r < sum {
            return Some(id);
        }
    }
    last_positive
}
