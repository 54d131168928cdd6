use super::{LevelId, LevelScheme};
use crate::core::errors::SchemeError;

impl LevelScheme {
    /// Edges a cascade can actually follow: out of non-stable levels, with
    /// positive intensity. Transitions out of stable levels are never taken.
    fn followable_edges(&self) -> Vec<Vec<LevelId>> {
        self.levels()
            .iter()
            .map(|level| {
                if level.is_stable() {
                    return Vec::new();
                }
                level
                    .transitions()
                    .iter()
                    .map(|&id| &self.transitions()[id])
                    .filter(|t| t.intensity() > 0.0)
                    .map(|t| t.target())
                    .collect()
            })
            .collect()
    }

    /// Sort the levels into stages along the followable edges.
    ///
    /// Uses Kahn's algorithm: stage `k` holds the levels whose longest
    /// incoming path has `k` transitions. Fails if the levels form a cycle,
    /// since a cascade through them would never terminate.
    pub fn decay_stages(&self) -> Result<Vec<Vec<LevelId>>, SchemeError> {
        let adj_list = self.followable_edges();
        let mut in_degree = vec![0usize; self.levels().len()];
        for targets in &adj_list {
            for &target in targets {
                in_degree[target] += 1;
            }
        }

        let mut processed = vec![false; self.levels().len()];
        let mut processed_count = 0;
        let mut stages = Vec::new();

        while processed_count < self.levels().len() {
            // All unprocessed levels with zero in-degree form the current stage
            let current_stage: Vec<LevelId> = (0..self.levels().len())
                .filter(|&id| !processed[id] && in_degree[id] == 0)
                .collect();

            if current_stage.is_empty() {
                let stuck = (0..self.levels().len())
                    .find(|&id| !processed[id])
                    .unwrap_or_default();
                return Err(SchemeError::Cycle {
                    energy: self.levels()[stuck].energy(),
                });
            }

            for &id in &current_stage {
                processed[id] = true;
                processed_count += 1;
                for &neighbor in &adj_list[id] {
                    in_degree[neighbor] -= 1;
                }
            }

            stages.push(current_stage);
        }

        Ok(stages)
    }

    /// Reject schemes in which a cascade could loop forever
    pub fn check_acyclic(&self) -> Result<(), SchemeError> {
        self.decay_stages().map(|_| ())
    }

    /// Largest number of gammas a single cascade can emit
    pub fn longest_cascade(&self) -> Result<usize, SchemeError> {
        Ok(self.decay_stages()?.len().saturating_sub(1))
    }
}
