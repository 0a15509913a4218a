//! Monte Carlo batches: full qualifying + race passes over independent seeds.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::driver::{DriverCode, DriverRegistry};
use crate::error::PredictorError;
use crate::numbers::usize_to_f64;
use crate::prediction::generate_predictions;
use crate::qualifying::simulate_qualifying;
use crate::random::RngBundle;
use crate::track::Track;
use crate::weights::FeatureWeights;

/// Aggregated finishes for one driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverTally {
    pub driver: DriverCode,
    pub wins: u32,
    pub podiums: u32,
    pub poles: u32,
    pub incidents: u32,
    pub best_finish: usize,
    pub average_finish: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub track_key: String,
    pub chaos: bool,
    pub runs: u32,
    /// Sorted by wins, then podiums, then average finish.
    pub standings: Vec<DriverTally>,
}

impl BatchSummary {
    #[must_use]
    pub fn tally(&self, code: &str) -> Option<&DriverTally> {
        self.standings.iter().find(|t| t.driver.as_str() == code)
    }
}

#[derive(Default)]
struct Accumulator {
    wins: u32,
    podiums: u32,
    poles: u32,
    incidents: u32,
    best_finish: usize,
    finish_sum: usize,
    races: usize,
}

/// Run one qualifying and race pass per seed. Each seed gets its own RNG bundle.
///
/// # Errors
///
/// Propagates the first qualifying or prediction failure.
pub fn simulate_batch(
    registry: &DriverRegistry,
    track: &Track,
    weights: &FeatureWeights,
    chaos: bool,
    seeds: impl IntoIterator<Item = u64>,
) -> Result<BatchSummary, PredictorError> {
    let mut table: HashMap<DriverCode, Accumulator> = HashMap::new();
    let mut runs = 0_u32;

    for seed in seeds {
        let bundle = RngBundle::from_user_seed(seed);
        let grid = simulate_qualifying(registry, track, &mut *bundle.qualifying())?;
        let result = generate_predictions(
            registry,
            track,
            &grid,
            weights,
            chaos,
            &mut *bundle.race(),
        )?;
        runs = runs.saturating_add(1);

        for entry in &result.entries {
            let acc = table.entry(entry.driver.clone()).or_default();
            acc.races += 1;
            acc.finish_sum += entry.position;
            if acc.best_finish == 0 || entry.position < acc.best_finish {
                acc.best_finish = entry.position;
            }
            if entry.position == 1 {
                acc.wins += 1;
            }
            if entry.position <= 3 {
                acc.podiums += 1;
            }
            if entry.grid_position == 1 {
                acc.poles += 1;
            }
            if entry.incident {
                acc.incidents += 1;
            }
        }
    }

    let mut standings: Vec<DriverTally> = table
        .into_iter()
        .map(|(driver, acc)| DriverTally {
            driver,
            wins: acc.wins,
            podiums: acc.podiums,
            poles: acc.poles,
            incidents: acc.incidents,
            best_finish: acc.best_finish,
            average_finish: usize_to_f64(acc.finish_sum) / usize_to_f64(acc.races.max(1)),
        })
        .collect();
    standings.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then(b.podiums.cmp(&a.podiums))
            .then(a.average_finish.total_cmp(&b.average_finish))
            .then(a.driver.cmp(&b.driver))
    });

    Ok(BatchSummary {
        track_key: track.key.clone(),
        chaos,
        runs,
        standings,
    })
}
