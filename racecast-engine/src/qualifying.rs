//! Qualifying simulation: biased-random lap times into a starting grid.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::constants::{
    NEUTRAL_SKILL, QUALI_DIFFICULTY_SPREAD, QUALI_SPREAD_FLOOR, QUALI_SPREAD_SECONDS,
    QUALI_WET_SPREAD, STREET_SKILL_SECONDS, WET_BASE_INFLATION, WET_SKILL_INFLATION,
};
use crate::driver::{Driver, DriverCode, DriverRegistry, Specialization};
use crate::error::PredictorError;
use crate::random::RandomSource;
use crate::track::{Track, TrackRegistry};

/// One grid slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridEntry {
    /// 1-based starting position.
    pub position: usize,
    pub driver: DriverCode,
    /// Qualifying lap in seconds.
    pub lap_time: f64,
}

/// Starting order produced by qualifying. Replaced wholesale, never edited in place.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifyingGrid {
    entries: Vec<GridEntry>,
}

impl QualifyingGrid {
    /// Build a grid from driver codes in starting order with their lap times.
    ///
    /// Positions are assigned 1..N in the given order.
    #[must_use]
    pub fn from_order(order: impl IntoIterator<Item = (DriverCode, f64)>) -> Self {
        let entries = order
            .into_iter()
            .enumerate()
            .map(|(i, (driver, lap_time))| GridEntry {
                position: i + 1,
                driver,
                lap_time,
            })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[GridEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn pole(&self) -> Option<&GridEntry> {
        self.entries.first()
    }

    #[must_use]
    pub fn position_of(&self, code: &DriverCode) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| &e.driver == code)
            .map(|e| e.position)
    }

    /// New grid with the same drivers in a user-edited order.
    ///
    /// Lap-time slots stay attached to positions, so times remain ascending.
    ///
    /// # Errors
    ///
    /// Fails unless `order` is a permutation of this grid's drivers.
    pub fn reordered(&self, order: &[DriverCode]) -> Result<Self, PredictorError> {
        let known: HashSet<&DriverCode> = self.entries.iter().map(|e| &e.driver).collect();
        let mut seen: HashSet<&DriverCode> = HashSet::with_capacity(order.len());
        for code in order {
            if !known.contains(code) {
                return Err(PredictorError::UnknownDriver {
                    code: code.to_string(),
                });
            }
            if !seen.insert(code) {
                return Err(PredictorError::DuplicateDriver {
                    code: code.to_string(),
                });
            }
        }
        if let Some(missing) = self.entries.iter().find(|e| !seen.contains(&e.driver)) {
            return Err(PredictorError::UnknownDriver {
                code: missing.driver.to_string(),
            });
        }
        Ok(Self::from_order(
            order
                .iter()
                .cloned()
                .zip(self.entries.iter().map(|e| e.lap_time)),
        ))
    }
}

/// Simulate qualifying on a track looked up by key.
///
/// # Errors
///
/// Returns [`PredictorError::TrackNotFound`] for an unknown key.
pub fn simulate_qualifying_by_key<R: RandomSource + ?Sized>(
    registry: &DriverRegistry,
    tracks: &TrackRegistry,
    track_key: &str,
    rng: &mut R,
) -> Result<QualifyingGrid, PredictorError> {
    let track = tracks.require(track_key)?;
    simulate_qualifying(registry, track, rng)
}

/// Simulate qualifying for every registered driver.
///
/// One draw is taken per driver in registry order; exact lap-time ties keep
/// registry order.
///
/// # Errors
///
/// Returns [`PredictorError::EmptyGrid`] when the registry has no drivers.
pub fn simulate_qualifying<R: RandomSource + ?Sized>(
    registry: &DriverRegistry,
    track: &Track,
    rng: &mut R,
) -> Result<QualifyingGrid, PredictorError> {
    if registry.is_empty() {
        return Err(PredictorError::EmptyGrid);
    }
    let mut laps: Vec<(DriverCode, f64)> = registry
        .iter()
        .map(|driver| (driver.code.clone(), qualifying_lap(driver, track, rng.centered())))
        .collect();
    laps.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok(QualifyingGrid::from_order(laps))
}

/// Lap time for one driver given a centered draw in [-1, 1).
#[must_use]
pub fn qualifying_lap(driver: &Driver, track: &Track, draw: f64) -> f64 {
    let wet = track.weather.wet_intensity();

    let street_adjustment = if track.street_circuit {
        -(driver.skill(Specialization::StreetCircuits) - NEUTRAL_SKILL) * STREET_SKILL_SECONDS
    } else {
        0.0
    };

    let rain_deficit = 1.0 - driver.skill(Specialization::RainMastery);
    let wet_inflation =
        driver.base_pace * wet * rain_deficit.mul_add(WET_SKILL_INFLATION, WET_BASE_INFLATION);

    let variance = lap_variance(driver)
        * track
            .characteristics
            .difficulty
            .mul_add(QUALI_DIFFICULTY_SPREAD, 1.0)
        * wet.mul_add(QUALI_WET_SPREAD, 1.0);
    let noise = draw * QUALI_SPREAD_SECONDS * variance;

    driver.base_pace + street_adjustment + wet_inflation + noise
}

/// Spread multiplier shrinking with quali skill and consistency.
fn lap_variance(driver: &Driver) -> f64 {
    let shakiness = (2.0 - driver.quali_skill - driver.consistency) / 2.0;
    QUALI_SPREAD_FLOOR + shakiness
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ConstantSource, RngBundle};
    use crate::track::TrackWeather;

    fn tracks() -> &'static TrackRegistry {
        TrackRegistry::builtin()
    }

    #[test]
    fn grid_is_a_full_ordered_permutation() {
        let registry = DriverRegistry::builtin();
        let bundle = RngBundle::from_user_seed(2024);
        for track in tracks().iter() {
            let grid = simulate_qualifying(registry, track, &mut *bundle.qualifying()).unwrap();
            assert_eq!(grid.len(), registry.len());
            let codes: HashSet<_> = grid.entries().iter().map(|e| e.driver.clone()).collect();
            assert_eq!(codes.len(), registry.len());
            for (i, pair) in grid.entries().windows(2).enumerate() {
                assert_eq!(pair[0].position, i + 1);
                assert!(pair[0].lap_time < pair[1].lap_time, "{}", track.key);
            }
        }
    }

    #[test]
    fn same_seed_same_grid() {
        let registry = DriverRegistry::builtin();
        let track = tracks().require("silverstone").unwrap();
        let first =
            simulate_qualifying(registry, track, &mut *RngBundle::from_user_seed(9).qualifying())
                .unwrap();
        let second =
            simulate_qualifying(registry, track, &mut *RngBundle::from_user_seed(9).qualifying())
                .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_track_is_not_defaulted() {
        let result = simulate_qualifying_by_key(
            DriverRegistry::builtin(),
            tracks(),
            "nurburgring",
            &mut ConstantSource::neutral(),
        );
        assert_eq!(
            result,
            Err(PredictorError::TrackNotFound {
                key: "nurburgring".to_string()
            })
        );
    }

    #[test]
    fn zero_variance_orders_by_pace_on_dry_permanent_track() {
        let registry = DriverRegistry::builtin();
        let track = tracks().require("monza").unwrap();
        assert_eq!(track.weather, TrackWeather::Dry);
        let grid = simulate_qualifying(registry, track, &mut ConstantSource::neutral()).unwrap();
        let pole = grid.pole().unwrap();
        assert_eq!(pole.driver.as_str(), "VER");
        assert!((pole.lap_time - 93.191).abs() < 1e-9);
    }

    #[test]
    fn street_skill_and_rain_mastery_shift_lap_times() {
        let registry = DriverRegistry::builtin();
        let lec = registry.get("LEC").unwrap();
        let sar = registry.get("SAR").unwrap();
        let monaco = tracks().require("monaco").unwrap();
        assert!(qualifying_lap(lec, monaco, 0.0) < lec.base_pace);
        assert!(qualifying_lap(sar, monaco, 0.0) > sar.base_pace);

        let spa = tracks().require("spa").unwrap();
        let ver = registry.get("VER").unwrap();
        let ver_loss = qualifying_lap(ver, spa, 0.0) - ver.base_pace;
        let sar_loss = qualifying_lap(sar, spa, 0.0) - sar.base_pace;
        assert!(ver_loss > 0.0);
        assert!(sar_loss > ver_loss);
    }

    #[test]
    fn skilled_drivers_swing_less() {
        let registry = DriverRegistry::builtin();
        let track = tracks().require("austria").unwrap();
        let ver = registry.get("VER").unwrap();
        let sar = registry.get("SAR").unwrap();
        let ver_swing = qualifying_lap(ver, track, 1.0) - qualifying_lap(ver, track, -1.0);
        let sar_swing = qualifying_lap(sar, track, 1.0) - qualifying_lap(sar, track, -1.0);
        assert!(ver_swing < sar_swing);
    }

    #[test]
    fn reorder_keeps_slot_times_and_validates() {
        let registry = DriverRegistry::builtin();
        let track = tracks().require("monza").unwrap();
        let grid = simulate_qualifying(registry, track, &mut ConstantSource::neutral()).unwrap();
        let mut order: Vec<DriverCode> = grid.entries().iter().map(|e| e.driver.clone()).collect();
        order.swap(0, 1);
        let edited = grid.reordered(&order).unwrap();
        assert_eq!(edited.entries()[0].driver, grid.entries()[1].driver);
        assert!((edited.entries()[0].lap_time - grid.entries()[0].lap_time).abs() < f64::EPSILON);

        let mut duplicated = order.clone();
        duplicated[1] = duplicated[0].clone();
        assert!(matches!(
            grid.reordered(&duplicated),
            Err(PredictorError::DuplicateDriver { .. })
        ));

        order.pop();
        assert!(matches!(
            grid.reordered(&order),
            Err(PredictorError::UnknownDriver { .. })
        ));
    }
}
