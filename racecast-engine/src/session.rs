//! Explicit race-weekend state owned by the UI layer.
//!
//! The prediction core is stateless; this wrapper holds what a front-end
//! mutates between calls (track, grid, weights, chaos flag, seed) and replaces
//! each piece wholesale.
use crate::driver::{DriverCode, DriverRegistry};
use crate::error::{PredictorError, WeightError};
use crate::prediction::{PredictionResult, generate_predictions};
use crate::qualifying::{QualifyingGrid, simulate_qualifying};
use crate::random::RngBundle;
use crate::seed::{canonical_seed, decode_to_seed, encode_friendly};
use crate::track::{DEFAULT_TRACK_KEY, Track, TrackRegistry};
use crate::weights::{Factor, FeatureWeights};

/// One user's weekend: selected track, current grid, and model settings.
#[derive(Debug, Clone)]
pub struct RaceWeekend<'a> {
    drivers: &'a DriverRegistry,
    tracks: &'a TrackRegistry,
    track: &'a Track,
    grid: Option<QualifyingGrid>,
    edit_snapshot: Option<QualifyingGrid>,
    weights: FeatureWeights,
    default_weights: FeatureWeights,
    chaos: bool,
    seed: u64,
    rng: RngBundle,
}

impl<'a> RaceWeekend<'a> {
    /// Start a weekend on the default track, falling back to the first listed track.
    ///
    /// The seed is snapped to its share-code slot so [`Self::share_code`] replays it.
    #[must_use]
    pub fn new(drivers: &'a DriverRegistry, tracks: &'a TrackRegistry, seed: u64) -> Self {
        let seed = canonical_seed(seed);
        let track = tracks
            .get(DEFAULT_TRACK_KEY)
            .or_else(|| tracks.iter().next())
            .expect("track registry is never empty");
        Self {
            drivers,
            tracks,
            track,
            grid: None,
            edit_snapshot: None,
            weights: FeatureWeights::DEFAULTS,
            default_weights: FeatureWeights::DEFAULTS,
            chaos: false,
            seed,
            rng: RngBundle::from_user_seed(seed),
        }
    }

    /// Rebuild a weekend from a share code, restoring seed and chaos flag.
    #[must_use]
    pub fn from_share_code(
        drivers: &'a DriverRegistry,
        tracks: &'a TrackRegistry,
        code: &str,
    ) -> Option<Self> {
        let (chaos, seed) = decode_to_seed(code)?;
        let mut weekend = Self::new(drivers, tracks, seed);
        weekend.chaos = chaos;
        Some(weekend)
    }

    #[must_use]
    pub const fn track(&self) -> &'a Track {
        self.track
    }

    #[must_use]
    pub const fn drivers(&self) -> &'a DriverRegistry {
        self.drivers
    }

    #[must_use]
    pub const fn grid(&self) -> Option<&QualifyingGrid> {
        self.grid.as_ref()
    }

    #[must_use]
    pub const fn weights(&self) -> &FeatureWeights {
        &self.weights
    }

    #[must_use]
    pub const fn chaos(&self) -> bool {
        self.chaos
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.edit_snapshot.is_some()
    }

    #[must_use]
    pub fn share_code(&self) -> String {
        encode_friendly(self.chaos, self.seed)
    }

    /// Switch tracks. The current grid is dropped so the next prediction requalifies.
    ///
    /// # Errors
    ///
    /// Returns [`PredictorError::TrackNotFound`]; the weekend is left unchanged.
    pub fn select_track(&mut self, key: &str) -> Result<&'a Track, PredictorError> {
        let track = self.tracks.require(key)?;
        self.track = track;
        self.grid = None;
        self.edit_snapshot = None;
        Ok(track)
    }

    /// Current grid, running qualifying first if there is none.
    ///
    /// # Errors
    ///
    /// Propagates qualifying failures.
    pub fn ensure_grid(&mut self) -> Result<&QualifyingGrid, PredictorError> {
        if self.grid.is_none() {
            let grid = simulate_qualifying(self.drivers, self.track, &mut *self.rng.qualifying())?;
            self.grid = Some(grid);
        }
        self.grid.as_ref().ok_or(PredictorError::EmptyGrid)
    }

    /// Replace the grid with a fresh qualifying session from the next draws of the stream.
    ///
    /// # Errors
    ///
    /// Propagates qualifying failures; the previous grid is kept on error.
    pub fn regenerate_qualifying(&mut self) -> Result<&QualifyingGrid, PredictorError> {
        let grid = simulate_qualifying(self.drivers, self.track, &mut *self.rng.qualifying())?;
        self.edit_snapshot = None;
        let grid: &QualifyingGrid = self.grid.insert(grid);
        Ok(grid)
    }

    /// Enter edit mode, remembering the grid to restore on cancel.
    ///
    /// # Errors
    ///
    /// Propagates qualifying failures when no grid exists yet.
    pub fn begin_grid_edit(&mut self) -> Result<&QualifyingGrid, PredictorError> {
        let snapshot = self.ensure_grid()?.clone();
        self.edit_snapshot = Some(snapshot);
        self.ensure_grid()
    }

    /// Replace the grid with a user-edited order and leave edit mode.
    ///
    /// # Errors
    ///
    /// Fails unless `order` is a permutation of the current grid; nothing changes on error.
    pub fn apply_grid_edit(
        &mut self,
        order: &[DriverCode],
    ) -> Result<&QualifyingGrid, PredictorError> {
        let edited = self.ensure_grid()?.reordered(order)?;
        self.edit_snapshot = None;
        let grid: &QualifyingGrid = self.grid.insert(edited);
        Ok(grid)
    }

    /// Leave edit mode, restoring the grid captured by [`Self::begin_grid_edit`].
    pub fn cancel_grid_edit(&mut self) {
        if let Some(snapshot) = self.edit_snapshot.take() {
            self.grid = Some(snapshot);
        }
    }

    /// Set one factor from a 0-100 slider value.
    pub fn set_weight(&mut self, factor: Factor, percent: u8) {
        self.weights.set_percent(factor, percent);
    }

    /// Replace every weight at once, clamped to [0, 1].
    ///
    /// # Errors
    ///
    /// Rejects non-finite weights and keeps the previous set.
    pub fn set_weights(&mut self, weights: FeatureWeights) -> Result<(), WeightError> {
        self.weights = weights.sanitized()?;
        Ok(())
    }

    pub fn reset_weights(&mut self) {
        self.weights = self.default_weights;
    }

    /// Flip chaos mode, returning the new state.
    pub fn toggle_chaos(&mut self) -> bool {
        self.chaos = !self.chaos;
        self.chaos
    }

    pub fn set_chaos(&mut self, chaos: bool) {
        self.chaos = chaos;
    }

    /// Swap to a new seed. The grid is dropped and both streams restart.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = canonical_seed(seed);
        self.rng = RngBundle::from_user_seed(self.seed);
        self.grid = None;
        self.edit_snapshot = None;
    }

    /// Predict the race from the current grid, qualifying first if needed.
    ///
    /// Race draws come from a race stream restarted from the seed on every call,
    /// so the same grid, weights, and chaos flag always give the same result.
    ///
    /// # Errors
    ///
    /// Propagates qualifying and prediction failures.
    pub fn predict(&mut self) -> Result<PredictionResult, PredictorError> {
        self.ensure_grid()?;
        let grid = self.grid.as_ref().ok_or(PredictorError::EmptyGrid)?;
        let bundle = RngBundle::from_user_seed(self.seed);
        let mut race = bundle.race();
        generate_predictions(
            self.drivers,
            self.track,
            grid,
            &self.weights,
            self.chaos,
            &mut *race,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekend(seed: u64) -> RaceWeekend<'static> {
        RaceWeekend::new(DriverRegistry::builtin(), TrackRegistry::builtin(), seed)
    }

    #[test]
    fn starts_on_the_default_track_with_default_weights() {
        let weekend = weekend(1);
        assert_eq!(weekend.track().key, DEFAULT_TRACK_KEY);
        assert_eq!(*weekend.weights(), FeatureWeights::DEFAULTS);
        assert!(weekend.grid().is_none());
        assert!(!weekend.chaos());
    }

    #[test]
    fn changing_track_invalidates_the_grid() {
        let mut weekend = weekend(2);
        weekend.ensure_grid().unwrap();
        assert!(weekend.grid().is_some());
        weekend.select_track("monaco").unwrap();
        assert!(weekend.grid().is_none());
        assert_eq!(weekend.track().key, "monaco");
    }

    #[test]
    fn unknown_track_leaves_state_untouched() {
        let mut weekend = weekend(3);
        let grid = weekend.ensure_grid().unwrap().clone();
        let err = weekend.select_track("paul-ricard").unwrap_err();
        assert!(matches!(err, PredictorError::TrackNotFound { .. }));
        assert_eq!(weekend.grid(), Some(&grid));
        assert_eq!(weekend.track().key, DEFAULT_TRACK_KEY);
    }

    #[test]
    fn predictions_repeat_for_identical_state() {
        let mut weekend = weekend(4);
        let first = weekend.predict().unwrap();
        let second = weekend.predict().unwrap();
        assert_eq!(first, second);

        weekend.set_weight(Factor::Pace, 0);
        let changed = weekend.predict().unwrap();
        assert!((changed.weights.pace).abs() < f64::EPSILON);
        weekend.reset_weights();
        assert_eq!(weekend.predict().unwrap(), first);
    }

    #[test]
    fn regenerate_draws_a_new_grid() {
        let mut weekend = weekend(5);
        let first = weekend.ensure_grid().unwrap().clone();
        let second = weekend.regenerate_qualifying().unwrap().clone();
        assert_ne!(first, second);
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn grid_edits_apply_or_cancel_wholesale() {
        let mut weekend = weekend(6);
        let original = weekend.begin_grid_edit().unwrap().clone();
        assert!(weekend.is_editing());

        let mut order: Vec<DriverCode> =
            original.entries().iter().map(|e| e.driver.clone()).collect();
        order.reverse();
        let edited = weekend.apply_grid_edit(&order).unwrap().clone();
        assert!(!weekend.is_editing());
        assert_eq!(edited.pole().unwrap().driver, order[0]);

        weekend.begin_grid_edit().unwrap();
        order.truncate(3);
        assert!(weekend.apply_grid_edit(&order).is_err());
        weekend.cancel_grid_edit();
        assert_eq!(weekend.grid(), Some(&edited));
    }

    #[test]
    fn rejects_nan_weights_without_side_effects() {
        let mut weekend = weekend(7);
        let broken = FeatureWeights::DEFAULTS.with(Factor::Quali, f64::NAN);
        assert!(weekend.set_weights(broken).is_err());
        assert_eq!(*weekend.weights(), FeatureWeights::DEFAULTS);
        weekend
            .set_weights(FeatureWeights::DEFAULTS.with(Factor::Quali, 2.0))
            .unwrap();
        assert!((weekend.weights().quali - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn share_codes_restore_seed_and_chaos() {
        let mut weekend = weekend(0x0A05);
        assert!(weekend.toggle_chaos());
        let code = weekend.share_code();
        assert!(code.starts_with("CX-"));
        let mut restored =
            RaceWeekend::from_share_code(DriverRegistry::builtin(), TrackRegistry::builtin(), &code)
                .unwrap();
        assert!(restored.chaos());
        assert_eq!(restored.share_code(), code);
        assert_eq!(restored.seed(), weekend.seed());

        assert_eq!(restored.ensure_grid().unwrap(), weekend.ensure_grid().unwrap());
        assert_eq!(restored.predict().unwrap(), weekend.predict().unwrap());
    }

    #[test]
    fn chaos_toggle_keeps_the_grid_seed() {
        let mut weekend = weekend(300);
        let calm_grid = weekend.ensure_grid().unwrap().clone();
        let calm_code = weekend.share_code();
        weekend.toggle_chaos();
        let chaos_code = weekend.share_code();
        assert_eq!(calm_code[3..], chaos_code[3..]);

        let (_, calm_seed) = decode_to_seed(&calm_code).unwrap();
        let (_, chaos_seed) = decode_to_seed(&chaos_code).unwrap();
        assert_eq!(calm_seed, chaos_seed);
        assert_eq!(chaos_seed, weekend.seed());
        let mut replay = RaceWeekend::from_share_code(
            DriverRegistry::builtin(),
            TrackRegistry::builtin(),
            &chaos_code,
        )
        .unwrap();
        assert_eq!(*replay.ensure_grid().unwrap(), calm_grid);
    }

    #[test]
    fn reseed_drops_the_grid() {
        let mut weekend = weekend(8);
        weekend.ensure_grid().unwrap();
        weekend.reseed(9);
        assert!(weekend.grid().is_none());
        assert_eq!(weekend.seed(), canonical_seed(9));
        assert_ne!(weekend.seed(), canonical_seed(8));
    }
}
