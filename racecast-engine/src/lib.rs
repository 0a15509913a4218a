//! Racecast Prediction Engine
//!
//! Platform-agnostic core of the Racecast F1 predictor: driver and track
//! registries, a seeded qualifying simulator, and a weighted race prediction
//! model. No UI, I/O, or logging lives here.

pub mod batch;
pub mod constants;
pub mod driver;
pub mod error;
pub mod numbers;
pub mod prediction;
pub mod qualifying;
pub mod random;
pub mod seed;
pub mod session;
pub mod timing;
pub mod track;
pub mod weights;

use std::convert::Infallible;

// Re-export commonly used types
pub use batch::{BatchSummary, DriverTally, simulate_batch};
pub use driver::{
    BUNDLED_DRIVER_TABLE, CareerStats, Driver, DriverCode, DriverDefinition, DriverInfo,
    DriverRegistry, ExcludedDriver, RegistryReport, Skills, Specialization,
};
pub use error::{PredictorError, RegistryError, WeightError};
pub use prediction::{
    ConfidenceLevel, DriverFactors, PredictionEntry, PredictionResult, RaceEvent, RaceNarrative,
    generate_predictions, predict,
};
pub use qualifying::{GridEntry, QualifyingGrid, simulate_qualifying, simulate_qualifying_by_key};
pub use random::{ConstantSource, CountingRng, RandomSource, RngBundle, ScriptedSource};
pub use seed::{canonical_seed, decode_to_seed, encode_friendly, generate_code_from_entropy};
pub use session::RaceWeekend;
pub use timing::{format_gap, format_lap_time};
pub use track::{
    BUNDLED_TRACK_TABLE, DEFAULT_TRACK_KEY, Track, TrackCharacteristics, TrackRegistry,
    TrackWeather,
};
pub use weights::{Factor, FeatureWeights};

/// Trait for abstracting where the driver and track tables come from.
/// Platform-specific implementations should provide this
pub trait TableLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Driver tables in merge order; later layers patch earlier ones.
    ///
    /// # Errors
    ///
    /// Returns an error if a table cannot be read.
    fn driver_layers(&self) -> Result<Vec<String>, Self::Error>;

    /// The track table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be read.
    fn track_table(&self) -> Result<String, Self::Error>;
}

/// Serves the tables compiled into the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledTables;

impl TableLoader for BundledTables {
    type Error = Infallible;

    fn driver_layers(&self) -> Result<Vec<String>, Self::Error> {
        Ok(vec![BUNDLED_DRIVER_TABLE.to_string()])
    }

    fn track_table(&self) -> Result<String, Self::Error> {
        Ok(BUNDLED_TRACK_TABLE.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError<E>
where
    E: std::error::Error + 'static,
{
    #[error("table source failed: {0}")]
    Source(#[source] E),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Owns the loaded registries and hands out sessions and one-shot runs.
#[derive(Debug, Clone)]
pub struct RaceEngine {
    drivers: DriverRegistry,
    tracks: TrackRegistry,
}

impl RaceEngine {
    #[must_use]
    pub const fn new(drivers: DriverRegistry, tracks: TrackRegistry) -> Self {
        Self { drivers, tracks }
    }

    /// Build both registries from a table loader.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Source`] when the loader fails and
    /// [`LoadError::Registry`] when a table is malformed.
    pub fn load<L: TableLoader>(loader: &L) -> Result<Self, LoadError<L::Error>> {
        let layers = loader.driver_layers().map_err(LoadError::Source)?;
        let track_table = loader.track_table().map_err(LoadError::Source)?;
        let layer_refs: Vec<&str> = layers.iter().map(String::as_str).collect();
        let drivers = DriverRegistry::from_json_layers(&layer_refs)?;
        let tracks = TrackRegistry::from_json(&track_table)?;
        Ok(Self::new(drivers, tracks))
    }

    #[must_use]
    pub const fn drivers(&self) -> &DriverRegistry {
        &self.drivers
    }

    #[must_use]
    pub const fn tracks(&self) -> &TrackRegistry {
        &self.tracks
    }

    /// Start an interactive weekend on the default track.
    #[must_use]
    pub fn weekend(&self, seed: u64) -> RaceWeekend<'_> {
        RaceWeekend::new(&self.drivers, &self.tracks, seed)
    }

    /// Start a weekend from a share code, or `None` if the code does not parse.
    #[must_use]
    pub fn weekend_from_code(&self, code: &str) -> Option<RaceWeekend<'_>> {
        RaceWeekend::from_share_code(&self.drivers, &self.tracks, code)
    }

    /// Qualify on a track with the qualifying stream of `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`PredictorError::TrackNotFound`] for an unknown key.
    pub fn qualify(&self, track_key: &str, seed: u64) -> Result<QualifyingGrid, PredictorError> {
        let bundle = RngBundle::from_user_seed(seed);
        let mut rng = bundle.qualifying();
        let grid = simulate_qualifying_by_key(&self.drivers, &self.tracks, track_key, &mut *rng)?;
        Ok(grid)
    }

    /// Predict a race on a given grid with the race stream of `seed`.
    ///
    /// # Errors
    ///
    /// Propagates every error of [`predict`].
    pub fn predict(
        &self,
        track_key: &str,
        grid: &QualifyingGrid,
        weights: &FeatureWeights,
        chaos: bool,
        seed: u64,
    ) -> Result<PredictionResult, PredictorError> {
        let bundle = RngBundle::from_user_seed(seed);
        let mut rng = bundle.race();
        let result = predict(
            &self.drivers,
            &self.tracks,
            track_key,
            grid,
            weights,
            chaos,
            &mut *rng,
        )?;
        Ok(result)
    }

    /// Run [`simulate_batch`] on a track looked up by key.
    ///
    /// # Errors
    ///
    /// Returns [`PredictorError::TrackNotFound`] for an unknown key, plus
    /// every error of the batch run.
    pub fn batch(
        &self,
        track_key: &str,
        weights: &FeatureWeights,
        chaos: bool,
        seeds: impl IntoIterator<Item = u64>,
    ) -> Result<BatchSummary, PredictorError> {
        let track = self.tracks.require(track_key)?;
        simulate_batch(&self.drivers, track, weights, chaos, seeds)
    }
}
