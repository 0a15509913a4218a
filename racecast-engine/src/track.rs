//! Track registry and race-day conditions.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::driver::check_range;
use crate::error::{PredictorError, RegistryError};

/// Key of the track selected when a session starts.
pub const DEFAULT_TRACK_KEY: &str = "austria";

/// Track table shipped with the engine.
pub const BUNDLED_TRACK_TABLE: &str = include_str!("../data/tracks.json");

/// Race-day weather condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrackWeather {
    #[default]
    Dry,
    Wet,
    Mixed,
}

impl TrackWeather {
    /// How strongly the condition affects lap times, 0 (dry) to 1 (wet).
    #[must_use]
    pub const fn wet_intensity(self) -> f64 {
        match self {
            Self::Dry => 0.0,
            Self::Mixed => 0.5,
            Self::Wet => 1.0,
        }
    }

    #[must_use]
    pub const fn is_wet(self) -> bool {
        !matches!(self, Self::Dry)
    }
}

impl fmt::Display for TrackWeather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dry => write!(f, "dry"),
            Self::Wet => write!(f, "wet"),
            Self::Mixed => write!(f, "mixed"),
        }
    }
}

/// Circuit modifiers in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackCharacteristics {
    /// Technical difficulty; higher rewards consistency and widens qualifying spread.
    pub difficulty: f64,
    /// Tire degradation; higher rewards tire management.
    #[serde(default)]
    pub tire_wear: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub key: String,
    pub name: String,
    pub country: String,
    pub laps: u16,
    /// Reference lap in seconds, used to detect lapped finishers.
    pub lap_record: f64,
    #[serde(default)]
    pub weather: TrackWeather,
    #[serde(default)]
    pub street_circuit: bool,
    pub overtaking_difficulty: f64,
    pub characteristics: TrackCharacteristics,
}

impl Track {
    fn validate(&self) -> Result<(), RegistryError> {
        if !self.lap_record.is_finite() || self.lap_record <= 0.0 {
            return Err(RegistryError::NotPositive {
                entry: self.key.clone(),
                field: "lap_record",
                value: self.lap_record,
            });
        }
        check_range(
            &self.key,
            "overtaking_difficulty",
            Some(self.overtaking_difficulty),
            1.0,
        )?;
        check_range(
            &self.key,
            "characteristics.difficulty",
            Some(self.characteristics.difficulty),
            1.0,
        )?;
        check_range(
            &self.key,
            "characteristics.tire_wear",
            Some(self.characteristics.tire_wear),
            1.0,
        )
    }
}

#[derive(Debug, Deserialize)]
struct TrackTable {
    tracks: Vec<Track>,
}

/// Read-only table of tracks in calendar order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRegistry {
    tracks: Vec<Track>,
}

impl TrackRegistry {
    /// Build a registry, rejecting malformed rows and duplicate keys.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid modifiers, duplicate keys, or an empty table.
    pub fn from_tracks(tracks: Vec<Track>) -> Result<Self, RegistryError> {
        for (i, track) in tracks.iter().enumerate() {
            track.validate()?;
            if tracks[..i].iter().any(|t| t.key == track.key) {
                return Err(RegistryError::DuplicateTrack {
                    key: track.key.clone(),
                });
            }
        }
        if tracks.is_empty() {
            return Err(RegistryError::Empty { kind: "tracks" });
        }
        Ok(Self { tracks })
    }

    /// Load a registry from a JSON table `{ "tracks": [...] }`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or the table is invalid.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let table: TrackTable = serde_json::from_str(json)?;
        Self::from_tracks(table.tracks)
    }

    /// The track table bundled with the engine.
    #[must_use]
    pub fn builtin() -> &'static Self {
        static REGISTRY: OnceLock<TrackRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            Self::from_json(BUNDLED_TRACK_TABLE)
                .expect("valid bundled track table")
        })
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.key == key)
    }

    /// Look up a track, failing with [`PredictorError::TrackNotFound`].
    ///
    /// # Errors
    ///
    /// Returns an error when the key is not registered.
    pub fn require(&self, key: &str) -> Result<&Track, PredictorError> {
        self.get(key).ok_or_else(|| PredictorError::TrackNotFound {
            key: key.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
