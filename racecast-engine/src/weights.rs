//! Feature weights for the five scoring factors.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WeightError;

/// One of the five scoring inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Factor {
    Track,
    Pace,
    Quali,
    Team,
    Weather,
}

impl Factor {
    pub const ALL: [Self; 5] = [
        Self::Track,
        Self::Pace,
        Self::Quali,
        Self::Team,
        Self::Weather,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Pace => "pace",
            Self::Quali => "quali",
            Self::Team => "team",
            Self::Weather => "weather",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Factor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|factor| factor.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown factor {s:?} (expected track, pace, quali, team or weather)")
            })
    }
}

/// Multiplicative factor weights in [0, 1]. Keys absent from serialized input read as 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeights {
    #[serde(default)]
    pub track: f64,
    #[serde(default)]
    pub pace: f64,
    #[serde(default)]
    pub quali: f64,
    #[serde(default)]
    pub team: f64,
    #[serde(default)]
    pub weather: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self::DEFAULTS
    }
}

impl FeatureWeights {
    /// Snapshot restored by a weight reset.
    pub const DEFAULTS: Self = Self {
        track: 0.85,
        pace: 0.90,
        quali: 0.85,
        team: 0.68,
        weather: 0.45,
    };

    /// Every factor disabled.
    pub const ZERO: Self = Self {
        track: 0.0,
        pace: 0.0,
        quali: 0.0,
        team: 0.0,
        weather: 0.0,
    };

    #[must_use]
    pub const fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Track => self.track,
            Factor::Pace => self.pace,
            Factor::Quali => self.quali,
            Factor::Team => self.team,
            Factor::Weather => self.weather,
        }
    }

    pub const fn set(&mut self, factor: Factor, value: f64) {
        match factor {
            Factor::Track => self.track = value,
            Factor::Pace => self.pace = value,
            Factor::Quali => self.quali = value,
            Factor::Team => self.team = value,
            Factor::Weather => self.weather = value,
        }
    }

    /// Copy with one factor replaced.
    #[must_use]
    pub const fn with(mut self, factor: Factor, value: f64) -> Self {
        self.set(factor, value);
        self
    }

    /// Only `factor` enabled, at full weight.
    #[must_use]
    pub const fn only(factor: Factor) -> Self {
        Self::ZERO.with(factor, 1.0)
    }

    /// Set a factor from a 0-100 slider value.
    pub fn set_percent(&mut self, factor: Factor, percent: u8) {
        self.set(factor, f64::from(percent.min(100)) / 100.0);
    }

    /// Clamp every weight into [0, 1].
    ///
    /// # Errors
    ///
    /// Returns [`WeightError::NotFinite`] for NaN or infinite weights, which cannot be clamped.
    pub fn sanitized(&self) -> Result<Self, WeightError> {
        let mut out = *self;
        for factor in Factor::ALL {
            let value = self.get(factor);
            if !value.is_finite() {
                return Err(WeightError::NotFinite { factor, value });
            }
            out.set(factor, value.clamp(0.0, 1.0));
        }
        Ok(out)
    }

    /// Reject any weight outside [0, 1] instead of clamping it.
    ///
    /// # Errors
    ///
    /// Returns the first offending factor.
    pub fn validate(&self) -> Result<(), WeightError> {
        for factor in Factor::ALL {
            let value = self.get(factor);
            if !value.is_finite() {
                return Err(WeightError::NotFinite { factor, value });
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(WeightError::OutOfRange { factor, value });
            }
        }
        Ok(())
    }
}
