//! Driver registry: static performance table with a field-level merge policy.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use crate::constants::NEUTRAL_SKILL;
use crate::error::{PredictorError, RegistryError};

/// Driver table shipped with the engine.
pub const BUNDLED_DRIVER_TABLE: &str = include_str!("../data/drivers.json");

/// Three-letter driver identifier such as `VER`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverCode(String);

impl DriverCode {
    /// Validate and wrap a code. Only three uppercase ASCII letters are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidCode`] for anything else.
    pub fn parse(code: &str) -> Result<Self, RegistryError> {
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(code.to_string()))
        } else {
            Err(RegistryError::InvalidCode {
                code: code.to_string(),
            })
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DriverCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scenario-specific skill keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialization {
    Overtaking,
    RainMastery,
    TireManagement,
    StreetCircuits,
}

/// Specialization scores in [0, 1]; a missing entry reads as neutral.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Skills {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overtaking: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rain_mastery: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tire_management: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_circuits: Option<f64>,
}

impl Skills {
    #[must_use]
    pub fn get(&self, specialization: Specialization) -> f64 {
        self.slot(specialization).unwrap_or(NEUTRAL_SKILL)
    }

    const fn slot(&self, specialization: Specialization) -> Option<f64> {
        match specialization {
            Specialization::Overtaking => self.overtaking,
            Specialization::RainMastery => self.rain_mastery,
            Specialization::TireManagement => self.tire_management,
            Specialization::StreetCircuits => self.street_circuits,
        }
    }

    fn merge(&mut self, later: Self) {
        self.overtaking = later.overtaking.or(self.overtaking);
        self.rain_mastery = later.rain_mastery.or(self.rain_mastery);
        self.tire_management = later.tire_management.or(self.tire_management);
        self.street_circuits = later.street_circuits.or(self.street_circuits);
    }
}

/// Career record, informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CareerStats {
    #[serde(default)]
    pub championships: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub podiums: u32,
    #[serde(default)]
    pub poles: u32,
}

/// Profile details, informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverInfo {
    pub age: u8,
    pub experience: u8,
    pub nationality: String,
}

/// One raw table row. Rows sharing a code are merged in table order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DriverDefinition {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub base_pace: Option<f64>,
    #[serde(default)]
    pub base_confidence: Option<f64>,
    #[serde(default)]
    pub quali_skill: Option<f64>,
    #[serde(default)]
    pub consistency: Option<f64>,
    #[serde(default)]
    pub skills: Skills,
    #[serde(default)]
    pub stats: Option<CareerStats>,
    #[serde(default)]
    pub info: Option<DriverInfo>,
}

impl DriverDefinition {
    /// Apply a later definition: every field it sets wins, the rest is kept.
    fn merge(&mut self, later: Self) {
        self.name = later.name.or(self.name.take());
        self.team = later.team.or(self.team.take());
        self.base_pace = later.base_pace.or(self.base_pace);
        self.base_confidence = later.base_confidence.or(self.base_confidence);
        self.quali_skill = later.quali_skill.or(self.quali_skill);
        self.consistency = later.consistency.or(self.consistency);
        self.skills.merge(later.skills);
        self.stats = later.stats.or(self.stats);
        self.info = later.info.or(self.info.take());
    }

    fn validate(&self) -> Result<(), RegistryError> {
        if let Some(pace) = self.base_pace
            && (!pace.is_finite() || pace <= 0.0)
        {
            return Err(RegistryError::NotPositive {
                entry: self.code.clone(),
                field: "base_pace",
                value: pace,
            });
        }
        check_range(&self.code, "base_confidence", self.base_confidence, 100.0)?;
        check_range(&self.code, "quali_skill", self.quali_skill, 1.0)?;
        check_range(&self.code, "consistency", self.consistency, 1.0)?;
        check_range(&self.code, "skills.overtaking", self.skills.overtaking, 1.0)?;
        check_range(&self.code, "skills.rain_mastery", self.skills.rain_mastery, 1.0)?;
        check_range(
            &self.code,
            "skills.tire_management",
            self.skills.tire_management,
            1.0,
        )?;
        check_range(
            &self.code,
            "skills.street_circuits",
            self.skills.street_circuits,
            1.0,
        )
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.is_none() {
            missing.push("name");
        }
        if self.team.is_none() {
            missing.push("team");
        }
        if self.base_pace.is_none() {
            missing.push("base_pace");
        }
        if self.base_confidence.is_none() {
            missing.push("base_confidence");
        }
        if self.quali_skill.is_none() {
            missing.push("quali_skill");
        }
        if self.consistency.is_none() {
            missing.push("consistency");
        }
        missing
    }

    fn into_driver(self, code: DriverCode) -> Result<Driver, Vec<&'static str>> {
        let missing = self.missing_fields();
        match (
            self.name,
            self.team,
            self.base_pace,
            self.base_confidence,
            self.quali_skill,
            self.consistency,
        ) {
            (
                Some(name),
                Some(team),
                Some(base_pace),
                Some(base_confidence),
                Some(quali_skill),
                Some(consistency),
            ) => Ok(Driver {
                code,
                name,
                team,
                base_pace,
                base_confidence,
                quali_skill,
                consistency,
                skills: self.skills,
                stats: self.stats.unwrap_or_default(),
                info: self.info,
            }),
            _ => Err(missing),
        }
    }
}

pub(crate) fn check_range(
    entry: &str,
    field: &'static str,
    value: Option<f64>,
    max: f64,
) -> Result<(), RegistryError> {
    match value {
        Some(v) if !(0.0..=max).contains(&v) => Err(RegistryError::FieldOutOfRange {
            entry: entry.to_string(),
            field,
            min: 0.0,
            max,
            value: v,
        }),
        _ => Ok(()),
    }
}

/// A fully specified driver usable for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub code: DriverCode,
    pub name: String,
    pub team: String,
    /// Baseline lap time in seconds; lower is faster.
    pub base_pace: f64,
    /// Model certainty, 0-100.
    pub base_confidence: f64,
    pub quali_skill: f64,
    pub consistency: f64,
    pub skills: Skills,
    pub stats: CareerStats,
    pub info: Option<DriverInfo>,
}

impl Driver {
    #[must_use]
    pub fn skill(&self, specialization: Specialization) -> f64 {
        self.skills.get(specialization)
    }
}

/// Driver left out of the registry because its merged profile was incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedDriver {
    pub code: DriverCode,
    pub missing: Vec<&'static str>,
}

/// Data-quality notes gathered while building a registry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RegistryReport {
    /// Codes that had more than one definition and were merged.
    pub merged: Vec<DriverCode>,
    pub excluded: Vec<ExcludedDriver>,
}

impl RegistryReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.merged.is_empty() && self.excluded.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct DriverTable {
    drivers: Vec<DriverDefinition>,
}

/// Read-only table of scoring-ready drivers in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverRegistry {
    drivers: Vec<Driver>,
    index: HashMap<DriverCode, usize>,
    report: RegistryReport,
}

impl DriverRegistry {
    /// Build a registry from raw definitions.
    ///
    /// Definitions sharing a code are merged field-by-field, later rows winning.
    /// Drivers still missing required fields afterwards are excluded and listed
    /// in [`Self::report`].
    ///
    /// # Errors
    ///
    /// Returns an error when a present field is malformed or no driver survives.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = DriverDefinition>,
    ) -> Result<Self, RegistryError> {
        let mut order: Vec<DriverCode> = Vec::new();
        let mut merged: HashMap<DriverCode, DriverDefinition> = HashMap::new();
        let mut report = RegistryReport::default();

        for definition in definitions {
            let code = DriverCode::parse(&definition.code)?;
            definition.validate()?;
            if let Some(existing) = merged.get_mut(&code) {
                existing.merge(definition);
                if !report.merged.contains(&code) {
                    report.merged.push(code);
                }
            } else {
                order.push(code.clone());
                merged.insert(code, definition);
            }
        }

        let mut drivers = Vec::with_capacity(order.len());
        for code in order {
            let Some(definition) = merged.remove(&code) else {
                continue;
            };
            match definition.into_driver(code.clone()) {
                Ok(driver) => drivers.push(driver),
                Err(missing) => report.excluded.push(ExcludedDriver { code, missing }),
            }
        }

        if drivers.is_empty() {
            return Err(RegistryError::Empty { kind: "drivers" });
        }

        let index = drivers
            .iter()
            .enumerate()
            .map(|(i, d)| (d.code.clone(), i))
            .collect();
        Ok(Self {
            drivers,
            index,
            report,
        })
    }

    /// Load a registry from a JSON table `{ "drivers": [...] }`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or the table is invalid.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        Self::from_json_layers(&[json])
    }

    /// Load a registry from several JSON tables applied in order, so later
    /// layers patch fields of earlier ones.
    ///
    /// # Errors
    ///
    /// Returns an error if any layer cannot be parsed or the merged table is invalid.
    pub fn from_json_layers(layers: &[&str]) -> Result<Self, RegistryError> {
        let mut definitions = Vec::new();
        for layer in layers {
            let table: DriverTable = serde_json::from_str(layer)?;
            definitions.extend(table.drivers);
        }
        Self::from_definitions(definitions)
    }

    /// The driver table bundled with the engine.
    #[must_use]
    pub fn builtin() -> &'static Self {
        static REGISTRY: OnceLock<DriverRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            Self::from_json(BUNDLED_DRIVER_TABLE)
                .expect("valid bundled driver table")
        })
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<&Driver> {
        let code = DriverCode::parse(code).ok()?;
        self.index.get(&code).map(|&i| &self.drivers[i])
    }

    /// Look up a driver, failing with [`PredictorError::UnknownDriver`].
    ///
    /// # Errors
    ///
    /// Returns an error when the code is not registered.
    pub fn require(&self, code: &DriverCode) -> Result<&Driver, PredictorError> {
        self.index
            .get(code)
            .map(|&i| &self.drivers[i])
            .ok_or_else(|| PredictorError::UnknownDriver {
                code: code.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Driver> {
        self.drivers.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn report(&self) -> &RegistryReport {
        &self.report
    }

    /// Mean `base_pace` of every registered driver per team.
    #[must_use]
    pub fn team_mean_pace(&self) -> HashMap<&str, f64> {
        let mut sums: HashMap<&str, (f64, u32)> = HashMap::new();
        for driver in &self.drivers {
            let slot = sums.entry(driver.team.as_str()).or_insert((0.0, 0));
            slot.0 += driver.base_pace;
            slot.1 += 1;
        }
        sums.into_iter()
            .map(|(team, (sum, count))| (team, sum / f64::from(count)))
            .collect()
    }
}
