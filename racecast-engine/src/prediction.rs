//! Race prediction: weighted factor scoring, chaos perturbation, gap synthesis.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

use crate::constants::{
    CHAOS_CONFIDENCE_PENALTY, CHAOS_VARIANCE, CONFIDENCE_HIGH, CONFIDENCE_MEDIUM,
    DIFFICULTY_CONSISTENCY_SHARE, GAP_SECONDS_PER_POINT, GRID_SLOT_SHARE, INCIDENT_PENALTY,
    INCIDENT_PROBABILITY, INCIDENT_PROTECTED_SLOTS, NEUTRAL_SKILL, OVERTAKING_BONUS,
    RACE_VARIANCE, RACE_VARIANCE_OFFSET, WET_CONFIDENCE_PENALTY,
};
use crate::driver::{Driver, DriverCode, DriverRegistry, Specialization};
use crate::error::PredictorError;
use crate::numbers::{
    clamp_unit, floor_f64_to_u32, position_to_i32, round_f64_to_u8, unit_to_index, usize_to_f64,
};
use crate::qualifying::QualifyingGrid;
use crate::random::RandomSource;
use crate::track::{Track, TrackRegistry};
use crate::weights::{Factor, FeatureWeights};

/// Per-driver factor values, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverFactors {
    pub track: f64,
    pub pace: f64,
    pub quali: f64,
    pub team: f64,
    pub weather: f64,
}

impl DriverFactors {
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

    /// Weighted sum of the factors.
    #[must_use]
    pub fn weighted(&self, weights: &FeatureWeights) -> f64 {
        Factor::ALL
            .into_iter()
            .map(|factor| weights.get(factor) * self.get(factor))
            .sum()
    }
}

/// Bucketed model certainty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    #[must_use]
    pub const fn from_percent(confidence: u8) -> Self {
        if confidence >= CONFIDENCE_HIGH {
            Self::High
        } else if confidence >= CONFIDENCE_MEDIUM {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// One finisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEntry {
    pub position: usize,
    pub driver: DriverCode,
    pub name: String,
    pub team: String,
    pub grid_position: usize,
    pub score: f64,
    /// Seconds behind the leader.
    pub gap: f64,
    /// Grid position minus finishing position; positive means places gained.
    pub position_change: i32,
    pub confidence: u8,
    pub confidence_level: ConfidenceLevel,
    pub factors: DriverFactors,
    #[serde(default)]
    pub incident: bool,
    #[serde(default)]
    pub laps_down: u32,
}

/// Narrative beats derived from a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RaceEvent {
    PoleToWin {
        driver: DriverCode,
    },
    BiggestClimber {
        driver: DriverCode,
        places: u32,
    },
    BiggestFaller {
        driver: DriverCode,
        places: u32,
    },
    /// Total places gained across the field.
    Overtakes {
        count: u32,
    },
    Incident {
        driver: DriverCode,
        grid_position: usize,
        finish_position: usize,
    },
    Lapped {
        driver: DriverCode,
        laps: u32,
    },
}

pub type RaceNarrative = SmallVec<[RaceEvent; 4]>;

/// Complete predicted classification for one race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub track_key: String,
    pub chaos: bool,
    pub weights: FeatureWeights,
    pub entries: Vec<PredictionEntry>,
    pub events: RaceNarrative,
}

impl PredictionResult {
    #[must_use]
    pub fn winner(&self) -> Option<&PredictionEntry> {
        self.entries.first()
    }

    #[must_use]
    pub fn podium(&self) -> &[PredictionEntry] {
        &self.entries[..self.entries.len().min(3)]
    }

    #[must_use]
    pub fn entry(&self, code: &str) -> Option<&PredictionEntry> {
        self.entries.iter().find(|e| e.driver.as_str() == code)
    }

    #[must_use]
    pub fn incident(&self) -> Option<&PredictionEntry> {
        self.entries.iter().find(|e| e.incident)
    }
}

/// Field-wide reference values for normalization.
struct FieldContext<'a> {
    fastest_pace: f64,
    slowest_pace: f64,
    team_pace: HashMap<&'a str, f64>,
    fastest_team: f64,
    slowest_team: f64,
    grid_size: usize,
}

impl<'a> FieldContext<'a> {
    fn new(registry: &'a DriverRegistry, field: &[&Driver]) -> Self {
        let (fastest_pace, slowest_pace) = bounds(field.iter().map(|d| d.base_pace));
        let team_pace = registry.team_mean_pace();
        let (fastest_team, slowest_team) = bounds(team_pace.values().copied());
        Self {
            fastest_pace,
            slowest_pace,
            team_pace,
            fastest_team,
            slowest_team,
            grid_size: field.len(),
        }
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Faster (lower) values map toward 1.0; a field with no spread scores 1.0.
fn inverse_normalized(value: f64, fastest: f64, slowest: f64) -> f64 {
    let span = slowest - fastest;
    if !span.is_finite() || span <= f64::EPSILON {
        return 1.0;
    }
    clamp_unit((slowest - value) / span)
}

fn lerp(start: f64, end: f64, t: f64) -> f64 {
    (end - start).mul_add(clamp_unit(t), start)
}

fn grid_slot_factor(position: usize, grid_size: usize) -> f64 {
    if grid_size <= 1 {
        return 1.0;
    }
    clamp_unit(usize_to_f64(grid_size - position.min(grid_size)) / usize_to_f64(grid_size - 1))
}

fn track_fit(driver: &Driver, track: &Track) -> f64 {
    let fit = if track.street_circuit {
        driver.skill(Specialization::StreetCircuits)
    } else {
        lerp(
            NEUTRAL_SKILL,
            driver.skill(Specialization::TireManagement),
            track.characteristics.tire_wear,
        )
    };
    let consistency_share = track.characteristics.difficulty * DIFFICULTY_CONSISTENCY_SHARE;
    let blended = lerp(fit, driver.consistency, consistency_share);
    let passing = (driver.skill(Specialization::Overtaking) - NEUTRAL_SKILL)
        * (1.0 - track.overtaking_difficulty)
        * OVERTAKING_BONUS;
    clamp_unit(blended + passing)
}

fn factors_for(
    driver: &Driver,
    grid_position: usize,
    track: &Track,
    field: &FieldContext<'_>,
) -> DriverFactors {
    let pace = inverse_normalized(driver.base_pace, field.fastest_pace, field.slowest_pace);
    let quali = lerp(
        driver.quali_skill,
        grid_slot_factor(grid_position, field.grid_size),
        GRID_SLOT_SHARE,
    );
    let team = field
        .team_pace
        .get(driver.team.as_str())
        .map_or(NEUTRAL_SKILL, |&mean| {
            inverse_normalized(mean, field.fastest_team, field.slowest_team)
        });
    let weather = if track.weather.is_wet() {
        driver.skill(Specialization::RainMastery)
    } else {
        NEUTRAL_SKILL
    };
    DriverFactors {
        track: track_fit(driver, track),
        pace,
        quali,
        team,
        weather,
    }
}

fn confidence_for(driver: &Driver, track: &Track, chaos: bool) -> u8 {
    let mut confidence = driver.base_confidence;
    confidence -= track.weather.wet_intensity() * WET_CONFIDENCE_PENALTY;
    if chaos {
        confidence -= CHAOS_CONFIDENCE_PENALTY;
    }
    round_f64_to_u8(confidence.clamp(0.0, 100.0))
}

struct Contender<'a> {
    driver: &'a Driver,
    grid_position: usize,
    factors: DriverFactors,
    score: f64,
    incident: bool,
}

/// Predict a race on a track looked up by key.
///
/// # Errors
///
/// Returns [`PredictorError::TrackNotFound`] for an unknown key, plus every
/// error of [`generate_predictions`].
pub fn predict<R: RandomSource + ?Sized>(
    registry: &DriverRegistry,
    tracks: &TrackRegistry,
    track_key: &str,
    grid: &QualifyingGrid,
    weights: &FeatureWeights,
    chaos: bool,
    rng: &mut R,
) -> Result<PredictionResult, PredictorError> {
    let track = tracks.require(track_key)?;
    generate_predictions(registry, track, grid, weights, chaos, rng)
}

/// Score every grid driver and produce the predicted classification.
///
/// Draw order is fixed: one race-noise draw per grid entry in grid order, then
/// (chaos only) one chaos draw per entry, one incident roll and, when the roll
/// hits, one victim pick.
///
/// # Errors
///
/// Fails on an empty grid, a grid driver missing from the registry, a driver
/// listed twice, or a non-finite weight.
pub fn generate_predictions<R: RandomSource + ?Sized>(
    registry: &DriverRegistry,
    track: &Track,
    grid: &QualifyingGrid,
    weights: &FeatureWeights,
    chaos: bool,
    rng: &mut R,
) -> Result<PredictionResult, PredictorError> {
    if grid.is_empty() {
        return Err(PredictorError::EmptyGrid);
    }
    let weights = weights.sanitized()?;

    let mut seen = HashSet::with_capacity(grid.len());
    let mut field = Vec::with_capacity(grid.len());
    for entry in grid.entries() {
        if !seen.insert(&entry.driver) {
            return Err(PredictorError::DuplicateDriver {
                code: entry.driver.to_string(),
            });
        }
        field.push(registry.require(&entry.driver)?);
    }
    let context = FieldContext::new(registry, &field);

    let mut contenders: Vec<Contender<'_>> = grid
        .entries()
        .iter()
        .zip(field)
        .map(|(entry, driver)| {
            let factors = factors_for(driver, entry.position, track, &context);
            let race_noise = rng.centered()
                * RACE_VARIANCE
                * (RACE_VARIANCE_OFFSET - driver.consistency);
            Contender {
                driver,
                grid_position: entry.position,
                factors,
                score: factors.weighted(&weights) + race_noise,
                incident: false,
            }
        })
        .collect();

    if chaos {
        apply_chaos(&mut contenders, rng);
    }

    contenders.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.grid_position.cmp(&b.grid_position))
    });

    let leader_score = contenders.first().map_or(0.0, |c| c.score);
    let entries: Vec<PredictionEntry> = contenders
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            let position = i + 1;
            let gap = ((leader_score - c.score) * GAP_SECONDS_PER_POINT).max(0.0);
            let confidence = confidence_for(c.driver, track, chaos);
            PredictionEntry {
                position,
                driver: c.driver.code.clone(),
                name: c.driver.name.clone(),
                team: c.driver.team.clone(),
                grid_position: c.grid_position,
                score: c.score,
                gap,
                position_change: position_to_i32(c.grid_position) - position_to_i32(position),
                confidence,
                confidence_level: ConfidenceLevel::from_percent(confidence),
                factors: c.factors,
                incident: c.incident,
                laps_down: floor_f64_to_u32(gap / track.lap_record),
            }
        })
        .collect();

    let events = narrate(&entries);
    Ok(PredictionResult {
        track_key: track.key.clone(),
        chaos,
        weights,
        entries,
        events,
    })
}

/// Widen every score, then maybe strike one driver outside the protected grid slots.
fn apply_chaos<R: RandomSource + ?Sized>(contenders: &mut [Contender<'_>], rng: &mut R) {
    for contender in contenders.iter_mut() {
        contender.score += rng.centered() * CHAOS_VARIANCE;
    }
    if rng.next_unit() >= INCIDENT_PROBABILITY {
        return;
    }
    let eligible: Vec<usize> = contenders
        .iter()
        .enumerate()
        .filter(|(_, c)| c.grid_position > INCIDENT_PROTECTED_SLOTS)
        .map(|(i, _)| i)
        .collect();
    if let Some(pick) = unit_to_index(rng.next_unit(), eligible.len()) {
        let victim = &mut contenders[eligible[pick]];
        victim.score -= INCIDENT_PENALTY;
        victim.incident = true;
    }
}

fn narrate(entries: &[PredictionEntry]) -> RaceNarrative {
    let mut events = RaceNarrative::new();
    if let Some(winner) = entries.first().filter(|e| e.grid_position == 1) {
        events.push(RaceEvent::PoleToWin {
            driver: winner.driver.clone(),
        });
    }
    if let Some(climber) = entries
        .iter()
        .filter(|e| e.position_change > 0)
        .max_by(|a, b| {
            a.position_change
                .cmp(&b.position_change)
                .then(b.position.cmp(&a.position))
        })
    {
        events.push(RaceEvent::BiggestClimber {
            driver: climber.driver.clone(),
            places: climber.position_change.unsigned_abs(),
        });
    }
    if let Some(faller) = entries
        .iter()
        .filter(|e| e.position_change < 0 && !e.incident)
        .min_by(|a, b| {
            a.position_change
                .cmp(&b.position_change)
                .then(a.position.cmp(&b.position))
        })
    {
        events.push(RaceEvent::BiggestFaller {
            driver: faller.driver.clone(),
            places: faller.position_change.unsigned_abs(),
        });
    }
    let overtakes: u32 = entries
        .iter()
        .filter(|e| e.position_change > 0)
        .map(|e| e.position_change.unsigned_abs())
        .sum();
    if overtakes > 0 {
        events.push(RaceEvent::Overtakes { count: overtakes });
    }
    for entry in entries.iter().filter(|e| e.incident) {
        events.push(RaceEvent::Incident {
            driver: entry.driver.clone(),
            grid_position: entry.grid_position,
            finish_position: entry.position,
        });
    }
    for entry in entries.iter().filter(|e| e.laps_down > 0) {
        events.push(RaceEvent::Lapped {
            driver: entry.driver.clone(),
            laps: entry.laps_down,
        });
    }
    events
}
