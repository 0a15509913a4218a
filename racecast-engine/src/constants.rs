//! Tuning constants for qualifying and race scoring.

/// Neutral value for a missing specialization skill or a factor that does not apply.
pub const NEUTRAL_SKILL: f64 = 0.5;

// Qualifying
/// Maximum lap-time swing (s) for a driver with no skill or consistency.
pub const QUALI_SPREAD_SECONDS: f64 = 0.6;
/// Share of the spread every driver keeps regardless of skill.
pub const QUALI_SPREAD_FLOOR: f64 = 0.25;
/// Extra spread at maximum track difficulty.
pub const QUALI_DIFFICULTY_SPREAD: f64 = 0.5;
/// Extra spread at full wet intensity.
pub const QUALI_WET_SPREAD: f64 = 0.5;
/// Lap time gained (s) per unit of street skill above neutral on street circuits.
pub const STREET_SKILL_SECONDS: f64 = 0.8;
/// Lap-time inflation every driver suffers at full wet intensity, as a share of pace.
pub const WET_BASE_INFLATION: f64 = 0.04;
/// Additional inflation at full wet intensity for a driver with no rain mastery.
pub const WET_SKILL_INFLATION: f64 = 0.06;

// Race scoring
/// Weight of the grid slot inside the quali factor; the rest comes from quali skill.
pub const GRID_SLOT_SHARE: f64 = 0.7;
/// Share of the track factor taken over by consistency at maximum difficulty.
pub const DIFFICULTY_CONSISTENCY_SHARE: f64 = 0.3;
/// Track factor bonus per unit of overtaking skill above neutral on an easy-passing track.
pub const OVERTAKING_BONUS: f64 = 0.2;
/// Race-day variance scale.
pub const RACE_VARIANCE: f64 = 0.06;
/// Consistency offset for the race-day variance term.
pub const RACE_VARIANCE_OFFSET: f64 = 1.25;
/// Per-driver variance added in chaos mode.
pub const CHAOS_VARIANCE: f64 = 0.35;
/// Chance of one severe incident per chaos pass.
pub const INCIDENT_PROBABILITY: f64 = 0.35;
/// Score penalty for the incident victim.
pub const INCIDENT_PENALTY: f64 = 1.5;
/// Grid slots shielded from incidents.
pub const INCIDENT_PROTECTED_SLOTS: usize = 3;
/// Seconds of gap per point of score difference.
pub const GAP_SECONDS_PER_POINT: f64 = 40.0;

// Confidence
/// Confidence lost at full wet intensity.
pub const WET_CONFIDENCE_PENALTY: f64 = 12.0;
/// Confidence lost in chaos mode.
pub const CHAOS_CONFIDENCE_PENALTY: f64 = 15.0;
/// Lower bound of the high confidence bucket.
pub const CONFIDENCE_HIGH: u8 = 80;
/// Lower bound of the medium confidence bucket.
pub const CONFIDENCE_MEDIUM: u8 = 60;
