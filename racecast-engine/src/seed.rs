//! Share codes: `<MODE>-<WORD><NN>`, e.g. `GP-APEX42` (chaos off) or `CX-APEX42` (chaos on).
//!
//! Each of the `WORD_LIST.len() * 100` codes names one slot, and each slot has
//! exactly one canonical seed. The mode only carries the chaos flag, so `GP-`
//! and `CX-` codes with the same word and number share a grid.
use sha2::{Digest, Sha256};

pub const WORD_LIST: [&str; 64] = [
    "APEX", "BOX", "CHICANE", "DRS", "EAU", "FLAG", "GRAVEL", "HAIRPIN", "INTER", "JUMP",
    "KERB", "LAP", "MEDIUM", "NOSE", "OUTLAP", "PADDOCK", "QUALI", "RADIO", "SLICK", "TOW",
    "UNDERCUT", "VISOR", "WING", "YELLOW", "ZONE", "ARMCO", "BRAKE", "COCKPIT", "DIFFUSER",
    "ENGINE", "FLOOR", "GRID", "HALO", "INLAP", "LOCKUP", "MARSHAL", "OVERCUT", "PITWALL",
    "PODIUM", "POLE", "RESTART", "SECTOR", "SLIPSTREAM", "SPIN", "STINT", "TELEMETRY", "TYRE",
    "VSC", "WET", "HARD", "SOFT", "PARC", "FERME", "DOWNFORCE", "GEARBOX", "SIDEPOD", "PURPLE",
    "FASTEST", "LIGHTS", "CHEQUER", "BLUE", "SAFETY", "TRACTION", "SPOILER",
];

const SUFFIXES: u16 = 100;

/// Number of distinct share codes per mode.
pub const CODE_SLOTS: u16 = WORD_LIST.len() as u16 * SUFFIXES;

const SLOT_MASK: u64 = 0xFFFF;

fn slot_of(seed: u64) -> u16 {
    u16::try_from((seed & SLOT_MASK) % u64::from(CODE_SLOTS)).unwrap_or(0)
}

fn seed_for_slot(slot: u16) -> u64 {
    let digest = Sha256::new()
        .chain_update(b"racecast/share-code")
        .chain_update(slot.to_le_bytes())
        .finalize();
    let mut high = [0_u8; 8];
    high.copy_from_slice(&digest[..8]);
    (u64::from_le_bytes(high) & !SLOT_MASK) | u64::from(slot)
}

/// The seed a share code of `seed` replays. Idempotent; canonical seeds map to themselves.
#[must_use]
pub fn canonical_seed(seed: u64) -> u64 {
    seed_for_slot(slot_of(seed))
}

/// Render a seed as a share code.
#[must_use]
pub fn encode_friendly(chaos: bool, seed: u64) -> String {
    let mode = if chaos { "CX" } else { "GP" };
    let slot = slot_of(seed);
    let word = WORD_LIST[usize::from(slot / SUFFIXES)];
    let nn = slot % SUFFIXES;
    format!("{mode}-{word}{nn:02}")
}

/// Parse a share code into its chaos flag and canonical seed.
///
/// Case-insensitive; anything that is not `<GP|CX>-<WORD><two digits>` is `None`.
#[must_use]
pub fn decode_to_seed(code: &str) -> Option<(bool, u64)> {
    let code = code.trim();
    if !code.is_ascii() {
        return None;
    }
    let (mode, rest) = code.split_once('-')?;
    let chaos = match mode.to_ascii_uppercase().as_str() {
        "CX" => true,
        "GP" => false,
        _ => return None,
    };
    let (word, digits) = rest.split_at(rest.len().checked_sub(2)?);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let nn: u16 = digits.parse().ok()?;
    let index = WORD_LIST
        .iter()
        .position(|w| w.eq_ignore_ascii_case(word))?;
    let slot = u16::try_from(index).ok()? * SUFFIXES + nn;
    Some((chaos, seed_for_slot(slot)))
}

/// Share code for a fresh random seed.
#[must_use]
pub fn generate_code_from_entropy(chaos: bool, entropy: u64) -> String {
    let slot = u16::try_from(entropy % u64::from(CODE_SLOTS)).unwrap_or(0);
    encode_friendly(chaos, seed_for_slot(slot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_replay_their_canonical_seed() {
        let seed = canonical_seed(0xDEAD_BEEF_CAFE_0A05);
        let code = encode_friendly(true, seed);
        assert_eq!(decode_to_seed(&code), Some((true, seed)));
        assert_eq!(canonical_seed(seed), seed);
    }

    #[test]
    fn gp_apex_42_stable() {
        let (chaos, seed) = decode_to_seed("GP-APEX42").unwrap();
        assert!(!chaos);
        assert_eq!(encode_friendly(false, seed), "GP-APEX42");
        assert_eq!(decode_to_seed("gp-apex42"), Some((false, seed)));
    }

    #[test]
    fn chaos_flag_does_not_change_the_seed() {
        let (calm_flag, calm) = decode_to_seed("GP-SLIPSTREAM07").unwrap();
        let (chaos_flag, wild) = decode_to_seed("CX-SLIPSTREAM07").unwrap();
        assert!(!calm_flag);
        assert!(chaos_flag);
        assert_eq!(calm, wild);
    }

    #[test]
    fn every_slot_has_its_own_code_and_seed() {
        let mut codes = HashSet::new();
        let mut seeds = HashSet::new();
        for slot in 0..CODE_SLOTS {
            let seed = seed_for_slot(slot);
            let code = encode_friendly(false, seed);
            assert_eq!(decode_to_seed(&code), Some((false, seed)), "{code}");
            codes.insert(code);
            seeds.insert(seed);
        }
        assert_eq!(codes.len(), usize::from(CODE_SLOTS));
        assert_eq!(seeds.len(), usize::from(CODE_SLOTS));
    }

    #[test]
    fn nearby_numeric_seeds_get_distinct_codes() {
        assert_ne!(encode_friendly(false, 100), encode_friendly(false, 300));
        assert_ne!(canonical_seed(100), canonical_seed(300));
        assert_eq!(canonical_seed(5), decode_to_seed(&encode_friendly(true, 5)).unwrap().1);
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(decode_to_seed("XX-APEX42").is_none());
        assert!(decode_to_seed("GP-BANANA42").is_none());
        assert!(decode_to_seed("GP-A").is_none());
        assert!(decode_to_seed("GP-4").is_none());
        assert!(decode_to_seed("GP-APEX+1").is_none());
        assert!(decode_to_seed("GP-Aé1").is_none());
        assert!(decode_to_seed("GP-APEXé").is_none());
    }

    #[test]
    fn entropy_codes_decode() {
        let code = generate_code_from_entropy(false, 0x1234_5678_9ABC);
        assert!(code.starts_with("GP-"));
        assert!(decode_to_seed(&code).is_some());
    }
}
