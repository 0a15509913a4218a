use anyhow::{Context, Result, bail};
use racecast_engine::{decode_to_seed, encode_friendly, generate_code_from_entropy};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Canonical seed plus the share code that replays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: String,
    pub chaos: bool,
}

impl SeedInfo {
    /// Parse a share code. The code's mode decides chaos.
    pub fn from_share_code(code: &str) -> Result<Self> {
        let Some((chaos, seed)) = decode_to_seed(code) else {
            bail!("Unrecognized share code: {code}");
        };
        Ok(Self {
            seed,
            code: encode_friendly(chaos, seed),
            chaos,
        })
    }

    /// Snap a numeric seed onto the share-code space so the printed code replays it.
    pub fn from_numeric(seed: u64, chaos: bool) -> Result<Self> {
        let code = encode_friendly(chaos, seed);
        let info = Self::from_share_code(&code)
            .with_context(|| format!("seed {seed} produced an unparseable code {code}"))?;
        if info.seed != seed {
            log::debug!("seed {seed} canonicalized to {} ({code})", info.seed);
        }
        Ok(info)
    }

    pub fn from_entropy(chaos: bool) -> Result<Self> {
        let entropy = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1337);
        Self::from_share_code(&generate_code_from_entropy(chaos, entropy))
    }
}

/// Resolve the `--seed` / `--code` / `--chaos` flags into one seed.
///
/// A share code wins over a numeric seed; with neither, a fresh code is drawn.
pub fn resolve_seed(seed: Option<u64>, code: Option<&str>, chaos: bool) -> Result<SeedInfo> {
    if let Some(code) = code {
        let info = SeedInfo::from_share_code(code)?;
        if chaos && !info.chaos {
            log::warn!("--chaos ignored: share code {} is a calm weekend", info.code);
        }
        return Ok(info);
    }
    if let Some(seed) = seed {
        return SeedInfo::from_numeric(seed, chaos);
    }
    let info = SeedInfo::from_entropy(chaos)?;
    log::info!("no seed given, drew {}", info.code);
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_codes_decide_chaos() {
        let calm = resolve_seed(None, Some("gp-apex42"), true).unwrap();
        assert!(!calm.chaos);
        assert_eq!(calm.code, "GP-APEX42");

        let wild = resolve_seed(Some(9), Some("CX-APEX42"), false).unwrap();
        assert!(wild.chaos);
        assert_eq!(wild.seed, calm.seed);
    }

    #[test]
    fn chaos_flag_leaves_numeric_seeds_alone() {
        let calm = resolve_seed(Some(5), None, false).unwrap();
        let wild = resolve_seed(Some(5), None, true).unwrap();
        assert_eq!(calm.seed, wild.seed);
        assert_eq!(calm.code[3..], wild.code[3..]);
    }

    #[test]
    fn distinct_numeric_seeds_keep_distinct_codes() {
        let low = resolve_seed(Some(100), None, false).unwrap();
        let high = resolve_seed(Some(300), None, false).unwrap();
        assert_ne!(low.code, high.code);
        assert_ne!(low.seed, high.seed);
    }

    #[test]
    fn numeric_seeds_replay_through_their_code() {
        let info = resolve_seed(Some(0xDEAD_BEEF), None, true).unwrap();
        let replay = resolve_seed(None, Some(&info.code), false).unwrap();
        assert_eq!(replay, info);
    }

    #[test]
    fn rejects_garbage_codes() {
        let err = resolve_seed(None, Some("PIT-STOP"), false).unwrap_err();
        assert!(err.to_string().contains("Unrecognized share code"));
    }

    #[test]
    fn entropy_seeds_carry_the_chaos_flag() {
        let info = resolve_seed(None, None, true).unwrap();
        assert!(info.chaos);
        assert!(info.code.starts_with("CX-"));
    }
}
