//! Performance point calculation over rosu-pp.
//!
//! Scores reach us in two shapes: our own submitted scores and scores pulled
//! from the osu! v1 API (string-encoded counts under different names). Both
//! are read through [`ScoreHits`].

use rosu_pp::any::DifficultyAttributes;
use rosu_pp::{Beatmap, Difficulty, Performance};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::mods::Mods;

/// Canonical accessors for a play's judgement breakdown.
pub trait ScoreHits {
    fn n300(&self) -> u32;
    fn n100(&self) -> u32;
    fn n50(&self) -> u32;
    fn nmiss(&self) -> u32;
    /// `None` when the combo is unknown; the calculator then assumes a full combo.
    fn max_combo(&self) -> Option<u32>;
    fn mods(&self) -> Mods;

    fn total_hits(&self) -> u64 {
        self.n300() as u64 + self.n100() as u64 + self.n50() as u64 + self.nmiss() as u64
    }

    /// osu!standard accuracy in percent; 0 when nothing was hit.
    fn accuracy(&self) -> f64 {
        let total = self.total_hits();
        if total == 0 {
            return 0.0;
        }
        let weighted = 300 * self.n300() as u64 + 100 * self.n100() as u64 + 50 * self.n50() as u64;
        weighted as f64 / (300 * total) as f64 * 100.0
    }
}

/// A score submitted to this server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalScore {
    pub n300: u32,
    pub n100: u32,
    pub n50: u32,
    pub nmiss: u32,
    #[serde(default)]
    pub max_combo: Option<u32>,
    pub mods: u32,
}

impl ScoreHits for LocalScore {
    fn n300(&self) -> u32 {
        self.n300
    }
    fn n100(&self) -> u32 {
        self.n100
    }
    fn n50(&self) -> u32 {
        self.n50
    }
    fn nmiss(&self) -> u32 {
        self.nmiss
    }
    fn max_combo(&self) -> Option<u32> {
        self.max_combo
    }
    fn mods(&self) -> Mods {
        Mods::from_bits_retain(self.mods)
    }
}

/// A score as returned by the osu! v1 API, where every number is a string.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BanchoScore {
    #[serde(deserialize_with = "from_str_number")]
    pub count300: u32,
    #[serde(deserialize_with = "from_str_number")]
    pub count100: u32,
    #[serde(deserialize_with = "from_str_number")]
    pub count50: u32,
    #[serde(deserialize_with = "from_str_number")]
    pub countmiss: u32,
    #[serde(deserialize_with = "from_str_number")]
    pub maxcombo: u32,
    #[serde(deserialize_with = "from_str_number")]
    pub enabled_mods: u32,
}

impl ScoreHits for BanchoScore {
    fn n300(&self) -> u32 {
        self.count300
    }
    fn n100(&self) -> u32 {
        self.count100
    }
    fn n50(&self) -> u32 {
        self.count50
    }
    fn nmiss(&self) -> u32 {
        self.countmiss
    }
    fn max_combo(&self) -> Option<u32> {
        Some(self.maxcombo)
    }
    fn mods(&self) -> Mods {
        Mods::from_bits_retain(self.enabled_mods)
    }
}

fn from_str_number<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: std::fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Str(String),
        Num(T),
    }

    match Raw::<T>::deserialize(deserializer)? {
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Raw::Num(n) => Ok(n),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PpResult {
    pub pp: f64,
    /// Percent, 0..=100.
    pub accuracy: f64,
}

pub fn load_beatmap(path: &Path) -> Result<Beatmap> {
    Beatmap::from_path(path)
        .map_err(|e| Error::Beatmap(format!("{}: {}", path.display(), e)))
}

/// Difficulty attributes for `map` under `mods`. Worth computing once when
/// many scores on the same map and mods are evaluated.
pub fn difficulty(map: &Beatmap, mods: Mods) -> DifficultyAttributes {
    Difficulty::new().mods(mods.bits()).calculate(map)
}

/// pp and accuracy for `score` on `map`. Pass precomputed `difficulty`
/// attributes to skip the star calculation.
pub fn calculate<S: ScoreHits + ?Sized>(
    score: &S,
    map: &Beatmap,
    difficulty_attrs: Option<&DifficultyAttributes>,
) -> PpResult {
    let mods = score.mods().bits();
    let attrs = match difficulty_attrs {
        Some(attrs) => attrs.clone(),
        None => difficulty(map, score.mods()),
    };

    let mut performance = Performance::new(attrs)
        .mods(mods)
        .n300(score.n300())
        .n100(score.n100())
        .n50(score.n50())
        .misses(score.nmiss());
    if let Some(combo) = score.max_combo() {
        performance = performance.combo(combo);
    }
    let pp = performance.calculate().pp();

    PpResult {
        pp,
        accuracy: score.accuracy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bancho_score_reads_string_counts() {
        let raw = r#"{
            "count300": "500", "count100": "12", "count50": "0",
            "countmiss": "1", "maxcombo": "812", "enabled_mods": "72",
            "score": "1234567"
        }"#;
        let score: BanchoScore = serde_json::from_str(raw).unwrap();

        assert_eq!(score.n300(), 500);
        assert_eq!(score.nmiss(), 1);
        assert_eq!(score.max_combo(), Some(812));
        assert_eq!(score.mods(), Mods::HIDDEN | Mods::DOUBLE_TIME);
    }

    #[test]
    fn test_both_shapes_agree_on_accuracy() {
        let local = LocalScore {
            n300: 90,
            n100: 5,
            n50: 5,
            nmiss: 0,
            max_combo: Some(100),
            mods: 0,
        };
        let bancho = BanchoScore {
            count300: 90,
            count100: 5,
            count50: 5,
            countmiss: 0,
            maxcombo: 100,
            enabled_mods: 0,
        };

        // (27000 + 500 + 250) / 30000
        assert!((local.accuracy() - 92.5).abs() < 1e-9);
        assert_eq!(local.accuracy(), bancho.accuracy());
        assert_eq!(LocalScore::default().accuracy(), 0.0);
    }

    #[test]
    fn test_huge_hit_counts_do_not_overflow() {
        let score = LocalScore {
            n300: u32::MAX,
            n100: 1,
            ..Default::default()
        };

        assert_eq!(score.total_hits(), u32::MAX as u64 + 1);
        let accuracy = score.accuracy();
        assert!(accuracy > 99.99 && accuracy < 100.0, "got {}", accuracy);

        let bancho: BanchoScore = serde_json::from_str(
            r#"{"count300": "4294967295", "count100": "4294967295", "count50": "4294967295",
                "countmiss": "4294967295", "maxcombo": "1", "enabled_mods": "0"}"#,
        )
        .unwrap();
        assert_eq!(bancho.total_hits(), 4 * u32::MAX as u64);
    }

    #[test]
    fn test_local_score_combo_is_optional() {
        let score: LocalScore =
            serde_json::from_str(r#"{"n300": 10, "n100": 0, "n50": 0, "nmiss": 0, "mods": 0}"#)
                .unwrap();
        assert_eq!(score.max_combo(), None);
    }

    #[test]
    fn test_missing_beatmap_is_an_error() {
        let result = load_beatmap(Path::new("does/not/exist.osu"));
        assert!(matches!(result, Err(Error::Beatmap(_))));
    }
}
