use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::mods::Mods;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    SH,
    S,
    A,
    B,
    C,
    D,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Grade::SH => "SH",
            Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        };
        f.write_str(label)
    }
}

/// Letter grade from a hit breakdown, using the ratio of 300s to all hits.
///
/// A play with no judgements at all has no grade and is rejected with
/// `Error::InvalidInput`.
pub fn get_grade(n300: u32, n100: u32, n50: u32, nmiss: u32, mods: Mods) -> Result<Grade> {
    let total = n300 as u64 + n100 as u64 + n50 as u64 + nmiss as u64;
    if total == 0 {
        return Err(Error::InvalidInput(
            "cannot grade a play with no hits".to_string(),
        ));
    }

    let total = total as f64;
    let n300_ratio = n300 as f64 / total;
    let n50_ratio = n50 as f64 / total;
    let no_miss = nmiss == 0;

    let grade = if n300_ratio > 0.9 {
        if no_miss && n50_ratio < 0.1 {
            if mods.intersects(Mods::SILVER_GRADE) {
                Grade::SH
            } else {
                Grade::S
            }
        } else {
            Grade::A
        }
    } else if n300_ratio > 0.8 {
        if no_miss {
            Grade::A
        } else {
            Grade::B
        }
    } else if n300_ratio > 0.7 {
        if no_miss {
            Grade::B
        } else {
            Grade::C
        }
    } else if n300_ratio > 0.6 {
        Grade::C
    } else {
        Grade::D
    };

    Ok(grade)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_ninety_percent_is_not_s() {
        assert_eq!(get_grade(90, 5, 5, 0, Mods::empty()).unwrap(), Grade::A);
    }

    #[test]
    fn test_silver_s_needs_hidden_or_flashlight() {
        assert_eq!(get_grade(95, 5, 0, 0, Mods::empty()).unwrap(), Grade::S);
        assert_eq!(get_grade(95, 5, 0, 0, Mods::HIDDEN).unwrap(), Grade::SH);
        assert_eq!(get_grade(95, 5, 0, 0, Mods::FLASHLIGHT).unwrap(), Grade::SH);
        assert_eq!(get_grade(95, 5, 0, 0, Mods::HARD_ROCK).unwrap(), Grade::S);
    }

    #[test]
    fn test_misses_drop_a_bracket() {
        assert_eq!(get_grade(95, 4, 0, 1, Mods::HIDDEN).unwrap(), Grade::A);
        assert_eq!(get_grade(85, 15, 0, 0, Mods::empty()).unwrap(), Grade::A);
        assert_eq!(get_grade(85, 14, 0, 1, Mods::empty()).unwrap(), Grade::B);
        assert_eq!(get_grade(75, 25, 0, 0, Mods::empty()).unwrap(), Grade::B);
        assert_eq!(get_grade(75, 24, 0, 1, Mods::empty()).unwrap(), Grade::C);
        assert_eq!(get_grade(65, 30, 0, 5, Mods::empty()).unwrap(), Grade::C);
        assert_eq!(get_grade(50, 50, 0, 0, Mods::empty()).unwrap(), Grade::D);
    }

    #[test]
    fn test_no_hits_is_an_error() {
        assert!(matches!(
            get_grade(0, 0, 0, 0, Mods::empty()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Grade::SH.to_string(), "SH");
        assert_eq!(Grade::D.to_string(), "D");
    }
}
