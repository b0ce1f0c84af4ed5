use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

bitflags! {
    /// osu! gameplay modifiers as sent by the client.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Mods: u32 {
        const NO_FAIL      = 1 << 0;
        const EASY         = 1 << 1;
        const TOUCH_DEVICE = 1 << 2;
        const HIDDEN       = 1 << 3;
        const HARD_ROCK    = 1 << 4;
        const SUDDEN_DEATH = 1 << 5;
        const DOUBLE_TIME  = 1 << 6;
        const RELAX        = 1 << 7;
        const HALF_TIME    = 1 << 8;
        const NIGHTCORE    = 1 << 9; // only ever set together with DOUBLE_TIME
        const FLASHLIGHT   = 1 << 10;
        const AUTOPLAY     = 1 << 11;
        const SPUN_OUT     = 1 << 12;
        const AUTOPILOT    = 1 << 13;
        const PERFECT      = 1 << 14;
        const FADE_IN      = 1 << 20;
        const SCORE_V2     = 1 << 29;

        // keep bits we have no name for
        const _ = !0;
    }
}

const ACRONYMS: &[(&str, Mods)] = &[
    ("NF", Mods::NO_FAIL),
    ("EZ", Mods::EASY),
    ("TD", Mods::TOUCH_DEVICE),
    ("HD", Mods::HIDDEN),
    ("HR", Mods::HARD_ROCK),
    ("SD", Mods::SUDDEN_DEATH),
    ("DT", Mods::DOUBLE_TIME),
    ("RX", Mods::RELAX),
    ("HT", Mods::HALF_TIME),
    ("NC", Mods::NIGHTCORE),
    ("FL", Mods::FLASHLIGHT),
    ("AT", Mods::AUTOPLAY),
    ("SO", Mods::SPUN_OUT),
    ("AP", Mods::AUTOPILOT),
    ("PF", Mods::PERFECT),
    ("FI", Mods::FADE_IN),
    ("V2", Mods::SCORE_V2),
];

impl Mods {
    /// Mods whose scores never count towards the regular pp total.
    pub const UNRANKED_PP: Mods = Mods::RELAX.union(Mods::AUTOPILOT);

    /// Hidden or Flashlight, the mods that turn an S into a silver S.
    pub const SILVER_GRADE: Mods = Mods::HIDDEN.union(Mods::FLASHLIGHT);
}

impl FromStr for Mods {
    type Err = Error;

    /// Accepts either the raw bitmask (`"72"`) or concatenated acronyms (`"HDDT"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(bits) = s.parse::<u32>() {
            return Ok(Mods::from_bits_retain(bits));
        }

        let upper = s.to_uppercase();
        let upper = upper.trim_start_matches('+');
        if upper.len() % 2 != 0 {
            return Err(Error::InvalidInput(format!("malformed mod string '{}'", s)));
        }

        let mut mods = Mods::empty();
        for i in (0..upper.len()).step_by(2) {
            let acronym = &upper[i..i + 2];
            let found = ACRONYMS
                .iter()
                .find(|(name, _)| *name == acronym)
                .map(|(_, m)| *m)
                .ok_or_else(|| Error::InvalidInput(format!("unknown mod '{}'", acronym)))?;
            mods |= found;
            // NC and PF imply their base mods on the wire
            if found == Mods::NIGHTCORE {
                mods |= Mods::DOUBLE_TIME;
            } else if found == Mods::PERFECT {
                mods |= Mods::SUDDEN_DEATH;
            }
        }

        Ok(mods)
    }
}

impl fmt::Display for Mods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "NM");
        }

        for (acronym, m) in ACRONYMS {
            if !self.contains(*m) {
                continue;
            }
            if *m == Mods::DOUBLE_TIME && self.contains(Mods::NIGHTCORE) {
                continue;
            }
            if *m == Mods::SUDDEN_DEATH && self.contains(Mods::PERFECT) {
                continue;
            }
            write!(f, "{}", acronym)?;
        }
        Ok(())
    }
}
