//! Score classification helpers. Pure integer-difference lookups, no state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Naming for a single-hole score relative to par.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreClass {
    Albatross,
    Eagle,
    Birdie,
    Par,
    Bogey,
    DoubleBogey,
    TripleOrWorse,
}

impl From<i32> for ScoreClass {
    /// `diff` is strokes minus par.
    fn from(diff: i32) -> Self {
        match diff {
            d if d <= -3 => Self::Albatross,
            -2 => Self::Eagle,
            -1 => Self::Birdie,
            0 => Self::Par,
            1 => Self::Bogey,
            2 => Self::DoubleBogey,
            _ => Self::TripleOrWorse,
        }
    }
}

impl ScoreClass {
    pub fn name(self) -> &'static str {
        match self {
            Self::Albatross => "albatross",
            Self::Eagle => "eagle",
            Self::Birdie => "birdie",
            Self::Par => "par",
            Self::Bogey => "bogey",
            Self::DoubleBogey => "double_bogey",
            Self::TripleOrWorse => "triple_or_worse",
        }
    }
}

impl fmt::Display for ScoreClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scoreboard-style to-par text: even is "E", otherwise a signed number.
pub fn format_to_par(diff: i32) -> String {
    match diff {
        0 => "E".to_string(),
        d if d > 0 => format!("+{}", d),
        d => d.to_string(),
    }
}
