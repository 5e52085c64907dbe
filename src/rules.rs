//! Rule-set identifiers.
//!
//! Rule sets only change how a finished board is counted: area rules count
//! stones plus surrounded points, territory rules count surrounded points plus
//! prisoners. Move legality is the same everywhere.

use std::fmt;
use std::str::FromStr;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rules {
    #[default]
    Chinese,
    Japanese,
    Aga,
    NewZealand,
    SimplifiedIng,
}

/// Alternative spellings found in game records, mapped to canonical names.
/// Keys are compared after lowercasing and trimming.
const ALIASES: &[(&str, &str)] = &[
    ("nz", "new_zealand"),
    ("newzealand", "new_zealand"),
    ("new zealand", "new_zealand"),
    ("jp", "japanese"),
    ("jpn", "japanese"),
    ("cn", "chinese"),
    ("chn", "chinese"),
    ("us", "aga"),
    ("ing", "simplified_ing"),
    ("goe", "simplified_ing"),
];

impl Rules {
    pub fn name(self) -> &'static str {
        match self {
            Rules::Chinese => "chinese",
            Rules::Japanese => "japanese",
            Rules::Aga => "aga",
            Rules::NewZealand => "new_zealand",
            Rules::SimplifiedIng => "simplified_ing",
        }
    }

    /// Whether finished games are counted by area (stones + territory).
    pub fn area_scoring(self) -> bool {
        !matches!(self, Rules::Japanese)
    }
}

/// Expand known aliases to canonical rule-set names; other names pass through lowercased.
pub fn normalize(name: &str) -> String {
    let key = name.trim().to_ascii_lowercase();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, full)| (*full).to_string())
        .unwrap_or(key)
}

impl FromStr for Rules {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "chinese" => Ok(Rules::Chinese),
            "japanese" => Ok(Rules::Japanese),
            "aga" => Ok(Rules::Aga),
            "new_zealand" => Ok(Rules::NewZealand),
            "simplified_ing" => Ok(Rules::SimplifiedIng),
            _ => Err(format!("unknown rule set: {s}")),
        }
    }
}

impl fmt::Display for Rules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
