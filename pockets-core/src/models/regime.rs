use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two mutually exclusive tax-bracket schemes.
///
/// Deductions only apply under [`Regime::Old`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Old,
    New,
}

impl Regime {
    pub fn all() -> &'static [Regime] {
        &[Regime::Old, Regime::New]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Old => "old",
            Self::New => "new",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "old" => Some(Self::Old),
            "new" => Some(Self::New),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Old => "Old Regime",
            Self::New => "New Regime",
        }
    }

    pub fn allows_deductions(&self) -> bool {
        matches!(self, Self::Old)
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(Regime::parse("old"), Some(Regime::Old));
        assert_eq!(Regime::parse(" NEW "), Some(Regime::New));
        assert_eq!(Regime::parse("legacy"), None);
    }

    #[test]
    fn as_str_matches_parse() {
        for regime in Regime::all() {
            assert_eq!(Regime::parse(regime.as_str()), Some(*regime));
        }
    }

    #[test]
    fn only_old_regime_allows_deductions() {
        assert!(Regime::Old.allows_deductions());
        assert!(!Regime::New.allows_deductions());
    }
}
