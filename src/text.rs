//! Whitespace trimming with selectable modes.

use serde::{Deserialize, Serialize};

// == Trim Mode ==
/// Which whitespace [`trim`] removes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrimMode {
    /// Every whitespace character, anywhere (code 1)
    #[default]
    All,
    /// Leading and trailing (code 2)
    Both,
    /// Leading only (code 3)
    Leading,
    /// Trailing only (code 4)
    Trailing,
}

impl TrimMode {
    /// Maps the numeric codes 1-4; anything else selects [`TrimMode::All`].
    pub fn from_code(code: u8) -> Self {
        match code {
            2 => TrimMode::Both,
            3 => TrimMode::Leading,
            4 => TrimMode::Trailing,
            _ => TrimMode::All,
        }
    }
}

/// Removes whitespace from `s` according to `mode`.
pub fn trim(s: &str, mode: TrimMode) -> String {
    match mode {
        TrimMode::All => s.chars().filter(|c| !c.is_whitespace()).collect(),
        TrimMode::Both => s.trim().to_string(),
        TrimMode::Leading => s.trim_start().to_string(),
        TrimMode::Trailing => s.trim_end().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = " \t a b\u{3000}c \n";

    #[test]
    fn test_trim_all() {
        assert_eq!(trim(SAMPLE, TrimMode::All), "abc");
    }

    #[test]
    fn test_trim_both() {
        assert_eq!(trim(SAMPLE, TrimMode::Both), "a b\u{3000}c");
    }

    #[test]
    fn test_trim_leading() {
        assert_eq!(trim(SAMPLE, TrimMode::Leading), "a b\u{3000}c \n");
    }

    #[test]
    fn test_trim_trailing() {
        assert_eq!(trim(SAMPLE, TrimMode::Trailing), " \t a b\u{3000}c");
    }

    #[test]
    fn test_mode_codes() {
        assert_eq!(TrimMode::from_code(1), TrimMode::All);
        assert_eq!(TrimMode::from_code(2), TrimMode::Both);
        assert_eq!(TrimMode::from_code(3), TrimMode::Leading);
        assert_eq!(TrimMode::from_code(4), TrimMode::Trailing);
        assert_eq!(TrimMode::from_code(0), TrimMode::All);
        assert_eq!(TrimMode::from_code(9), TrimMode::All);
        assert_eq!(TrimMode::default(), TrimMode::All);
    }

    #[test]
    fn test_trim_empty_and_blank() {
        assert_eq!(trim("", TrimMode::Both), "");
        assert_eq!(trim("   ", TrimMode::All), "");
    }
}
