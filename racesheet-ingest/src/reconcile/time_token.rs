//! Race-time token normalization
//!
//! Times are stored as the integer formed by concatenating every digit of the
//! token (`"1:13,995"` → `113995`). This is a sortable key, not a duration:
//! times are only ever compared, never added, and only tokens of the same
//! shape are compared against each other. The rule is part of the sheet
//! format and must not change.

use once_cell::sync::Lazy;
use regex::Regex;

static LAP_DEFICIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d+)\s*(runden?|laps?)$").expect("static regex"));

/// Parsed time token; at most one field is set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParsedTime {
    /// Digit-concatenated race time or delta
    pub race_time: Option<u64>,
    /// Laps behind the leader
    pub laps: Option<u32>,
}

impl ParsedTime {
    pub fn is_lap_deficit(&self) -> bool {
        self.laps.is_some()
    }
}

/// Parse a raw time token.
///
/// - empty, `DNF`, or separator-only (`--:--,---`) → nothing
/// - `"<n> Runden"` / `"<n> Laps"` → lap deficit
/// - anything else → digits concatenated, if any
pub fn parse_time(raw: &str) -> ParsedTime {
    let token = raw.trim();
    if token.is_empty() || token.eq_ignore_ascii_case("dnf") || is_separator_only(token) {
        return ParsedTime::default();
    }

    if let Some(caps) = LAP_DEFICIT.captures(token) {
        return ParsedTime {
            race_time: None,
            laps: caps[1].parse().ok(),
        };
    }

    ParsedTime {
        race_time: digits_value(token),
        laps: None,
    }
}

/// Digit-concatenation of any token, ignoring lap-deficit phrases.
///
/// Used for best-lap tokens and for values read back from the sheet.
pub fn digits_value(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    // Leading zeros are dropped by the integer parse; overlong tokens are not times
    digits.parse().ok()
}

fn is_separator_only(token: &str) -> bool {
    token.chars().all(|c| matches!(c, '-' | ':' | ',' | '.'))
}
