//! Price type with lenient spreadsheet parsing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount with two-decimal semantics.
///
/// Spreadsheet cells arrive as free text (`"€ 129,90"`, `"129.90"`, `"89€"`)
/// while the platform wants plain `"129.90"` strings; [`Price::parse_lenient`]
/// bridges the two. Amounts carry no currency code, the storefront runs a
/// single price list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::str")] Decimal);

impl Price {
    /// Wrap an amount, normalized to two decimal places.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        let mut normalized = amount;
        normalized.rescale(2);
        Self(normalized)
    }

    /// Best-effort parse of a spreadsheet price cell.
    ///
    /// Keeps digits, commas and dots; the separator kind appearing last is
    /// the decimal separator (when it occurs exactly once), the other kind
    /// marks thousands and is stripped. Unreadable input yields `None`.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        let mut cleaned: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
            .collect();

        let decimal_sep = match (cleaned.rfind(','), cleaned.rfind('.')) {
            (Some(comma), Some(dot)) => Some(if comma > dot { ',' } else { '.' }),
            (Some(_), None) => Some(','),
            (None, Some(_)) => Some('.'),
            (None, None) => None,
        };
        if let Some(sep) = decimal_sep {
            let thousands = if sep == ',' { '.' } else { ',' };
            cleaned.retain(|c| c != thousands);
            if cleaned.matches(sep).count() == 1 {
                cleaned = cleaned.replace(sep, ".");
            } else {
                // several occurrences: the whole string is thousands-marked
                cleaned.retain(|c| c != sep);
            }
        }

        cleaned.parse::<Decimal>().ok().map(Self::new)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
