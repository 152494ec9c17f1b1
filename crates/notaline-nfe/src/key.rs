//! Invoice keys and their extraction from raw gateway rows.

use std::fmt;
use std::str::FromStr;

use crate::source::Row;

/// Numeric key (NUNOTA) naming one invoice record in the remote system.
///
/// Equality and set membership are by numeric value, so `"00123"` and
/// `"123"` name the same invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotaKey(u64);

impl NotaKey {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NotaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NotaKey {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for NotaKey {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Digits of `raw` parsed as a key: `"NFe 00123-x"` → 123.
///
/// `None` when no digits remain or the digit string overflows; callers
/// log and drop such rows instead of treating them as key 0.
pub fn from_text(raw: &str) -> Option<NotaKey> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u64>().ok().map(NotaKey)
}

/// Key from the first cell of a query result row.
pub fn from_row(row: &Row) -> Option<NotaKey> {
    match row.first()? {
        serde_json::Value::Number(n) => n.as_u64().map(NotaKey),
        serde_json::Value::String(s) => from_text(s),
        _ => None,
    }
}

/// Key from a ledger line: the whole trimmed line must be digits.
///
/// Header rows and corrupt lines fall out here instead of being trusted.
pub fn from_numeric_line(line: &str) -> Option<NotaKey> {
    let line = line.trim();
    if line.is_empty() || !line.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    line.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_text_strips_non_digits() {
        assert_eq!(from_text("NFe 00123-x"), Some(NotaKey::new(123)));
        assert_eq!(from_text("456"), Some(NotaKey::new(456)));
    }

    #[test]
    fn from_text_without_digits() {
        assert_eq!(from_text(""), None);
        assert_eq!(from_text("no digits here"), None);
    }

    #[test]
    fn from_text_overflow_is_dropped() {
        // 44-digit access-key style value does not fit a numeric key
        let huge = "35200714200166000187550010000000046550000046";
        assert_eq!(from_text(huge), None);
    }

    #[test]
    fn from_row_number_cell() {
        let row: Row = vec![serde_json::Value::from(987u64)];
        assert_eq!(from_row(&row), Some(NotaKey::new(987)));
    }

    #[test]
    fn from_row_string_cell() {
        let row: Row = vec![serde_json::Value::from("NF 0042")];
        assert_eq!(from_row(&row), Some(NotaKey::new(42)));
    }

    #[test]
    fn from_row_rejects_other_cells() {
        assert_eq!(from_row(&vec![serde_json::Value::Null]), None);
        assert_eq!(from_row(&Vec::new()), None);
    }

    #[test]
    fn from_numeric_line_accepts_digits_only() {
        assert_eq!(from_numeric_line("123"), Some(NotaKey::new(123)));
        assert_eq!(from_numeric_line(" 42 "), Some(NotaKey::new(42)));
        assert_eq!(from_numeric_line("nunota"), None);
        assert_eq!(from_numeric_line("12a3"), None);
        assert_eq!(from_numeric_line(""), None);
    }

    #[test]
    fn display_roundtrip() {
        let key: NotaKey = "123".parse().unwrap();
        assert_eq!(format!("{key}"), "123");
    }
}
