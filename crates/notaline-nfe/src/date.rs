//! Run-date stamping for ledger files.

use chrono::NaiveDate;

/// Calendar date a run is bookkept under, stamped `YYYYMMDD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunDate(NaiveDate);

impl RunDate {
    /// Today in local time.
    pub fn today() -> Self {
        Self(chrono::Local::now().date_naive())
    }

    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// `YYYYMMDD` stamp used in ledger and error file names.
    pub fn stamp(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }
}

impl std::fmt::Display for RunDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y%m%d"))
    }
}
