//! Daily ledger of invoice keys already observed.
//!
//! One plain-text file per run date under the log directory: a header
//! line, then one key per line in observation order. Reads keep numeric
//! lines only, so the header and corrupt rows are skipped rather than
//! trusted. Appends are idempotent per date.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use rustc_hash::FxHashSet;

use crate::date::RunDate;
use crate::key::{self, NotaKey};

/// Header line written when a ledger file is created.
pub const LEDGER_HEADER: &str = "nunota";

/// Append-only record of keys observed per run date.
pub struct Ledger {
    dir: PathBuf,
}

impl Ledger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Ledger file for `date`.
    pub fn path_for(&self, date: RunDate) -> PathBuf {
        self.dir.join(format!("{date}.csv"))
    }

    /// Keys already recorded for `date`; empty when no ledger exists yet.
    pub fn load_known(&self, date: RunDate) -> io::Result<FxHashSet<NotaKey>> {
        let path = self.path_for(date);
        if !path.exists() {
            return Ok(FxHashSet::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(content.lines().filter_map(key::from_numeric_line).collect())
    }

    /// Record the keys not yet present for `date`, preserving input order.
    ///
    /// Returns how many were written. Single-writer: the runner calls this
    /// on its own thread after the worker pool has drained.
    pub fn append_new(&self, date: RunDate, keys: &[NotaKey]) -> io::Result<usize> {
        let mut known = self.load_known(date)?;
        let fresh: Vec<NotaKey> = keys.iter().copied().filter(|k| known.insert(*k)).collect();
        if fresh.is_empty() {
            return Ok(0);
        }

        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(date);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if file.metadata()?.len() == 0 {
            writeln!(file, "{LEDGER_HEADER}")?;
        }
        for key in &fresh {
            writeln!(file, "{key}")?;
        }
        log::debug!("recorded {} new key(s) in {}", fresh.len(), path.display());
        Ok(fresh.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date() -> RunDate {
        RunDate::new(chrono::NaiveDate::from_ymd_opt(2026, 8, 5).unwrap())
    }

    fn keys(values: &[u64]) -> Vec<NotaKey> {
        values.iter().copied().map(NotaKey::new).collect()
    }

    #[test]
    fn load_known_without_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::new(dir.path());
        assert!(ledger.load_known(date()).unwrap().is_empty());
    }

    #[test]
    fn append_then_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::new(dir.path());

        assert_eq!(ledger.append_new(date(), &keys(&[123, 456])).unwrap(), 2);

        let known = ledger.load_known(date()).unwrap();
        assert!(known.contains(&NotaKey::new(123)));
        assert!(known.contains(&NotaKey::new(456)));
        assert_eq!(known.len(), 2);
    }

    #[test]
    fn append_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::new(dir.path());

        ledger.append_new(date(), &keys(&[1, 2])).unwrap();
        assert_eq!(ledger.append_new(date(), &keys(&[1, 2])).unwrap(), 0);
        assert_eq!(ledger.append_new(date(), &keys(&[2, 3])).unwrap(), 1);

        let content = std::fs::read_to_string(ledger.path_for(date())).unwrap();
        assert_eq!(content, "nunota\n1\n2\n3\n");
    }

    #[test]
    fn duplicate_input_collapses() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::new(dir.path());

        assert_eq!(ledger.append_new(date(), &keys(&[7, 7, 7])).unwrap(), 1);
    }

    #[test]
    fn header_written_once() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::new(dir.path());

        ledger.append_new(date(), &keys(&[1])).unwrap();
        ledger.append_new(date(), &keys(&[2])).unwrap();

        let content = std::fs::read_to_string(ledger.path_for(date())).unwrap();
        assert_eq!(content.matches(LEDGER_HEADER).count(), 1);
    }

    #[test]
    fn load_skips_corrupt_lines() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::new(dir.path());
        std::fs::write(ledger.path_for(date()), "nunota\n123\noops\n456\n").unwrap();

        let known = ledger.load_known(date()).unwrap();
        assert_eq!(known.len(), 2);
        assert!(known.contains(&NotaKey::new(123)));
        assert!(known.contains(&NotaKey::new(456)));
    }

    #[test]
    fn dates_have_separate_files() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::new(dir.path());
        let other = RunDate::new(chrono::NaiveDate::from_ymd_opt(2026, 8, 6).unwrap());

        ledger.append_new(date(), &keys(&[1])).unwrap();
        assert!(ledger.load_known(other).unwrap().is_empty());
    }
}
