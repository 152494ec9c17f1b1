//! Failed-download ledger.
//!
//! One `errors_<date>.csv` per run date that produced failures; rows are
//! bare keys. Reads accept numeric rows only, so header rows and corrupt
//! lines in historical files are ignored. Rewrites go through a tmp file
//! and rename so a crash cannot truncate a ledger.

use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::date::RunDate;
use crate::key::{self, NotaKey};

/// Record of keys whose last download attempt failed.
pub struct ErrorLedger {
    dir: PathBuf,
}

impl ErrorLedger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Error file for `date`.
    pub fn path_for(&self, date: RunDate) -> PathBuf {
        self.dir.join(format!("errors_{date}.csv"))
    }

    /// Keys parked in every historical error file, with provenance.
    ///
    /// Unreadable files are logged and skipped; a bad file must not stop
    /// the run.
    pub fn load_all(&self) -> Vec<(PathBuf, FxHashSet<NotaKey>)> {
        let pattern = self.dir.join("errors_*.csv");
        let pattern = pattern.to_string_lossy();

        let mut files = Vec::new();
        for entry in glob::glob(&pattern).expect("invalid error ledger glob") {
            let path = match entry {
                Ok(p) => p,
                Err(_) => continue,
            };
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    let parked: FxHashSet<NotaKey> =
                        content.lines().filter_map(key::from_numeric_line).collect();
                    log::debug!("{}: {} key(s) to retry", path.display(), parked.len());
                    files.push((path, parked));
                }
                Err(e) => log::error!("cannot read error file {}: {e}", path.display()),
            }
        }
        files
    }

    /// Overwrite `date`'s file with exactly this run's failures.
    ///
    /// No-op when `failed` is empty; clearing recovered keys out of older
    /// files is [`ErrorLedger::remove`]'s job.
    pub fn record(&self, date: RunDate, failed: &[NotaKey]) -> io::Result<()> {
        if failed.is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(date);
        let rows: Vec<String> = failed.iter().map(NotaKey::to_string).collect();
        write_rows(&path, &rows)?;
        log::warn!(
            "{} invoice(s) failed, recorded in {}",
            failed.len(),
            path.display()
        );
        Ok(())
    }

    /// Drop `recovered` keys from `file`, keeping the other numeric rows.
    pub fn remove(&self, file: &Path, recovered: &FxHashSet<NotaKey>) -> io::Result<()> {
        if recovered.is_empty() {
            return Ok(());
        }
        let content = std::fs::read_to_string(file)?;
        let remaining: Vec<String> = content
            .lines()
            .filter_map(key::from_numeric_line)
            .filter(|k| !recovered.contains(k))
            .map(|k| k.to_string())
            .collect();
        log::debug!(
            "removing {} recovered key(s) from {}",
            recovered.len(),
            file.display()
        );
        write_rows(file, &remaining)
    }
}

/// Write one row per line through a tmp file and atomic rename.
fn write_rows(path: &Path, rows: &[String]) -> io::Result<()> {
    let tmp = path.with_extension("csv.tmp");
    let mut content = rows.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)
}
