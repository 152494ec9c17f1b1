//! Run orchestration: discover, reconcile against the ledgers, download,
//! settle the bookkeeping, report.
//!
//! A run moves linearly through collect → reconcile → execute → report.
//! All ledger mutation happens here on the calling thread, after the
//! worker pool has fully drained, so the file formats need no locking.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rustc_hash::FxHashSet;

use notaline_core::ProgressContext;

use crate::config::RunConfig;
use crate::date::RunDate;
use crate::errors::ErrorLedger;
use crate::executor;
use crate::key::{self, NotaKey};
use crate::ledger::Ledger;
use crate::source::InvoiceSource;
use crate::xml::ArtifactStore;

/// Final tallies for one run.
#[derive(Debug)]
pub struct Summary {
    /// Size of the work set handed to the executor.
    pub attempted: usize,
    /// Keys newly observed by the discovery query.
    pub discovered: usize,
    /// Keys picked up from the error backlog.
    pub retried: usize,
    /// Backlog keys that succeeded this run.
    pub recovered: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl Summary {
    fn empty(elapsed: Duration) -> Self {
        Self {
            attempted: 0,
            discovered: 0,
            retried: 0,
            recovered: 0,
            succeeded: 0,
            failed: 0,
            elapsed,
        }
    }

    /// Whether the run had nothing to process.
    pub fn is_empty(&self) -> bool {
        self.attempted == 0
    }

    /// Log the final report.
    pub fn log(&self) {
        if self.is_empty() {
            log::info!("no new electronic invoices to process");
            return;
        }
        log::info!("=== XML download summary ===");
        log::info!("Attempted: {}", self.attempted);
        log::info!("New from query: {}", self.discovered);
        log::info!(
            "Retried from backlog: {} ({} recovered)",
            self.retried,
            self.recovered
        );
        log::info!("Succeeded: {}", self.succeeded);
        log::info!("Failed: {}", self.failed);
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());
    }

    /// Markdown body for the notification sink.
    pub fn notification_text(&self) -> String {
        if self.is_empty() {
            return "🧾 *No new electronic invoices to process.*".to_string();
        }
        format!(
            "*📄 XML download report:*\n\
             • *Attempted:* `{}`\n\
             • *New from query:* `{}`\n\
             • *Retried:* `{}`\n\
             • *Recovered:* `{}`\n\
             • *Succeeded:* `{}`\n\
             • *Failed:* `{}`",
            self.attempted,
            self.discovered,
            self.retried,
            self.recovered,
            self.succeeded,
            self.failed
        )
    }
}

/// Execute one full run bookkept under today's date.
pub fn run(
    query_sql: &str,
    source: &dyn InvoiceSource,
    config: &RunConfig,
    progress: &ProgressContext,
) -> Result<Summary> {
    run_for_date(query_sql, source, config, progress, RunDate::today())
}

/// Same as [`run`] with an explicit bookkeeping date.
pub fn run_for_date(
    query_sql: &str,
    source: &dyn InvoiceSource,
    config: &RunConfig,
    progress: &ProgressContext,
    date: RunDate,
) -> Result<Summary> {
    let start = Instant::now();
    let ledger = Ledger::new(&config.log_dir);
    let error_ledger = ErrorLedger::new(&config.log_dir);
    let store = ArtifactStore::new(&config.xml_dir);

    // Discovery, filtered against the keys already on the ledger.
    let stage = progress.stage_line("discover");
    let rows = source.discover(query_sql).context("discovery query failed")?;
    let rows = rows.unwrap_or_else(|| {
        log::warn!("discovery query gave no result; continuing with the retry backlog only");
        Vec::new()
    });

    let known = ledger.load_known(date).context("cannot read ledger")?;
    let mut seen = known.clone();
    let mut discovered: Vec<NotaKey> = Vec::new();
    for row in &rows {
        match key::from_row(row) {
            Some(k) => {
                if seen.insert(k) {
                    discovered.push(k);
                }
            }
            None => log::warn!("discarding row without a numeric key: {row:?}"),
        }
    }
    log::info!("{} row(s) from query, {} new", rows.len(), discovered.len());

    // Error backlog, provenance kept for the rewrite after execution.
    let backlog = error_ledger.load_all();
    let mut retries: FxHashSet<NotaKey> = FxHashSet::default();
    for (_, parked) in &backlog {
        retries.extend(parked.iter().copied());
    }
    if !retries.is_empty() {
        log::info!(
            "{} key(s) to retry from {} error file(s)",
            retries.len(),
            backlog.len()
        );
    }
    stage.finish_and_clear();

    // Work set: discovered first, then the backlog minus overlaps.
    let discovered_set: FxHashSet<NotaKey> = discovered.iter().copied().collect();
    let mut work = discovered.clone();
    work.extend(retries.iter().copied().filter(|k| !discovered_set.contains(k)));

    if work.is_empty() {
        let summary = Summary::empty(start.elapsed());
        summary.log();
        return Ok(summary);
    }

    let outcome = executor::download_all(&work, source, &store, config.workers, progress)?;

    // Settle the ledgers; single writer, pool fully drained.
    let recovered: FxHashSet<NotaKey> =
        outcome.succeeded.intersection(&retries).copied().collect();
    for (path, parked) in &backlog {
        let hits: FxHashSet<NotaKey> = parked.intersection(&recovered).copied().collect();
        if hits.is_empty() {
            continue;
        }
        if let Err(e) = error_ledger.remove(path, &hits) {
            log::error!("cannot rewrite error file {}: {e}", path.display());
        }
    }

    // A key observed by the query is recorded whether or not its download
    // succeeded; failures ride the error ledger for the next run.
    ledger
        .append_new(date, &discovered)
        .context("cannot append to ledger")?;

    let failed: Vec<NotaKey> = work
        .iter()
        .copied()
        .filter(|k| outcome.failed.contains(k))
        .collect();
    error_ledger
        .record(date, &failed)
        .context("cannot record error file")?;

    let summary = Summary {
        attempted: work.len(),
        discovered: discovered.len(),
        retried: retries.len(),
        recovered: recovered.len(),
        succeeded: outcome.succeeded.len(),
        failed: outcome.failed.len(),
        elapsed: start.elapsed(),
    };
    summary.log();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_summary() {
        let summary = Summary::empty(Duration::from_secs(1));
        assert!(summary.is_empty());
        assert!(summary.notification_text().contains("No new"));
    }

    #[test]
    fn notification_text_carries_counts() {
        let summary = Summary {
            attempted: 5,
            discovered: 3,
            retried: 2,
            recovered: 1,
            succeeded: 4,
            failed: 1,
            elapsed: Duration::from_secs(2),
        };
        let text = summary.notification_text();
        assert!(text.contains("*Attempted:* `5`"));
        assert!(text.contains("*New from query:* `3`"));
        assert!(text.contains("*Recovered:* `1`"));
        assert!(text.contains("*Failed:* `1`"));
    }
}
