//! Bounded-parallel download of invoice XMLs.

use std::sync::Mutex;

use anyhow::{Context, Result};
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use notaline_core::ProgressContext;

use crate::key::NotaKey;
use crate::source::InvoiceSource;
use crate::xml::{pretty_print, ArtifactStore};

/// Partition of the work set after execution.
#[derive(Debug, Default)]
pub struct Outcome {
    pub succeeded: FxHashSet<NotaKey>,
    pub failed: FxHashSet<NotaKey>,
}

/// Download every key over a pool of `workers` threads.
///
/// Each task fetches, validates, pretty-prints and persists one invoice.
/// Task errors become per-key failures and never abort sibling tasks;
/// results are collected in completion order.
pub fn download_all(
    keys: &[NotaKey],
    source: &dyn InvoiceSource,
    store: &ArtifactStore,
    workers: usize,
    progress: &ProgressContext,
) -> Result<Outcome> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .context("failed to create worker pool")?;

    log::info!(
        "downloading {} invoice(s) with {} worker(s)",
        keys.len(),
        workers.max(1)
    );
    let pb = progress.download_bar(keys.len() as u64);

    let succeeded = Mutex::new(FxHashSet::default());
    let failed = Mutex::new(FxHashSet::default());

    pool.install(|| {
        keys.par_iter().for_each(|&key| {
            match download_one(key, source, store) {
                Ok(()) => {
                    succeeded.lock().expect("result set poisoned").insert(key);
                }
                Err(e) => {
                    log::error!("nota {key}: {e:#}");
                    failed.lock().expect("result set poisoned").insert(key);
                }
            }
            pb.inc(1);
        });
    });

    pb.finish_and_clear();
    Ok(Outcome {
        succeeded: succeeded.into_inner().expect("result set poisoned"),
        failed: failed.into_inner().expect("result set poisoned"),
    })
}

/// Fetch, validate, pretty-print, persist one invoice.
///
/// An artifact already on disk counts as success without a fetch.
fn download_one(key: NotaKey, source: &dyn InvoiceSource, store: &ArtifactStore) -> Result<()> {
    if store.contains(key) {
        log::debug!("artifact already present for nota {key}");
        return Ok(());
    }
    let raw = source.invoice_xml(key)?;
    let pretty = pretty_print(&raw).context("invalid XML payload")?;
    store.write(key, &pretty).context("failed to write artifact")?;
    log::debug!("saved artifact for nota {key}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    use crate::source::{FetchError, Row};

    struct MapSource {
        payloads: HashMap<u64, String>,
        fetches: AtomicUsize,
    }

    impl MapSource {
        fn new(payloads: &[(u64, &str)]) -> Self {
            Self {
                payloads: payloads
                    .iter()
                    .map(|(k, v)| (*k, v.to_string()))
                    .collect(),
                fetches: AtomicUsize::new(0),
            }
        }
    }

    impl InvoiceSource for MapSource {
        fn discover(&self, _sql: &str) -> anyhow::Result<Option<Vec<Row>>> {
            Ok(Some(Vec::new()))
        }

        fn invoice_xml(&self, key: NotaKey) -> Result<String, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.payloads
                .get(&key.value())
                .cloned()
                .ok_or(FetchError::Missing)
        }
    }

    fn keys(values: &[u64]) -> Vec<NotaKey> {
        values.iter().copied().map(NotaKey::new).collect()
    }

    #[test]
    fn partitions_success_and_failure() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let source = MapSource::new(&[(1, "<a>1</a>"), (3, "<a>3</a>")]);
        let progress = ProgressContext::new();

        let outcome =
            download_all(&keys(&[1, 2, 3]), &source, &store, 4, &progress).unwrap();

        assert!(outcome.succeeded.contains(&NotaKey::new(1)));
        assert!(outcome.succeeded.contains(&NotaKey::new(3)));
        assert_eq!(outcome.failed.len(), 1);
        assert!(outcome.failed.contains(&NotaKey::new(2)));

        assert!(store.contains(NotaKey::new(1)));
        assert!(store.contains(NotaKey::new(3)));
        assert!(!store.contains(NotaKey::new(2)));
    }

    #[test]
    fn one_failure_does_not_abort_siblings() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        // key 2 yields a payload that is not XML at all
        let source = MapSource::new(&[(1, "<a/>"), (2, "oops"), (3, "<b/>")]);
        let progress = ProgressContext::new();

        let outcome =
            download_all(&keys(&[1, 2, 3]), &source, &store, 2, &progress).unwrap();

        assert_eq!(outcome.succeeded.len(), 2);
        assert_eq!(outcome.failed.len(), 1);
    }

    #[test]
    fn existing_artifact_skips_fetch() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.write(NotaKey::new(5), "<cached/>\n").unwrap();
        let source = MapSource::new(&[]);
        let progress = ProgressContext::new();

        let outcome = download_all(&keys(&[5]), &source, &store, 1, &progress).unwrap();

        assert!(outcome.succeeded.contains(&NotaKey::new(5)));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(
            std::fs::read_to_string(store.path_for(NotaKey::new(5))).unwrap(),
            "<cached/>\n"
        );
    }

    #[test]
    fn empty_work_set_is_empty_outcome() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let source = MapSource::new(&[]);
        let progress = ProgressContext::new();

        let outcome = download_all(&[], &source, &store, 3, &progress).unwrap();

        assert!(outcome.succeeded.is_empty());
        assert!(outcome.failed.is_empty());
    }

    #[test]
    fn zero_workers_clamps_to_one() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let source = MapSource::new(&[(1, "<a/>")]);
        let progress = ProgressContext::new();

        let outcome = download_all(&keys(&[1]), &source, &store, 0, &progress).unwrap();
        assert_eq!(outcome.succeeded.len(), 1);
    }
}
