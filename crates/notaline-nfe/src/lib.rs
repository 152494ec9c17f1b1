//! Notaline NFe - incremental invoice XML collection
//!
//! Polls a gateway for electronic invoice keys, downloads each invoice's
//! XML payload with a bounded worker pool, and tracks observed and failed
//! keys in daily ledger files so repeated runs only do new work.
//!
//! # Example
//!
//! ```ignore
//! use notaline_nfe::{runner, RunConfig};
//!
//! let config = RunConfig::default();
//! let progress = notaline_core::ProgressContext::new();
//! let summary = runner::run(&sql, &source, &config, &progress)?;
//! println!("{} succeeded, {} failed", summary.succeeded, summary.failed);
//! ```

pub mod config;
pub mod date;
pub mod errors;
pub mod executor;
pub mod key;
pub mod ledger;
pub mod runner;
pub mod source;
pub mod xml;

// Re-exports
pub use config::RunConfig;
pub use date::RunDate;
pub use errors::ErrorLedger;
pub use executor::Outcome;
pub use key::NotaKey;
pub use ledger::Ledger;
pub use runner::{run, Summary};
pub use source::{FetchError, InvoiceSource, Row};
pub use xml::{pretty_print, ArtifactStore};
