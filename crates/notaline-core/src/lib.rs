//! Notaline Core - shared infrastructure for the invoice pipeline
//!
//! HTTP plumbing, logging, progress reporting, and notification delivery
//! used by the Sankhya client and the NFe download pipeline.

pub mod http;
pub mod logging;
pub mod notify;
pub mod progress;

// Re-exports for convenience
pub use http::{http_client, REQUEST_TIMEOUT, SHARED_RUNTIME};
pub use logging::init_logging;
pub use notify::TelegramNotifier;
pub use progress::ProgressContext;
