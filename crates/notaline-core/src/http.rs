//! Shared HTTP client and runtime.
//!
//! The gateway calls and notification delivery all go through one pooled
//! async reqwest client, driven from sync code by blocking on a small
//! shared tokio runtime. Workers stay plain threads; only the I/O hops
//! onto the runtime.

use std::sync::LazyLock;
use std::time::Duration;

/// Connect timeout for new connections.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-request wait ceiling. Exceeding it is a retryable failure.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(8)
        .build()
        .expect("failed to build HTTP client")
});

/// Get the shared HTTP client.
pub fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});
