//! Notaline Sankhya - client for the Sankhya gateway
//!
//! Bearer-token session with deduplicated refresh, DbExplorer query
//! execution with transparent re-auth and bounded retry, invoice XML
//! retrieval, and named-query loading.

pub mod client;
pub mod config;
pub mod error;
pub mod queries;
pub mod session;

// Re-exports
pub use client::{Client, Row, XmlFetch};
pub use config::{Credentials, Endpoints, RetryPolicy};
pub use error::AuthError;
pub use queries::load_query;
pub use session::{Session, TokenCache};
