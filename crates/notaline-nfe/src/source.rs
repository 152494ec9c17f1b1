//! Seam between the pipeline and the invoice gateway.

use crate::key::NotaKey;

/// One query result row as returned by the gateway.
pub type Row = Vec<serde_json::Value>;

/// Gateway the pipeline pulls invoice data from.
///
/// `discover` feeds the reconciliation engine; `invoice_xml` feeds the
/// download executor. Implementations are shared by reference across the
/// worker pool.
pub trait InvoiceSource: Sync {
    /// Execute a discovery query. `Ok(None)` means the gateway gave no
    /// usable result after its own retries; the run continues with the
    /// retry backlog only. The only hard error is a fatal one (no valid
    /// session obtainable).
    fn discover(&self, sql: &str) -> anyhow::Result<Option<Vec<Row>>>;

    /// XML payload for one invoice.
    fn invoice_xml(&self, key: NotaKey) -> Result<String, FetchError>;
}

/// Per-invoice fetch failure.
#[derive(Debug)]
pub enum FetchError {
    /// The gateway has no payload for this key, or a blank one.
    Missing,
    /// The gateway could not be reached or gave no usable result.
    Gateway(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "no XML payload stored for this invoice"),
            Self::Gateway(msg) => write!(f, "gateway: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing() {
        assert!(format!("{}", FetchError::Missing).contains("no XML payload"));
    }

    #[test]
    fn display_gateway() {
        let err = FetchError::Gateway("HTTP 502".to_string());
        assert_eq!(format!("{err}"), "gateway: HTTP 502");
    }
}
