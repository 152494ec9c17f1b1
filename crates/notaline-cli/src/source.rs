//! Sankhya-backed invoice source.

use notaline_nfe::{FetchError, InvoiceSource, NotaKey, Row};
use notaline_sankhya::{Client, XmlFetch};

/// Adapter handing the pipeline the Sankhya client.
pub struct SankhyaSource<'a> {
    client: &'a Client,
}

impl<'a> SankhyaSource<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

impl InvoiceSource for SankhyaSource<'_> {
    fn discover(&self, sql: &str) -> anyhow::Result<Option<Vec<Row>>> {
        Ok(self.client.execute_query(sql)?)
    }

    fn invoice_xml(&self, key: NotaKey) -> Result<String, FetchError> {
        match self.client.fetch_invoice_xml(key.value()) {
            Ok(XmlFetch::Payload(xml)) => Ok(xml),
            Ok(XmlFetch::Missing) => Err(FetchError::Missing),
            Ok(XmlFetch::Unavailable) => Err(FetchError::Gateway(
                "no usable result after retries".to_string(),
            )),
            // Auth exhaustion mid-pool: fail the key, the backlog retries it.
            Err(e) => Err(FetchError::Gateway(e.to_string())),
        }
    }
}
