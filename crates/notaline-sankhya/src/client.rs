//! Query execution against the DbExplorer gateway.

use notaline_core::{http_client, REQUEST_TIMEOUT, SHARED_RUNTIME};

use crate::error::AuthError;
use crate::session::Session;

/// One result row: the gateway returns `responseBody.rows` as an array of
/// arrays of JSON values.
pub type Row = Vec<serde_json::Value>;

/// Outcome of a single-invoice XML fetch.
#[derive(Debug)]
pub enum XmlFetch {
    /// The stored payload.
    Payload(String),
    /// No row, empty row, or blank/non-text content.
    Missing,
    /// Gateway gave no usable result after retries.
    Unavailable,
}

enum Attempt {
    Rows(Vec<Row>),
    TokenRejected(u16),
    Failed(String),
}

/// Gateway client over an authenticated [`Session`].
pub struct Client {
    session: Session,
}

impl Client {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run `sql` under the current token.
    ///
    /// A 401/403 response refreshes the token through the session and
    /// retries the same query. Timeouts, non-200 statuses and malformed
    /// bodies are retried up to the policy ceiling with a fixed delay;
    /// exhaustion yields `Ok(None)`. Only authentication failure is `Err`.
    pub fn execute_query(&self, sql: &str) -> Result<Option<Vec<Row>>, AuthError> {
        let (mut token, mut generation) = self.session.bearer()?;
        let payload = serde_json::json!({
            "serviceName": "DbExplorerSP.executeQuery",
            "requestBody": { "sql": sql }
        });

        let policy = self.session.policy();
        let max = policy.query_attempts;
        for attempt in 1..=max {
            if attempt > 1 {
                std::thread::sleep(policy.query_delay);
            }
            match self.try_query(&token, &payload) {
                Attempt::Rows(rows) => return Ok(Some(rows)),
                Attempt::TokenRejected(status) => {
                    log::warn!("[{attempt}/{max}] token rejected (HTTP {status}), refreshing");
                    let (fresh, fresh_generation) = self.session.refresh(generation)?;
                    token = fresh;
                    generation = fresh_generation;
                }
                Attempt::Failed(msg) => {
                    log::warn!("[{attempt}/{max}] query failed: {msg}");
                }
            }
        }

        log::warn!("query gave up after {max} attempts");
        Ok(None)
    }

    /// XML payload stored for one invoice.
    pub fn fetch_invoice_xml(&self, nunota: u64) -> Result<XmlFetch, AuthError> {
        let sql = format!("SELECT XMLENVCLI FROM TGFNFE WHERE NUNOTA = {nunota}");
        let rows = match self.execute_query(&sql)? {
            Some(rows) => rows,
            None => return Ok(XmlFetch::Unavailable),
        };

        let payload = rows
            .first()
            .and_then(|row| row.first())
            .and_then(|cell| cell.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty());

        Ok(match payload {
            Some(xml) => XmlFetch::Payload(xml.to_string()),
            None => XmlFetch::Missing,
        })
    }

    fn try_query(&self, token: &str, payload: &serde_json::Value) -> Attempt {
        SHARED_RUNTIME.handle().block_on(async {
            let response = match http_client()
                .get(self.session.query_url())
                .bearer_auth(token)
                .json(payload)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => return Attempt::Failed(e.without_url().to_string()),
            };

            let status = response.status().as_u16();
            if status == 401 || status == 403 {
                return Attempt::TokenRejected(status);
            }
            if status != 200 {
                return Attempt::Failed(format!("HTTP {status}"));
            }

            let body: serde_json::Value = match response.json().await {
                Ok(v) => v,
                Err(e) => {
                    return Attempt::Failed(format!("invalid JSON body: {}", e.without_url()))
                }
            };
            match rows_from_body(&body) {
                Some(rows) => Attempt::Rows(rows),
                None => Attempt::Failed("response missing responseBody.rows".to_string()),
            }
        })
    }
}

/// Extract `responseBody.rows` as row vectors; `None` when absent.
fn rows_from_body(body: &serde_json::Value) -> Option<Vec<Row>> {
    let rows = body.get("responseBody")?.get("rows")?.as_array()?;
    Some(
        rows.iter()
            .map(|row| row.as_array().cloned().unwrap_or_default())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_from_well_formed_body() {
        let body: serde_json::Value = serde_json::from_str(
            r#"{"responseBody": {"rows": [["123"], [456], []]}}"#,
        )
        .unwrap();
        let rows = rows_from_body(&body).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0].as_str(), Some("123"));
        assert_eq!(rows[1][0].as_u64(), Some(456));
        assert!(rows[2].is_empty());
    }

    #[test]
    fn rows_missing_response_body() {
        let body: serde_json::Value = serde_json::from_str(r#"{"status": "1"}"#).unwrap();
        assert!(rows_from_body(&body).is_none());
    }

    #[test]
    fn rows_missing_rows_array() {
        let body: serde_json::Value =
            serde_json::from_str(r#"{"responseBody": {"fields": []}}"#).unwrap();
        assert!(rows_from_body(&body).is_none());
    }

    #[test]
    fn rows_not_an_array() {
        let body: serde_json::Value =
            serde_json::from_str(r#"{"responseBody": {"rows": "oops"}}"#).unwrap();
        assert!(rows_from_body(&body).is_none());
    }

    #[test]
    fn non_array_row_becomes_empty() {
        let body: serde_json::Value =
            serde_json::from_str(r#"{"responseBody": {"rows": ["bare"]}}"#).unwrap();
        let rows = rows_from_body(&body).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_empty());
    }
}
