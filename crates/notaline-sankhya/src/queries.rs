//! Named query loading with `{param}` substitution.
//!
//! Discovery queries live as `.sql` files in a queries directory; the
//! pipeline receives only the resolved text.

use std::path::Path;

use anyhow::{Context, Result};

/// Load `<dir>/<name>.sql` and substitute `{key}` placeholders.
///
/// Errors when the file is unreadable or an identifier-shaped placeholder
/// survives substitution.
pub fn load_query(dir: &Path, name: &str, params: &[(String, String)]) -> Result<String> {
    let path = dir.join(format!("{name}.sql"));
    let mut sql = std::fs::read_to_string(&path)
        .with_context(|| format!("cannot read query {}", path.display()))?;

    for (key, value) in params {
        sql = sql.replace(&format!("{{{key}}}"), value);
    }

    if let Some(placeholder) = unresolved_placeholder(&sql) {
        anyhow::bail!("query '{name}' has unresolved parameter {{{placeholder}}}");
    }
    Ok(sql)
}

/// First `{identifier}` left in `sql`, if any.
fn unresolved_placeholder(sql: &str) -> Option<&str> {
    let mut rest = sql;
    while let Some(start) = rest.find('{') {
        let tail = &rest[start + 1..];
        let end = tail.find('}')?;
        let inner = &tail[..end];
        if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Some(inner);
        }
        rest = &tail[end + 1..];
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_query(dir: &TempDir, name: &str, body: &str) {
        std::fs::write(dir.path().join(format!("{name}.sql")), body).unwrap();
    }

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_named_parameters() {
        let dir = TempDir::new().unwrap();
        write_query(
            &dir,
            "monthly",
            "SELECT NUNOTA FROM TGFCAB WHERE YEAR(DTNEG) = {year} AND MONTH(DTNEG) = {month}",
        );

        let sql = load_query(
            dir.path(),
            "monthly",
            &params(&[("year", "2026"), ("month", "8")]),
        )
        .unwrap();
        assert!(sql.contains("YEAR(DTNEG) = 2026"));
        assert!(sql.contains("MONTH(DTNEG) = 8"));
    }

    #[test]
    fn no_parameters_passes_through() {
        let dir = TempDir::new().unwrap();
        write_query(&dir, "plain", "SELECT 1");
        assert_eq!(load_query(dir.path(), "plain", &[]).unwrap(), "SELECT 1");
    }

    #[test]
    fn unresolved_parameter_is_an_error() {
        let dir = TempDir::new().unwrap();
        write_query(&dir, "partial", "SELECT * WHERE CODEMP = {company}");

        let err = load_query(dir.path(), "partial", &[]).unwrap_err();
        assert!(format!("{err}").contains("company"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_query(dir.path(), "absent", &[]).is_err());
    }

    #[test]
    fn non_identifier_braces_are_ignored() {
        let dir = TempDir::new().unwrap();
        write_query(&dir, "braces", "SELECT '{ not a param }' FROM DUAL");
        assert!(load_query(dir.path(), "braces", &[]).is_ok());
    }

    #[test]
    fn unresolved_placeholder_scanning() {
        assert_eq!(unresolved_placeholder("a {x} b"), Some("x"));
        assert_eq!(unresolved_placeholder("{ spaced }{tail}"), Some("tail"));
        assert_eq!(unresolved_placeholder("no braces"), None);
        assert_eq!(unresolved_placeholder("empty {} pair"), None);
        assert_eq!(unresolved_placeholder("dangling {open"), None);
    }
}
