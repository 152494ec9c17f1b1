//! Fatal authentication failure.

/// No valid bearer token after exhausting the retry ceiling.
///
/// This is the only error the client surfaces; transient query failures
/// drain into `Ok(None)` results instead. Callers are expected to abort
/// the run on it.
#[derive(Debug)]
pub struct AuthError {
    pub attempts: u32,
    pub last_status: Option<u16>,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.last_status {
            Some(status) => write!(
                f,
                "authentication failed after {} attempt(s), last response HTTP {status}",
                self.attempts
            ),
            None => write!(
                f,
                "authentication failed after {} attempt(s), no response from login endpoint",
                self.attempts
            ),
        }
    }
}

impl std::error::Error for AuthError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_status() {
        let err = AuthError {
            attempts: 5,
            last_status: Some(401),
        };
        let msg = format!("{err}");
        assert!(msg.contains("5 attempt(s)"));
        assert!(msg.contains("HTTP 401"));
    }

    #[test]
    fn display_without_status() {
        let err = AuthError {
            attempts: 3,
            last_status: None,
        };
        assert!(format!("{err}").contains("no response"));
    }
}
