//! Client configuration: credentials, endpoints, retry policy.

use std::time::Duration;

/// Credential bundle for the Sankhya login endpoint.
///
/// Sent as request headers on the login call; opaque to the rest of the
/// pipeline.
#[derive(Clone)]
pub struct Credentials {
    pub token: String,
    pub appkey: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Login and query endpoints of the gateway.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub login_url: String,
    pub query_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login_url: "https://api.sankhya.com.br/login".to_string(),
            query_url: "https://api.sankhya.com.br/gateway/v1/mge/service.sbr\
                        ?serviceName=DbExplorerSP.executeQuery&outputType=json"
                .to_string(),
        }
    }
}

/// Retry behavior for auth and query calls.
///
/// Auth exhaustion is fatal; query exhaustion drains into an empty result.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub auth_attempts: u32,
    pub auth_delay: Duration,
    pub query_attempts: u32,
    pub query_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            auth_attempts: 5,
            auth_delay: Duration::from_secs(3),
            query_attempts: 5,
            query_delay: Duration::from_secs(7),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints() {
        let endpoints = Endpoints::default();
        assert!(endpoints.login_url.ends_with("/login"));
        assert!(endpoints.query_url.contains("DbExplorerSP.executeQuery"));
    }

    #[test]
    fn default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.auth_attempts, 5);
        assert_eq!(policy.auth_delay, Duration::from_secs(3));
        assert_eq!(policy.query_attempts, 5);
        assert_eq!(policy.query_delay, Duration::from_secs(7));
    }

    #[test]
    fn credentials_debug_redacts_secrets() {
        let creds = Credentials {
            token: "secret-token".to_string(),
            appkey: "secret-key".to_string(),
            username: "svc-user".to_string(),
            password: "hunter2".to_string(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("svc-user"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("secret-token"));
    }
}
