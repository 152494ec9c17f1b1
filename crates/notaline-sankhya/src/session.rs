//! Bearer-token session with deduplicated refresh.
//!
//! The token cache is shared mutable state across all download workers.
//! Refresh is single-flight: the caller holding the lock performs the
//! login call, and callers that queued behind it find the fresh token and
//! return without a second authentication.

use std::sync::{Arc, Mutex};

use notaline_core::{http_client, REQUEST_TIMEOUT, SHARED_RUNTIME};

use crate::config::{Credentials, Endpoints, RetryPolicy};
use crate::error::AuthError;

#[derive(Default)]
struct Slot {
    token: Option<Arc<str>>,
    generation: u64,
}

/// Mutex-guarded token slot with a generation counter.
///
/// The generation lets a caller that observed a stale token prove it:
/// refresh only performs the fetch when no newer token has landed since.
#[derive(Default)]
pub struct TokenCache {
    slot: Mutex<Slot>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached token and its generation. Generation 0 means never filled.
    pub fn current(&self) -> (Option<Arc<str>>, u64) {
        let slot = self.slot.lock().expect("token cache poisoned");
        (slot.token.clone(), slot.generation)
    }

    /// Replace the token a caller observed at generation `stale`.
    ///
    /// Re-checks the slot after acquiring refresh rights: if another caller
    /// already stored a newer token, it is returned without invoking
    /// `fetch`.
    pub fn refresh<F>(&self, stale: u64, fetch: F) -> Result<(Arc<str>, u64), AuthError>
    where
        F: FnOnce() -> Result<String, AuthError>,
    {
        let mut slot = self.slot.lock().expect("token cache poisoned");
        if slot.generation != stale {
            if let Some(token) = slot.token.clone() {
                return Ok((token, slot.generation));
            }
        }
        let token: Arc<str> = Arc::from(fetch()?.as_str());
        slot.token = Some(token.clone());
        slot.generation = slot.generation.wrapping_add(1);
        Ok((token, slot.generation))
    }
}

enum LoginAttempt {
    Token(String),
    Rejected(u16),
    Failed(String),
}

/// Authenticated session against the gateway.
///
/// Owns the credential bundle and the shared token cache; safe to share
/// by reference across the worker pool.
pub struct Session {
    credentials: Credentials,
    endpoints: Endpoints,
    policy: RetryPolicy,
    cache: TokenCache,
}

impl Session {
    pub fn new(credentials: Credentials, endpoints: Endpoints, policy: RetryPolicy) -> Self {
        Self {
            credentials,
            endpoints,
            policy,
            cache: TokenCache::new(),
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub(crate) fn query_url(&self) -> &str {
        &self.endpoints.query_url
    }

    /// Valid bearer token, authenticating on first use.
    pub fn bearer(&self) -> Result<(Arc<str>, u64), AuthError> {
        match self.cache.current() {
            (Some(token), generation) => Ok((token, generation)),
            (None, generation) => self.cache.refresh(generation, || self.authenticate()),
        }
    }

    /// Replace a token the caller observed rejected at `generation`.
    pub fn refresh(&self, generation: u64) -> Result<(Arc<str>, u64), AuthError> {
        self.cache.refresh(generation, || self.authenticate())
    }

    /// Exchange credentials for a bearer token, retrying up to the policy
    /// ceiling with a fixed delay. Exhaustion is fatal.
    fn authenticate(&self) -> Result<String, AuthError> {
        let max = self.policy.auth_attempts;
        let mut last_status = None;

        for attempt in 1..=max {
            if attempt > 1 {
                std::thread::sleep(self.policy.auth_delay);
            }
            match self.try_login() {
                LoginAttempt::Token(token) => return Ok(token),
                LoginAttempt::Rejected(status) => {
                    log::warn!("[{attempt}/{max}] authentication rejected: HTTP {status}");
                    last_status = Some(status);
                }
                LoginAttempt::Failed(msg) => {
                    log::warn!("[{attempt}/{max}] authentication request failed: {msg}");
                }
            }
        }

        log::error!("no bearer token after {max} attempts, aborting");
        Err(AuthError {
            attempts: max,
            last_status,
        })
    }

    fn try_login(&self) -> LoginAttempt {
        SHARED_RUNTIME.handle().block_on(async {
            let response = match http_client()
                .post(&self.endpoints.login_url)
                .header("token", &self.credentials.token)
                .header("appkey", &self.credentials.appkey)
                .header("username", &self.credentials.username)
                .header("password", &self.credentials.password)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => return LoginAttempt::Failed(e.without_url().to_string()),
            };

            let status = response.status().as_u16();
            if status != 200 {
                return LoginAttempt::Rejected(status);
            }

            let body: serde_json::Value = match response.json().await {
                Ok(v) => v,
                Err(e) => {
                    return LoginAttempt::Failed(format!(
                        "invalid JSON login body: {}",
                        e.without_url()
                    ))
                }
            };
            match body.get("bearerToken").and_then(|v| v.as_str()) {
                Some(token) if !token.is_empty() => LoginAttempt::Token(token.to_string()),
                _ => LoginAttempt::Failed("login response missing bearerToken".to_string()),
            }
        })
    }
}
