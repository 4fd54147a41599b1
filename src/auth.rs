//! Bearer-token lifecycle for the HC Gateway.
//!
//! The cache is process-wide mutable state; the read-check-refresh sequence
//! is serialized behind a mutex so concurrent requests cannot trigger two
//! simultaneous logins or observe a half-updated token/expiry pair.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::gateway::Gateway;

/// A token is considered stale this long before its stated expiry.
const EXPIRY_SKEW_SECONDS: i64 = 60;

/// Bearer credential returned by login. `expires_at` is `None` when the
/// gateway stated no expiry; such a token is used only by the call that
/// obtained it — no default lifetime is guessed.
#[derive(Debug, Clone)]
pub struct AuthToken {
    pub value: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Owns the current bearer token; logs in when it is absent, near expiry,
/// or rejected.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<AuthToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token valid for at least [`EXPIRY_SKEW_SECONDS`] more seconds,
    /// reused from the cache when possible, otherwise freshly logged in.
    pub async fn token<G: Gateway>(&self, gateway: &G) -> Result<String> {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if let Some(expires_at) = cached.expires_at {
                if Utc::now() + Duration::seconds(EXPIRY_SKEW_SECONDS) < expires_at {
                    return Ok(cached.value.clone());
                }
            }
        }
        debug!("no valid cached token, logging in");
        let fresh = gateway.login().await?;
        let value = fresh.value.clone();
        *slot = Some(fresh);
        Ok(value)
    }

    /// Discard the cached token and log in again. Called after the gateway
    /// rejects a token the cache considered valid.
    pub async fn refresh<G: Gateway>(&self, gateway: &G) -> Result<String> {
        let mut slot = self.slot.lock().await;
        *slot = None;
        debug!("cached token rejected, forcing re-login");
        let fresh = gateway.login().await?;
        let value = fresh.value.clone();
        *slot = Some(fresh);
        Ok(value)
    }
}
