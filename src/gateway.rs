//! HC Gateway HTTP client and the trait seam the aggregator talks through.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::auth::AuthToken;
use crate::config::Config;
use crate::data::{parse_utc, SleepSession};
use crate::error::{HubError, Result};

const LOGIN_TIMEOUT: Duration = Duration::from_secs(20);
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub const FETCH_ENDPOINT: &str = "/api/v2/fetch/sleepSession";

/// Result of one session query. An authorization rejection is a value, not
/// an error: it drives the single re-login-and-retry in the aggregator.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Sessions(Vec<SleepSession>),
    Unauthorized,
}

/// The outbound surface of the HC Gateway. Injectable so the token and
/// retry logic can be exercised against a scripted fake.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Exchange the configured credentials for a bearer token.
    async fn login(&self) -> Result<AuthToken>;

    /// Query sleep sessions whose bounds fall within `[start_utc, end_utc]`.
    async fn fetch_sessions(
        &self,
        token: &str,
        start_utc: DateTime<Utc>,
        end_utc: DateTime<Utc>,
    ) -> Result<FetchOutcome>;
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    expiry: Option<String>,
}

pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl HttpGateway {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn login(&self) -> Result<AuthToken> {
        let url = format!("{}/api/v2/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(LOGIN_TIMEOUT)
            .json(&json!({ "username": self.username, "password": self.password }))
            .send()
            .await
            .map_err(|e| HubError::Auth(format!("login request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HubError::Auth(format!(
                "login returned {}: {}",
                status.as_u16(),
                excerpt(&body)
            )));
        }

        let payload: LoginResponse = response
            .json()
            .await
            .map_err(|e| HubError::Auth(format!("malformed login response: {}", e)))?;

        let value = payload
            .token
            .ok_or_else(|| HubError::Auth("login succeeded but returned no token".to_string()))?;
        let expires_at = payload.expiry.as_deref().and_then(parse_utc);
        if payload.expiry.is_some() && expires_at.is_none() {
            debug!("login expiry not parseable, token will not be reused");
        }
        Ok(AuthToken { value, expires_at })
    }

    async fn fetch_sessions(
        &self,
        token: &str,
        start_utc: DateTime<Utc>,
        end_utc: DateTime<Utc>,
    ) -> Result<FetchOutcome> {
        let url = format!("{}{}", self.base_url, FETCH_ENDPOINT);
        let body = json!({
            "queries": {
                "start": { "$gte": start_utc.to_rfc3339_opts(SecondsFormat::Secs, true) },
                "end":   { "$lte": end_utc.to_rfc3339_opts(SecondsFormat::Secs, true) },
            }
        });

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(FetchOutcome::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HubError::Gateway {
                endpoint: FETCH_ENDPOINT.to_string(),
                status: status.as_u16(),
                message: excerpt(&body),
            });
        }

        let text = response.text().await?;
        let sessions: Vec<SleepSession> =
            serde_json::from_str(&text).map_err(|e| HubError::Parse {
                endpoint: FETCH_ENDPOINT.to_string(),
                message: format!("{} (body excerpt: {})", e, excerpt(&text)),
            })?;
        Ok(FetchOutcome::Sessions(sessions))
    }
}

fn excerpt(body: &str) -> String {
    if body.is_empty() {
        "empty response".to_string()
    } else {
        body.chars().take(200).collect()
    }
}
