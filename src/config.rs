//! Environment-driven configuration.
//!
//! Credentials are required up front: any call path that needs the gateway
//! fails at startup when they are missing, not per request.

use crate::error::{HubError, Result};
use crate::time::ReportZone;

const DEFAULT_BASE: &str = "https://api.hcgateway.shuchir.dev";
const DEFAULT_TIMEZONE: &str = "America/Argentina/Buenos_Aires";

#[derive(Debug, Clone)]
pub struct Config {
    /// Gateway base URL (`HC_BASE`).
    pub base_url: String,
    /// Login username (`HC_USER`).
    pub username: String,
    /// Login password (`HC_PASS`).
    pub password: String,
    /// Local-day timezone (`HC_TZ`).
    pub zone: ReportZone,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("HC_BASE").unwrap_or_else(|_| DEFAULT_BASE.to_string());
        let username = std::env::var("HC_USER")
            .map_err(|_| HubError::Config("HC_USER is not set".to_string()))?;
        let password = std::env::var("HC_PASS")
            .map_err(|_| HubError::Config("HC_PASS is not set".to_string()))?;
        let zone_name =
            std::env::var("HC_TZ").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string());

        Ok(Config {
            base_url,
            username,
            password,
            zone: ReportZone::from_name(&zone_name),
        })
    }
}
