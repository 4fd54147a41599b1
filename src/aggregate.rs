//! The session aggregator: window in, per-local-day sleep report out.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

use crate::auth::TokenCache;
use crate::config::Config;
use crate::data::{DayBucket, SleepReport, SleepSession, SortOrder};
use crate::error::{HubError, Result};
use crate::gateway::{FetchOutcome, Gateway, HttpGateway, FETCH_ENDPOINT};
use crate::partition::partition;
use crate::time::{ReportWindow, ReportZone};

/// Orchestrates one aggregation run: token, query, partition, zero-fill.
pub struct Aggregator<G: Gateway> {
    gateway: G,
    tokens: TokenCache,
    zone: ReportZone,
}

impl Aggregator<HttpGateway> {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(HttpGateway::new(config)?, config.zone))
    }
}

impl<G: Gateway> Aggregator<G> {
    pub fn new(gateway: G, zone: ReportZone) -> Self {
        Self {
            gateway,
            tokens: TokenCache::new(),
            zone,
        }
    }

    /// Window over the last `days` local calendar days, in this
    /// aggregator's zone.
    pub fn window_last_days(&self, days: u32, include_today: bool) -> Result<ReportWindow> {
        ReportWindow::last_days(days, include_today, self.zone)
    }

    /// Smallest window covering the given local dates.
    pub fn window_for_dates<I>(&self, dates: I) -> Result<ReportWindow>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        ReportWindow::for_dates(dates, self.zone)
    }

    /// Fetch every session in the window, partition each stage interval at
    /// local midnights, and return one bucket per calendar day — days with
    /// no data included as zeros, sorted per `order`.
    pub async fn aggregate(&self, window: &ReportWindow, order: SortOrder) -> Result<SleepReport> {
        let sessions = self.fetch_with_retry(window).await?;

        let mut by_day: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
        let mut skipped = 0usize;
        for session in &sessions {
            for raw in session.stages() {
                let Some(interval) = raw.interval() else {
                    skipped += 1;
                    continue;
                };
                for (date, label, minutes) in partition(&interval, window) {
                    by_day
                        .entry(date)
                        .or_insert_with(|| DayBucket::empty(date))
                        .add(label, minutes);
                }
            }
        }
        if skipped > 0 {
            debug!(skipped, "skipped malformed stage entries");
        }

        let mut report: SleepReport = window
            .days()
            .map(|date| {
                by_day
                    .remove(&date)
                    .unwrap_or_else(|| DayBucket::empty(date))
            })
            .collect();
        if order == SortOrder::Descending {
            report.reverse();
        }
        Ok(report)
    }

    /// One query, with exactly one forced re-login and retry when the
    /// gateway rejects the cached token. Every other failure propagates
    /// un-retried.
    async fn fetch_with_retry(&self, window: &ReportWindow) -> Result<Vec<SleepSession>> {
        let start_utc = window.start_utc();
        let end_utc = window.end_utc();

        let token = self.tokens.token(&self.gateway).await?;
        match self
            .gateway
            .fetch_sessions(&token, start_utc, end_utc)
            .await?
        {
            FetchOutcome::Sessions(sessions) => Ok(sessions),
            FetchOutcome::Unauthorized => {
                debug!("gateway rejected the token, re-login and retry once");
                let token = self.tokens.refresh(&self.gateway).await?;
                match self
                    .gateway
                    .fetch_sessions(&token, start_utc, end_utc)
                    .await?
                {
                    FetchOutcome::Sessions(sessions) => Ok(sessions),
                    FetchOutcome::Unauthorized => Err(HubError::Gateway {
                        endpoint: FETCH_ENDPOINT.to_string(),
                        status: 401,
                        message: "authorization rejected after re-login".to_string(),
                    }),
                }
            }
        }
    }
}
