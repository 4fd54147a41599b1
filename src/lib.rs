//! hcsleep — local-day sleep aggregation for the HC Gateway.
//!
//! Fetches raw UTC sleep-stage intervals from the gateway, authenticates
//! with a cached auto-renewing bearer token, and re-buckets the intervals
//! into local-calendar-day minute totals, splitting any interval that
//! straddles a local midnight.
//!
//! The consuming system builds a [`time::ReportWindow`] (last N days, or an
//! explicit set of dates), hands it to an [`aggregate::Aggregator`], and
//! gets back one [`data::DayBucket`] per calendar day — zero-filled for
//! days without data, in the order the call site asks for.

pub mod aggregate;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod gateway;
pub mod partition;
pub mod time;

#[cfg(test)]
pub(crate) mod test_utils;

pub use aggregate::Aggregator;
pub use config::Config;
pub use data::{DayBucket, SleepReport, SortOrder, StageInterval, StageLabel};
pub use error::{HubError, Result};
pub use gateway::{Gateway, HttpGateway};
pub use time::{ReportWindow, ReportZone};
