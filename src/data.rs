//! Gateway payload types and the aggregation data model.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ── Gateway payload ─────────────────────────────────────

/// One sleep session as returned by `fetch/sleepSession`. Every field is
/// lenient: a corrupt session must never fail an entire report.
#[derive(Debug, Clone, Deserialize)]
pub struct SleepSession {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub data: Option<SessionData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub stages: Option<Vec<RawStage>>,
}

/// One raw stage entry. Timestamps are kept as strings and validated in
/// [`RawStage::interval`] so that one bad entry is skipped, not fatal.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStage {
    #[serde(default)]
    pub stage: Option<i64>,
    #[serde(default, rename = "startTime")]
    pub start_time: Option<String>,
    #[serde(default, rename = "endTime")]
    pub end_time: Option<String>,
}

impl SleepSession {
    pub fn stages(&self) -> &[RawStage] {
        self.data
            .as_ref()
            .and_then(|d| d.stages.as_deref())
            .unwrap_or_default()
    }
}

impl RawStage {
    /// Validate this entry into a [`StageInterval`]. Returns `None` for
    /// missing fields, unparseable timestamps, or non-positive duration.
    pub fn interval(&self) -> Option<StageInterval> {
        let stage_code = self.stage?;
        let start_utc = parse_utc(self.start_time.as_deref()?)?;
        let end_utc = parse_utc(self.end_time.as_deref()?)?;
        if end_utc <= start_utc {
            return None;
        }
        Some(StageInterval {
            start_utc,
            end_utc,
            stage_code,
        })
    }
}

/// Parse a gateway timestamp. Accepts RFC 3339 with `Z` or an explicit
/// offset; a timestamp without any offset is assumed UTC.
pub fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    None
}

// ── Stage intervals ─────────────────────────────────────

/// One validated sleep phase, UTC-stamped, with positive duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageInterval {
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub stage_code: i64,
}

/// Semantic name of a stage code. Unknown codes are carried as
/// [`StageLabel::Other`] and rendered `stage_<code>`, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageLabel {
    NapOrOther,
    Awake,
    Light,
    Deep,
    Rem,
    Other(i64),
}

impl StageLabel {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => StageLabel::NapOrOther,
            1 => StageLabel::Awake,
            4 => StageLabel::Light,
            5 => StageLabel::Deep,
            6 => StageLabel::Rem,
            other => StageLabel::Other(other),
        }
    }
}

impl fmt::Display for StageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageLabel::NapOrOther => f.write_str("siesta/otro"),
            StageLabel::Awake => f.write_str("despierto"),
            StageLabel::Light => f.write_str("ligero"),
            StageLabel::Deep => f.write_str("profundo"),
            StageLabel::Rem => f.write_str("REM"),
            StageLabel::Other(code) => write!(f, "stage_{}", code),
        }
    }
}

// ── Report model ────────────────────────────────────────

/// Minute totals for one local calendar day.
///
/// `total_minutes == sum(per_stage_minutes.values())` holds by construction:
/// both counters only move through [`DayBucket::add`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub total_minutes: i64,
    pub per_stage_minutes: BTreeMap<String, i64>,
}

impl DayBucket {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_minutes: 0,
            per_stage_minutes: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, label: StageLabel, minutes: i64) {
        self.total_minutes += minutes;
        *self.per_stage_minutes.entry(label.to_string()).or_insert(0) += minutes;
    }
}

/// One bucket per calendar day in the requested window, zero-filled,
/// sorted per the caller's [`SortOrder`].
pub type SleepReport = Vec<DayBucket>;

/// Series order of a [`SleepReport`]. Both orders are in live use by the
/// consuming system, so the choice stays with the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}
