//! Local-day time handling: the report timezone and the window calculator.
//!
//! All bucketing is done on local wall-clock dates. The gateway speaks UTC,
//! so every boundary crosses through [`ReportZone`].

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::{HubError, Result};

/// Offset used when the configured zone name cannot be resolved (UTC-3,
/// the zone the original deployment targets).
const FALLBACK_OFFSET_HOURS: i32 = -3;

/// The timezone all local-day math runs in.
///
/// `Fixed` is an explicit approximation taken only when the IANA name does
/// not resolve; it ignores DST, and construction warns about that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportZone {
    Named(Tz),
    Fixed(chrono::FixedOffset),
}

impl ReportZone {
    /// Resolve a configured zone name, falling back to a fixed UTC-3 offset
    /// when the name is unknown. The fallback is surfaced as a startup
    /// warning rather than a silent behavior change.
    pub fn from_name(name: &str) -> Self {
        match Tz::from_str(name) {
            Ok(tz) => ReportZone::Named(tz),
            Err(_) => {
                let offset = chrono::FixedOffset::east_opt(FALLBACK_OFFSET_HOURS * 3600)
                    .expect("in-range fixed offset");
                warn!(
                    zone = name,
                    "unknown timezone, falling back to fixed UTC{:+03}:00 (DST ignored)",
                    FALLBACK_OFFSET_HOURS
                );
                ReportZone::Fixed(offset)
            }
        }
    }

    /// Local wall-clock time of a UTC instant.
    pub fn to_local(&self, utc: DateTime<Utc>) -> NaiveDateTime {
        match self {
            ReportZone::Named(tz) => utc.with_timezone(tz).naive_local(),
            ReportZone::Fixed(offset) => utc.with_timezone(offset).naive_local(),
        }
    }

    /// UTC instant of a local wall-clock time. Ambiguous times (DST fold)
    /// map to the earlier instant; times inside a DST gap are interpreted
    /// as if the offset had not changed.
    pub fn from_local(&self, local: NaiveDateTime) -> DateTime<Utc> {
        match self {
            ReportZone::Named(tz) => resolve_local(tz.from_local_datetime(&local), local),
            ReportZone::Fixed(offset) => resolve_local(offset.from_local_datetime(&local), local),
        }
    }

    /// Today's local calendar date for a given instant.
    pub fn today(&self, now_utc: DateTime<Utc>) -> NaiveDate {
        self.to_local(now_utc).date()
    }
}

impl fmt::Display for ReportZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportZone::Named(tz) => write!(f, "{}", tz.name()),
            ReportZone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

fn resolve_local<T: TimeZone>(
    mapped: LocalResult<DateTime<T>>,
    local: NaiveDateTime,
) -> DateTime<Utc> {
    match mapped {
        LocalResult::Single(t) => t.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // DST gap. Window bounds sit at 00:00:00 / 23:59:59; zones that skip
        // those wall-clock times are rare enough that reading the local time
        // as UTC-of-itself shifted by nothing is an acceptable approximation.
        LocalResult::None => Utc.from_utc_datetime(&local),
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).expect("valid wall-clock time")
}

/// The local date range an aggregation run covers.
///
/// Invariants: `start_local` is local midnight of its day, `end_local` is
/// 23:59:59 of its day, `start_local <= end_local`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportWindow {
    start_local: NaiveDateTime,
    end_local: NaiveDateTime,
    zone: ReportZone,
}

impl ReportWindow {
    /// Window for the last `days` local calendar days, using the current
    /// clock. See [`ReportWindow::last_days_at`].
    pub fn last_days(days: u32, include_today: bool, zone: ReportZone) -> Result<Self> {
        Self::last_days_at(Utc::now(), days, include_today, zone)
    }

    /// Window for the last `days` local calendar days as seen from
    /// `now_utc`. With `include_today` the window ends today 23:59:59 local,
    /// otherwise yesterday 23:59:59.
    pub fn last_days_at(
        now_utc: DateTime<Utc>,
        days: u32,
        include_today: bool,
        zone: ReportZone,
    ) -> Result<Self> {
        if days == 0 {
            return Err(HubError::InvalidArgument(
                "report window must cover at least one day".to_string(),
            ));
        }
        let today = zone.today(now_utc);
        let end_date = if include_today {
            today
        } else {
            today - Duration::days(1)
        };
        let start_date = end_date - Duration::days(i64::from(days) - 1);
        Ok(Self {
            start_local: start_date.and_time(NaiveTime::MIN),
            end_local: end_date.and_time(end_of_day()),
            zone,
        })
    }

    /// Smallest window covering every given local date (min..max inclusive).
    pub fn for_dates<I>(dates: I, zone: ReportZone) -> Result<Self>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut earliest: Option<NaiveDate> = None;
        let mut latest: Option<NaiveDate> = None;
        for date in dates {
            earliest = Some(earliest.map_or(date, |d| d.min(date)));
            latest = Some(latest.map_or(date, |d| d.max(date)));
        }
        match (earliest, latest) {
            (Some(start), Some(end)) => Ok(Self {
                start_local: start.and_time(NaiveTime::MIN),
                end_local: end.and_time(end_of_day()),
                zone,
            }),
            _ => Err(HubError::InvalidArgument(
                "date set must not be empty".to_string(),
            )),
        }
    }

    pub fn start_local(&self) -> NaiveDateTime {
        self.start_local
    }

    pub fn end_local(&self) -> NaiveDateTime {
        self.end_local
    }

    pub fn zone(&self) -> &ReportZone {
        &self.zone
    }

    /// Lower bound as a UTC instant, for the gateway query.
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.zone.from_local(self.start_local)
    }

    /// Upper bound as a UTC instant, for the gateway query.
    pub fn end_utc(&self) -> DateTime<Utc> {
        self.zone.from_local(self.end_local)
    }

    /// Every local calendar date in the window, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let end = self.end_local.date();
        self.start_local
            .date()
            .iter_days()
            .take_while(move |d| *d <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn utc3() -> ReportZone {
        ReportZone::Fixed(chrono::FixedOffset::east_opt(-3 * 3600).unwrap())
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn named_zone_resolves() {
        let zone = ReportZone::from_name("America/Argentina/Buenos_Aires");
        assert!(matches!(zone, ReportZone::Named(_)));
    }

    #[test]
    fn unknown_zone_falls_back_to_fixed_offset() {
        let zone = ReportZone::from_name("Not/A_Zone");
        assert_eq!(zone, utc3());
    }

    #[test]
    fn last_seven_days_excluding_today() {
        // Local date at this instant is 2024-03-10.
        let now = "2024-03-10T15:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let window = ReportWindow::last_days_at(now, 7, false, utc3()).unwrap();
        assert_eq!(
            window.start_local(),
            date("2024-03-03").and_time(NaiveTime::MIN)
        );
        assert_eq!(
            window.end_local(),
            date("2024-03-09").and_hms_opt(23, 59, 59).unwrap()
        );
    }

    #[test]
    fn last_days_including_today() {
        let now = "2024-03-10T15:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let window = ReportWindow::last_days_at(now, 1, true, utc3()).unwrap();
        assert_eq!(window.start_local().date(), date("2024-03-10"));
        assert_eq!(window.end_local().date(), date("2024-03-10"));
    }

    #[test]
    fn local_date_flips_near_midnight() {
        // 01:30 UTC is still the previous local day at UTC-3.
        let now = "2024-03-10T01:30:00Z".parse::<DateTime<Utc>>().unwrap();
        let window = ReportWindow::last_days_at(now, 1, true, utc3()).unwrap();
        assert_eq!(window.start_local().date(), date("2024-03-09"));
    }

    #[test]
    fn zero_days_is_rejected() {
        let now = Utc::now();
        assert!(matches!(
            ReportWindow::last_days_at(now, 0, true, utc3()),
            Err(HubError::InvalidArgument(_))
        ));
    }

    #[test]
    fn window_for_dates_covers_min_to_max() {
        let dates = [date("2024-01-05"), date("2024-01-02"), date("2024-01-03")];
        let window = ReportWindow::for_dates(dates, utc3()).unwrap();
        assert_eq!(window.start_local().date(), date("2024-01-02"));
        assert_eq!(window.end_local().date(), date("2024-01-05"));
        let days: Vec<_> = window.days().collect();
        assert_eq!(days.len(), 4);
        assert_eq!(days[0], date("2024-01-02"));
        assert_eq!(days[3], date("2024-01-05"));
    }

    #[test]
    fn empty_date_set_is_rejected() {
        assert!(matches!(
            ReportWindow::for_dates(std::iter::empty(), utc3()),
            Err(HubError::InvalidArgument(_))
        ));
    }

    #[test]
    fn utc_bounds_apply_the_offset() {
        let window = ReportWindow::for_dates([date("2024-01-02")], utc3()).unwrap();
        assert_eq!(
            window.start_utc(),
            "2024-01-02T03:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(
            window.end_utc(),
            "2024-01-03T02:59:59Z".parse::<DateTime<Utc>>().unwrap()
        );
    }
}
