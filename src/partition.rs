//! Splits one UTC stage interval into per-local-day minute contributions.
//!
//! This is the core of the aggregation path: an interval that straddles a
//! local midnight must credit both calendar days with no double-count and
//! no gap.

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::data::{StageInterval, StageLabel};
use crate::time::ReportWindow;

/// Partition `interval` at every local midnight inside `window`, clipped to
/// the window bounds.
///
/// Each segment's minutes are `floor(segment_seconds / 60)` — whole minutes
/// only, matching the integer-minute report downstream. Summed segments
/// never exceed the interval's own UTC duration.
pub fn partition(
    interval: &StageInterval,
    window: &ReportWindow,
) -> Vec<(NaiveDate, StageLabel, i64)> {
    let zone = window.zone();
    let mut start_local = zone.to_local(interval.start_utc);
    let mut end_local = zone.to_local(interval.end_utc);

    // Clip to the requested window.
    if start_local < window.start_local() {
        start_local = window.start_local();
    }
    if end_local > window.end_local() {
        end_local = window.end_local();
    }
    if end_local <= start_local {
        return Vec::new();
    }

    let label = StageLabel::from_code(interval.stage_code);
    let mut segments = Vec::new();
    let mut cursor = start_local;
    while cursor < end_local {
        let next_midnight = (cursor.date() + Duration::days(1)).and_time(NaiveTime::MIN);
        let segment_end = end_local.min(next_midnight);
        let minutes = (segment_end - cursor).num_seconds() / 60;
        if minutes > 0 {
            segments.push((cursor.date(), label, minutes));
        }
        cursor = segment_end;
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ReportZone;
    use chrono::{DateTime, Utc};

    fn utc3() -> ReportZone {
        ReportZone::Fixed(chrono::FixedOffset::east_opt(-3 * 3600).unwrap())
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn interval(start: &str, end: &str, stage_code: i64) -> StageInterval {
        StageInterval {
            start_utc: start.parse::<DateTime<Utc>>().unwrap(),
            end_utc: end.parse::<DateTime<Utc>>().unwrap(),
            stage_code,
        }
    }

    fn window(from: &str, to: &str) -> ReportWindow {
        ReportWindow::for_dates([date(from), date(to)], utc3()).unwrap()
    }

    #[test]
    fn interval_inside_one_local_day() {
        // 23:30Z -> 00:45Z is 20:30 -> 21:45 at UTC-3, one local day.
        let iv = interval("2024-01-01T23:30:00Z", "2024-01-02T00:45:00Z", 5);
        let w = window("2024-01-01", "2024-01-02");
        let segments = partition(&iv, &w);
        assert_eq!(segments, vec![(date("2024-01-01"), StageLabel::Deep, 75)]);
    }

    #[test]
    fn interval_crossing_local_midnight() {
        // 02:00Z -> 04:30Z is 23:00 -> 01:30 at UTC-3, split 60/90.
        let iv = interval("2024-01-01T02:00:00Z", "2024-01-01T04:30:00Z", 4);
        let w = window("2023-12-31", "2024-01-01");
        let segments = partition(&iv, &w);
        assert_eq!(
            segments,
            vec![
                (date("2023-12-31"), StageLabel::Light, 60),
                (date("2024-01-01"), StageLabel::Light, 90),
            ]
        );
    }

    #[test]
    fn interval_spanning_multiple_midnights() {
        // 48h awake interval, UTC-3: 21:00 local jan 1 through 21:00 local jan 3.
        let iv = interval("2024-01-02T00:00:00Z", "2024-01-04T00:00:00Z", 1);
        let w = window("2024-01-01", "2024-01-04");
        let segments = partition(&iv, &w);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], (date("2024-01-01"), StageLabel::Awake, 180));
        assert_eq!(segments[1], (date("2024-01-02"), StageLabel::Awake, 24 * 60));
        assert_eq!(segments[2], (date("2024-01-03"), StageLabel::Awake, 21 * 60));
        let total: i64 = segments.iter().map(|(_, _, m)| m).sum();
        assert_eq!(total, 48 * 60);
    }

    #[test]
    fn interval_is_clipped_to_window() {
        // Only the part after local midnight of jan 1 counts.
        let iv = interval("2024-01-01T02:00:00Z", "2024-01-01T04:30:00Z", 5);
        let w = window("2024-01-01", "2024-01-01");
        let segments = partition(&iv, &w);
        assert_eq!(segments, vec![(date("2024-01-01"), StageLabel::Deep, 90)]);
    }

    #[test]
    fn interval_outside_window_emits_nothing() {
        let iv = interval("2024-02-01T02:00:00Z", "2024-02-01T04:00:00Z", 5);
        let w = window("2024-01-01", "2024-01-02");
        assert!(partition(&iv, &w).is_empty());
    }

    #[test]
    fn sub_minute_segment_emits_nothing() {
        let iv = interval("2024-01-01T12:00:00Z", "2024-01-01T12:00:45Z", 5);
        let w = window("2024-01-01", "2024-01-01");
        assert!(partition(&iv, &w).is_empty());
    }

    #[test]
    fn fractional_seconds_truncate_per_segment() {
        // 23:59:30 -> 00:00:30 local splits into two sub-minute segments,
        // both floored to zero. Up to a minute per boundary is lost by the
        // integer-minute policy.
        let iv = interval("2024-01-02T02:59:30Z", "2024-01-02T03:00:30Z", 6);
        let w = window("2024-01-01", "2024-01-02");
        assert!(partition(&iv, &w).is_empty());
    }

    #[test]
    fn minutes_never_exceed_utc_duration() {
        let iv = interval("2024-01-01T22:41:17Z", "2024-01-02T07:03:44Z", 5);
        let w = window("2024-01-01", "2024-01-02");
        let emitted: i64 = partition(&iv, &w).iter().map(|(_, _, m)| m).sum();
        let duration_minutes = (iv.end_utc - iv.start_utc).num_seconds() / 60;
        assert!(emitted <= duration_minutes);
        // At most one truncated minute per emitted segment.
        assert!(emitted >= duration_minutes - 2);
    }

    #[test]
    fn unknown_stage_code_gets_synthetic_label() {
        let iv = interval("2024-01-01T12:00:00Z", "2024-01-01T13:00:00Z", 42);
        let w = window("2024-01-01", "2024-01-01");
        let segments = partition(&iv, &w);
        assert_eq!(segments, vec![(date("2024-01-01"), StageLabel::Other(42), 60)]);
    }
}
