//! Read-only views derived from the session log.
//!
//! Every function here is pure over a log snapshot. Calendar grouping uses
//! the time zone of the `now` value passed in, so callers decide whose
//! "today" it is (the CLI passes `Local::now()`).

mod types;

pub use types::{AllTimeTotals, CategorySlice, DayBucket, Report};

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};

use crate::{
    models::SessionRecord,
    store::SessionLog,
    utils::round_minutes,
};

/// Number of days in the trend view, ending today.
pub const TREND_DAYS: i64 = 7;

/// Maximum number of categories shown in the breakdown.
pub const MAX_CATEGORIES: usize = 6;

fn local_date<Tz: TimeZone>(record: &SessionRecord, tz: &Tz) -> NaiveDate {
    record.date.with_timezone(tz).date_naive()
}

fn focused_on<Tz: TimeZone>(log: &[SessionRecord], day: NaiveDate, tz: &Tz) -> u64 {
    log.iter()
        .filter(|record| local_date(record, tz) == day)
        .map(|record| u64::from(record.focused_seconds))
        .sum()
}

/// Focused seconds recorded on the same calendar date as `now`.
pub fn today<Tz: TimeZone>(log: &[SessionRecord], now: &DateTime<Tz>) -> u64 {
    focused_on(log, now.date_naive(), &now.timezone())
}

pub fn all_time(log: &[SessionRecord]) -> AllTimeTotals {
    log.iter().fold(AllTimeTotals::default(), |mut totals, record| {
        totals.focused_seconds += u64::from(record.focused_seconds);
        totals.distractions += u64::from(record.distractions);
        totals
    })
}

/// Per-day focused minutes for the seven days ending at `now`, oldest first.
pub fn last_7_days<Tz: TimeZone>(log: &[SessionRecord], now: &DateTime<Tz>) -> Vec<DayBucket> {
    let tz = now.timezone();
    let today = now.date_naive();

    (0..TREND_DAYS)
        .rev()
        .map(|days_ago| {
            let date = today - Duration::days(days_ago);
            DayBucket {
                date,
                label: date.format("%d/%m").to_string(),
                minutes: round_minutes(focused_on(log, date, &tz)),
            }
        })
        .collect()
}

/// Top categories by focused minutes with their share of the shown total.
pub fn by_category(log: &[SessionRecord]) -> Vec<CategorySlice> {
    // First-seen order breaks ties between equal totals.
    let mut groups: Vec<(String, u64)> = Vec::new();
    for record in log {
        let name = record.category_label();
        let seconds = u64::from(record.focused_seconds);
        match groups.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, total)) => *total += seconds,
            None => groups.push((name, seconds)),
        }
    }

    let mut shown: Vec<(String, u64)> = groups
        .into_iter()
        .map(|(name, seconds)| (name, round_minutes(seconds)))
        .filter(|(_, minutes)| *minutes > 0)
        .collect();
    shown.sort_by(|a, b| b.1.cmp(&a.1));
    shown.truncate(MAX_CATEGORIES);

    let shown_total: u64 = shown.iter().map(|(_, minutes)| minutes).sum();

    shown
        .into_iter()
        .enumerate()
        .map(|(rank, (name, minutes))| CategorySlice {
            percentage: minutes as f64 * 100.0 / shown_total as f64,
            name,
            minutes,
            rank,
        })
        .collect()
}

/// Records newest first, the order the history list shows them in.
pub fn recent_first(log: &[SessionRecord]) -> Vec<SessionRecord> {
    log.iter().rev().cloned().collect()
}

pub fn build_report<Tz: TimeZone>(log: &[SessionRecord], now: &DateTime<Tz>) -> Report {
    Report {
        session_count: log.len(),
        today_seconds: today(log, now),
        all_time: all_time(log),
        last_7_days: last_7_days(log, now),
        by_category: by_category(log),
    }
}

/// Reporting surface over the persisted log.
#[derive(Clone)]
pub struct Reports {
    log: SessionLog,
}

impl Reports {
    pub fn new(log: SessionLog) -> Self {
        Self { log }
    }

    pub async fn report(&self) -> Report {
        let records = self.log.read_all().await;
        build_report(&records, &Local::now())
    }

    pub async fn history(&self) -> Vec<SessionRecord> {
        recent_first(&self.log.read_all().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn at(now: &DateTime<FixedOffset>, hours_ago: i64, seconds: u32, category: &str) -> SessionRecord {
        let date = (*now - Duration::hours(hours_ago)).with_timezone(&Utc);
        SessionRecord::new(date, seconds, 0, category)
    }

    fn noon() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 17, 12, 0, 0)
            .unwrap()
    }

    #[test]
    fn today_uses_the_callers_calendar() {
        let now = noon();
        let log = vec![
            at(&now, 1, 600, "Study"),
            // 01:00 local, 22:00 UTC the previous day.
            at(&now, 11, 300, "Study"),
            // 23:00 local yesterday.
            at(&now, 13, 900, "Study"),
        ];

        assert_eq!(today(&log, &now), 900);
    }

    #[test]
    fn all_time_sums_focus_and_distractions() {
        let now = noon();
        let mut log = vec![at(&now, 1, 600, "Study"), at(&now, 200, 120, "Coding")];
        log[0].distractions = 2;
        log[1].distractions = 3;

        assert_eq!(
            all_time(&log),
            AllTimeTotals {
                focused_seconds: 720,
                distractions: 5
            }
        );
        assert_eq!(all_time(&[]), AllTimeTotals::default());
    }

    #[test]
    fn ninety_seconds_today_rounds_to_two_minutes() {
        let now = noon();
        let log = vec![at(&now, 0, 90, "Study")];

        let buckets = last_7_days(&log, &now);
        let minutes: Vec<u64> = buckets.iter().map(|bucket| bucket.minutes).collect();
        assert_eq!(minutes, vec![0, 0, 0, 0, 0, 0, 2]);
        assert_eq!(buckets[6].label, "17/10");
        assert_eq!(buckets[0].label, "11/10");
    }

    #[test]
    fn trend_ignores_sessions_older_than_a_week() {
        let now = noon();
        let log = vec![
            at(&now, 24 * 7, 3_600, "Study"),
            at(&now, 24 * 6, 1_200, "Study"),
            at(&now, 24, 300, "Study"),
        ];

        let minutes: Vec<u64> = last_7_days(&log, &now).iter().map(|b| b.minutes).collect();
        assert_eq!(minutes, vec![20, 0, 0, 0, 0, 5, 0]);
    }

    #[test]
    fn trend_labels_cross_month_boundaries() {
        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 2, 8, 0, 0)
            .unwrap();
        let labels: Vec<String> = last_7_days(&[], &now).into_iter().map(|b| b.label).collect();
        assert_eq!(labels, vec!["24/02", "25/02", "26/02", "27/02", "28/02", "01/03", "02/03"]);
    }

    #[test]
    fn category_breakdown_drops_empty_groups() {
        let now = noon();
        let log = vec![
            at(&now, 3, 120, "A"),
            at(&now, 2, 60, "B"),
            at(&now, 1, 0, "C"),
        ];

        let slices = by_category(&log);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].name, "A");
        assert_eq!(slices[0].minutes, 2);
        assert_eq!(slices[0].rank, 0);
        assert_eq!(slices[1].name, "B");
        assert_eq!(slices[1].minutes, 1);
        assert_eq!(slices[1].rank, 1);
        assert_eq!(slices[0].rounded_percentage(), 67);
        assert_eq!(slices[1].rounded_percentage(), 33);
    }

    #[test]
    fn category_breakdown_keeps_top_six_and_normalizes_blank() {
        let now = noon();
        let mut log: Vec<SessionRecord> = (1..=8)
            .map(|i| at(&now, i, (i as u32) * 600, &format!("cat-{i}")))
            .collect();
        log.push(at(&now, 9, 300, "   "));
        let mut missing = at(&now, 10, 300, "ignored");
        missing.category = None;
        log.push(missing);

        let slices = by_category(&log);
        let names: Vec<&str> = slices.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["cat-8", "cat-7", "cat-6", "cat-5", "cat-4", "cat-3"]);

        let total: f64 = slices.iter().map(|s| s.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);

        let general = by_category(&log[8..]);
        assert_eq!(general.len(), 1);
        assert_eq!(general[0].name, "General");
        assert_eq!(general[0].minutes, 10);
        assert_eq!(general[0].rounded_percentage(), 100);
    }

    #[test]
    fn history_is_newest_first() {
        let now = noon();
        let log = vec![at(&now, 3, 60, "A"), at(&now, 2, 60, "B"), at(&now, 1, 60, "C")];

        let names: Vec<String> = recent_first(&log).iter().map(|r| r.category_label()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
    }

    #[test]
    fn report_bundles_every_view() {
        let now = noon();
        let log = vec![at(&now, 1, 90, "Study"), at(&now, 30, 600, "Coding")];

        let report = build_report(&log, &now);
        assert_eq!(report.session_count, 2);
        assert_eq!(report.today_seconds, 90);
        assert_eq!(report.all_time.focused_seconds, 690);
        assert_eq!(report.last_7_days.len(), 7);
        assert_eq!(report.by_category[0].name, "Coding");
    }
}
