//! # Time windows
//!
//! Named half-open intervals `[start, end)` derived from one captured `now`.
//! Calendar boundaries are UTC midnights. Nothing here holds state; every
//! run recomputes its windows from scratch.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::item::Item;

/// Window definitions as they appear in configuration, e.g.
/// `window = { kind = "rolling_hours", hours = 24 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowKind {
    RollingHours { hours: u32 },
    LastDays { days: u32 },
    MonthToDate,
    QuarterToDate,
    YearToDate,
    /// `[Jan 1 year, Jan 1 year+1)`
    CalendarYear { year: i32 },
    /// Yesterday and today, stretched back to Friday over the weekend.
    WorkdayRollup,
}

impl WindowKind {
    /// Short stable name, used in logs and by `digest windows`.
    pub fn name(&self) -> String {
        match self {
            WindowKind::RollingHours { hours } => format!("last_{hours}h"),
            WindowKind::LastDays { days } => format!("last_{days}d"),
            WindowKind::MonthToDate => "month_to_date".into(),
            WindowKind::QuarterToDate => "quarter_to_date".into(),
            WindowKind::YearToDate => "year_to_date".into(),
            WindowKind::CalendarYear { year } => format!("year_{year}"),
            WindowKind::WorkdayRollup => "workday_rollup".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn contains(&self, t: &DateTime<Utc>) -> bool {
        self.start <= *t && *t < self.end
    }

    /// Items inside the window, in their input order.
    pub fn slice<'a>(&self, items: &'a [Item]) -> Vec<&'a Item> {
        items.iter().filter(|it| self.contains(&it.published)).collect()
    }
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Days before today's midnight that the workday rollup reaches back.
fn workday_lookback_days(weekday: Weekday) -> i64 {
    match weekday {
        Weekday::Sat => 1,
        Weekday::Sun => 2,
        Weekday::Mon => 3,
        _ => 1,
    }
}

/// Resolves window kinds against one `now`. Build one per run and pass it
/// around so every window agrees on the same instant.
#[derive(Debug, Clone, Copy)]
pub struct WindowSelector {
    now: DateTime<Utc>,
}

impl WindowSelector {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn resolve(&self, kind: WindowKind) -> Window {
        let now = self.now;
        let today = now.date_naive();
        let (start, end) = match kind {
            WindowKind::RollingHours { hours } => (now - Duration::hours(hours as i64), now),
            WindowKind::LastDays { days } => (now - Duration::days(days as i64), now),
            WindowKind::MonthToDate => {
                let first = today.with_day(1).unwrap_or(today);
                (day_start(first), now)
            }
            WindowKind::QuarterToDate => {
                let month = (today.month0() / 3) * 3 + 1;
                let first = NaiveDate::from_ymd_opt(today.year(), month, 1).unwrap_or(today);
                (day_start(first), now)
            }
            WindowKind::YearToDate => {
                let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                (day_start(first), now)
            }
            WindowKind::CalendarYear { year } => {
                match (
                    NaiveDate::from_ymd_opt(year, 1, 1),
                    NaiveDate::from_ymd_opt(year.saturating_add(1), 1, 1),
                ) {
                    (Some(a), Some(b)) => (day_start(a), day_start(b)),
                    _ => {
                        tracing::warn!(year, "calendar year out of range, window is empty");
                        (now, now)
                    }
                }
            }
            WindowKind::WorkdayRollup => {
                let back = workday_lookback_days(today.weekday());
                (day_start(today) - Duration::days(back), now)
            }
        };
        Window {
            name: kind.name(),
            start,
            end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 30, 0).unwrap()
    }

    fn midnight(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn workday_rollup_carries_weekend_forward() {
        // 2026-10-19 is a Monday.
        let mon = at(2026, 10, 19, 9);
        let w = WindowSelector::new(mon).resolve(WindowKind::WorkdayRollup);
        assert_eq!(w.start, midnight(2026, 10, 16));
        assert_eq!(w.start, midnight(2026, 10, 19) - Duration::days(3));
        assert_eq!(w.end, mon);

        let sun = at(2026, 10, 18, 9);
        let w = WindowSelector::new(sun).resolve(WindowKind::WorkdayRollup);
        assert_eq!(w.start, midnight(2026, 10, 16));

        let sat = at(2026, 10, 17, 9);
        let w = WindowSelector::new(sat).resolve(WindowKind::WorkdayRollup);
        assert_eq!(w.start, midnight(2026, 10, 16));

        let tue = at(2026, 10, 20, 9);
        let w = WindowSelector::new(tue).resolve(WindowKind::WorkdayRollup);
        assert_eq!(w.start, midnight(2026, 10, 19));
    }

    #[test]
    fn to_date_windows_start_at_calendar_boundaries() {
        let sel = WindowSelector::new(at(2026, 8, 14, 15));
        assert_eq!(sel.resolve(WindowKind::MonthToDate).start, midnight(2026, 8, 1));
        assert_eq!(sel.resolve(WindowKind::QuarterToDate).start, midnight(2026, 7, 1));
        assert_eq!(sel.resolve(WindowKind::YearToDate).start, midnight(2026, 1, 1));

        let q1 = WindowSelector::new(at(2026, 3, 31, 23));
        assert_eq!(q1.resolve(WindowKind::QuarterToDate).start, midnight(2026, 1, 1));
        let q4 = WindowSelector::new(at(2026, 12, 1, 0));
        assert_eq!(q4.resolve(WindowKind::QuarterToDate).start, midnight(2026, 10, 1));
    }

    #[test]
    fn calendar_year_is_half_open() {
        let w = WindowSelector::new(at(2026, 10, 19, 9)).resolve(WindowKind::CalendarYear { year: 2025 });
        assert!(w.contains(&midnight(2025, 1, 1)));
        assert!(w.contains(&(midnight(2026, 1, 1) - Duration::seconds(1))));
        assert!(!w.contains(&midnight(2026, 1, 1)));
        assert_eq!(w.name, "year_2025");
    }

    #[test]
    fn rolling_windows_share_one_now() {
        let now = at(2026, 10, 19, 12);
        let sel = WindowSelector::new(now);
        let h24 = sel.resolve(WindowKind::RollingHours { hours: 24 });
        let d7 = sel.resolve(WindowKind::LastDays { days: 7 });
        assert_eq!(h24.end, d7.end);
        assert_eq!(h24.start, now - Duration::hours(24));
        assert_eq!(d7.start, now - Duration::days(7));
        assert!(!h24.contains(&now));
    }

    #[test]
    fn slice_keeps_only_items_inside() {
        use crate::item::ItemType;
        let now = at(2026, 10, 19, 12);
        let items = vec![
            Item::new("a", "https://x.test/a", "P", ItemType::Article, now - Duration::hours(2)),
            Item::new("b", "https://x.test/b", "P", ItemType::Article, now - Duration::hours(30)),
        ];
        let w = WindowSelector::new(now).resolve(WindowKind::RollingHours { hours: 24 });
        let got: Vec<_> = w.slice(&items).into_iter().map(|i| i.title.as_str()).collect();
        assert_eq!(got, vec!["a"]);
    }

    #[test]
    fn kinds_deserialize_from_toml_tables() {
        #[derive(Deserialize)]
        struct W {
            window: WindowKind,
        }
        let w: W = toml::from_str(r#"window = { kind = "rolling_hours", hours = 60 }"#).unwrap();
        assert_eq!(w.window, WindowKind::RollingHours { hours: 60 });
        let w: W = toml::from_str(r#"window = { kind = "workday_rollup" }"#).unwrap();
        assert_eq!(w.window, WindowKind::WorkdayRollup);
    }
}
