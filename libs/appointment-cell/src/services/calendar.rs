use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};

/// Source of "today" for date resolution.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The machine's local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Accepts full and three-letter English weekday names in any case.
pub fn parse_weekday(name: &str) -> Option<Weekday> {
    name.trim().parse().ok()
}

/// The next date strictly after `today` that falls on `target`. Asking for
/// today's own weekday yields the date one week out.
pub fn next_date_for(today: NaiveDate, target: Weekday) -> NaiveDate {
    let current = i64::from(today.weekday().num_days_from_sunday());
    let wanted = i64::from(target.num_days_from_sunday());

    let mut offset = wanted - current;
    if offset <= 0 {
        offset += 7;
    }
    today + Duration::days(offset)
}
