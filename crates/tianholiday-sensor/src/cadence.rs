//! When the scheduled trigger fires.
//!
//! Two models are supported: a fixed local wall-clock time every day, or a
//! rolling interval measured from the previous trigger.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, TimeDelta, TimeZone};

/// Shortest interval accepted by [`Cadence::Every`].
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Recurrence of the scheduled trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Fire once a day at the given local time.
    DailyAt(NaiveTime),
    /// Fire at a fixed interval.
    Every(Duration),
}

impl Default for Cadence {
    /// Daily at 00:01, just after the date rolls over.
    fn default() -> Self {
        Self::DailyAt(NaiveTime::from_hms_opt(0, 1, 0).unwrap_or_default())
    }
}

impl Cadence {
    /// Daily cadence at `hour:minute`, or `None` if out of range.
    pub fn daily_at(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self::DailyAt)
    }

    /// Interval cadence in whole hours.
    pub fn every_hours(hours: u64) -> Self {
        Self::Every(Duration::from_secs(hours.saturating_mul(3600)))
    }

    /// Returns the next firing time strictly after `now`.
    pub fn next_fire<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        match self {
            Self::DailyAt(at) => next_daily_fire(now, *at),
            Self::Every(interval) => {
                let step = TimeDelta::from_std((*interval).max(MIN_INTERVAL))
                    .unwrap_or(TimeDelta::days(1));
                now.clone()
                    .checked_add_signed(step)
                    .unwrap_or_else(|| a_day_after(now))
            }
        }
    }

    /// Returns how long to wait from `now` until the next firing time.
    pub fn delay_from<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Duration {
        match self {
            Self::Every(interval) => (*interval).max(MIN_INTERVAL),
            Self::DailyAt(_) => self
                .next_fire(now)
                .signed_duration_since(now)
                .to_std()
                .unwrap_or(MIN_INTERVAL),
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DailyAt(at) => write!(f, "daily at {}", at.format("%H:%M")),
            Self::Every(interval) => {
                let secs = interval.as_secs();
                if secs > 0 && secs % 3600 == 0 {
                    write!(f, "every {}h", secs / 3600)
                } else {
                    write!(f, "every {}s", secs)
                }
            }
        }
    }
}

/// Next occurrence of local time `at` strictly after `now`.
///
/// Local times skipped by a DST jump are ignored for that day; ambiguous ones
/// resolve to the earlier instant.
pub fn next_daily_fire<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let today = now.date_naive();
    for offset in 0..=2 {
        let Some(day) = today.checked_add_days(Days::new(offset)) else {
            break;
        };
        if let Some(candidate) = tz.from_local_datetime(&day.and_time(at)).earliest()
            && candidate > *now
        {
            return candidate;
        }
    }
    a_day_after(now)
}

/// `now` plus one day, or `now` itself at the end of the representable range.
fn a_day_after<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    now.clone()
        .checked_add_signed(TimeDelta::days(1))
        .unwrap_or_else(|| now.clone())
}
