//! Next-trigger computation for outreach schedules.
//!
//! All arithmetic happens on the schedule's local wall clock, expressed as a
//! fixed UTC offset (no DST), and the result is converted back to UTC.

use chrono::{
    DateTime,
    Datelike,
    Days,
    FixedOffset,
    Months,
    NaiveDate,
    NaiveDateTime,
    NaiveTime,
    TimeDelta,
    TimeZone,
    Utc,
    Weekday,
};

use crate::enums::RecurrenceType;

#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceRule {
    pub kind: RecurrenceType,
    /// Always >= 1.
    pub interval: u32,
    pub time: NaiveTime,
    /// Only meaningful for weekly rules. Empty means "every `interval` weeks".
    pub weekdays: Vec<Weekday>,
    /// Only meaningful for monthly rules. Stored schedules always carry one;
    /// `None` falls back to today's day, which drifts once a month clamps it.
    pub day_of_month: Option<u32>,
    pub offset: FixedOffset,
}

/// Compute the next trigger instant strictly after `now`.
///
/// Returns `None` for `once` rules, which never fire again.
///
/// Monthly rules whose configured day does not exist in the target month are
/// clamped to that month's last day (the 31st becomes Feb 28/29, Apr 30, ...).
pub fn next_trigger(rule: &RecurrenceRule, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let local_now = now.with_timezone(&rule.offset).naive_local();
    let today = local_now.date();
    let interval = rule.interval.max(1);

    let next_local = match rule.kind {
        RecurrenceType::Once => {
            return None;
        }
        RecurrenceType::Daily => {
            let candidate = today.and_time(rule.time);
            if candidate > local_now {
                candidate
            } else {
                today.checked_add_days(Days::new(interval as u64))?.and_time(rule.time)
            }
        }
        RecurrenceType::Weekly => next_weekly(rule, interval, today, local_now)?,
        RecurrenceType::Monthly => next_monthly(rule, interval, today, local_now)?,
    };

    Some(to_utc(next_local, rule.offset))
}

fn next_weekly(
    rule: &RecurrenceRule,
    interval: u32,
    today: NaiveDate,
    local_now: NaiveDateTime
) -> Option<NaiveDateTime> {
    if rule.weekdays.is_empty() {
        let candidate = today.and_time(rule.time);
        if candidate > local_now {
            return Some(candidate);
        }
        let next_day = today.checked_add_days(Days::new(7 * (interval as u64)))?;
        return Some(next_day.and_time(rule.time));
    }

    // Today + 7 shares today's weekday, so a match always exists in this window
    (0..=7u64)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .map(|day| day.and_time(rule.time))
        .find(|candidate| rule.weekdays.contains(&candidate.weekday()) && *candidate > local_now)
}

fn next_monthly(
    rule: &RecurrenceRule,
    interval: u32,
    today: NaiveDate,
    local_now: NaiveDateTime
) -> Option<NaiveDateTime> {
    let day = rule.day_of_month.unwrap_or_else(|| today.day());

    let this_month = clamped_date(today.year(), today.month(), day)?.and_time(rule.time);
    if this_month > local_now {
        return Some(this_month);
    }

    let target = today.with_day(1)?.checked_add_months(Months::new(interval))?;
    Some(clamped_date(target.year(), target.month(), day)?.and_time(rule.time))
}

fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let last = last_day_of_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.clamp(1, last))
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let next_month = NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_months(Months::new(1))?;
    Some(next_month.pred_opt()?.day())
}

fn to_utc(local: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    let utc = local - TimeDelta::seconds(offset.local_minus_utc() as i64);
    Utc.from_utc_datetime(&utc)
}

/// Midnight of the local calendar day containing `now`, as a UTC instant.
pub fn start_of_local_day(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let today = now.with_timezone(&offset).date_naive();
    to_utc(today.and_time(NaiveTime::MIN), offset)
}

/// Parse `±HH:MM`, `±HHMM`, `±HH`, `UTC` or `Z` into a fixed offset.
pub fn parse_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("utc") || value.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match value.chars().next()? {
        '+' => (1, &value[1..]),
        '-' => (-1, &value[1..]),
        _ => {
            return None;
        }
    };

    let digits: String = rest
        .chars()
        .filter(|c| *c != ':')
        .collect();
    if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().ok()?, 0),
        3 => (digits[..1].parse::<i32>().ok()?, digits[1..].parse::<i32>().ok()?),
        _ => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
    };

    if hours > 14 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parse a `HH:MM` or `HH:MM:SS` time of day.
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// Map a 0 = Sunday .. 6 = Saturday index to a weekday.
pub fn weekday_from_index(index: i64) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}
