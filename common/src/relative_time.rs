use chrono::{DateTime, Datelike, Timelike, Utc};

const MINUTES_IN_HOUR: i64 = 60;
const MINUTES_IN_DAY: i64 = 1_440;
const MINUTES_IN_ALMOST_TWO_DAYS: i64 = 2_520;
const MINUTES_IN_MONTH: i64 = 43_200;
const MINUTES_IN_TWO_MONTHS: i64 = 86_400;

/// Distance between two instants in words, e.g. "about 3 hours".
///
/// Symmetric: the order of the arguments does not matter.
pub fn distance_in_words(a: DateTime<Utc>, b: DateTime<Utc>) -> String {
    let (earlier, later) = if a <= b { (a, b) } else { (b, a) };
    let seconds = (later - earlier).num_seconds();
    let minutes = round_div(seconds, 60);

    if minutes < 2 {
        return if minutes == 0 {
            "less than a minute".into()
        } else {
            "1 minute".into()
        };
    }
    if minutes < 45 {
        return format!("{minutes} minutes");
    }
    if minutes < 90 {
        return "about 1 hour".into();
    }
    if minutes < MINUTES_IN_DAY {
        let hours = round_div(minutes, MINUTES_IN_HOUR);
        return format!("about {hours} hours");
    }
    if minutes < MINUTES_IN_ALMOST_TWO_DAYS {
        return "1 day".into();
    }
    if minutes < MINUTES_IN_MONTH {
        let days = round_div(minutes, MINUTES_IN_DAY);
        return format!("{days} days");
    }
    if minutes < MINUTES_IN_TWO_MONTHS {
        let months = round_div(minutes, MINUTES_IN_MONTH);
        return plural(months, "about 1 month", |n| format!("about {n} months"));
    }

    let months = months_between(earlier, later);
    if months < 12 {
        let nearest = round_div(minutes, MINUTES_IN_MONTH).max(1);
        return plural(nearest, "1 month", |n| format!("{n} months"));
    }

    let years = months / 12;
    match months % 12 {
        0..=2 => plural(years, "about 1 year", |n| format!("about {n} years")),
        3..=8 => plural(years, "over 1 year", |n| format!("over {n} years")),
        _ => format!("almost {} years", years + 1),
    }
}

fn plural(n: i64, one: &str, many: impl FnOnce(i64) -> String) -> String {
    if n == 1 {
        one.to_string()
    } else {
        many(n)
    }
}

/// Rounds half away from zero; inputs here are never negative.
fn round_div(n: i64, d: i64) -> i64 {
    (n + d / 2) / d
}

/// Whole calendar months from `earlier` to `later`.
fn months_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    let mut months = (later.year() as i64 - earlier.year() as i64) * 12
        + (later.month() as i64 - earlier.month() as i64);
    let later_in_month = (later.day(), later.num_seconds_from_midnight());
    let earlier_in_month = (earlier.day(), earlier.num_seconds_from_midnight());
    if months > 0 && later_in_month < earlier_in_month {
        months -= 1;
    }
    months
}
