//! Date helper functions

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Display language for dates and relative times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    ZhCn,
}

impl Language {
    /// Map a config language tag (`en`, `zh-CN`, `zh_Hans`, ...) to a display language
    pub fn from_tag(tag: &str) -> Self {
        if tag.trim().to_ascii_lowercase().starts_with("zh") {
            Language::ZhCn
        } else {
            Language::En
        }
    }

    /// Canonical tag for the language, as used by the translation tables
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::ZhCn => "zh-CN",
        }
    }
}

/// Coarse distance between a timestamp and "now", in whole days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeTime {
    Today,
    Yesterday,
    Days(i64),
    Weeks(i64),
    Months(i64),
    Years(i64),
}

/// Bucket the distance from `date` to `now`.
///
/// Timestamps in the future count as today.
pub fn relative_time<Tz: TimeZone, Tz2: TimeZone>(
    date: &DateTime<Tz>,
    now: &DateTime<Tz2>,
) -> RelativeTime {
    let days = now
        .clone()
        .signed_duration_since(date.clone())
        .num_days()
        .max(0);

    match days {
        0 => RelativeTime::Today,
        1 => RelativeTime::Yesterday,
        d if d < 7 => RelativeTime::Days(d),
        d if d < 30 => RelativeTime::Weeks(d / 7),
        d if d < 365 => RelativeTime::Months(d / 30),
        d => RelativeTime::Years(d / 365),
    }
}

/// Get relative time (like "3 days ago")
pub fn time_ago<Tz: TimeZone, Tz2: TimeZone>(
    date: &DateTime<Tz>,
    now: &DateTime<Tz2>,
    language: Language,
) -> String {
    let relative = relative_time(date, now);
    match language {
        Language::En => match relative {
            RelativeTime::Today => "today".to_string(),
            RelativeTime::Yesterday => "yesterday".to_string(),
            RelativeTime::Days(n) => format!("{} days ago", n),
            RelativeTime::Weeks(1) => "a week ago".to_string(),
            RelativeTime::Weeks(n) => format!("{} weeks ago", n),
            RelativeTime::Months(1) => "a month ago".to_string(),
            RelativeTime::Months(n) => format!("{} months ago", n),
            RelativeTime::Years(1) => "a year ago".to_string(),
            RelativeTime::Years(n) => format!("{} years ago", n),
        },
        Language::ZhCn => match relative {
            RelativeTime::Today => "今天".to_string(),
            RelativeTime::Yesterday => "昨天".to_string(),
            RelativeTime::Days(n) => format!("{}天前", n),
            RelativeTime::Weeks(n) => format!("{}周前", n),
            RelativeTime::Months(n) => format!("{}个月前", n),
            RelativeTime::Years(n) => format!("{}年前", n),
        },
    }
}

/// Format a date using Moment.js-compatible format string
///
/// # Examples
/// ```ignore
/// format_date(&date, "YYYY-MM-DD") // -> "2024-01-15"
/// ```
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let chrono_format = moment_to_chrono_format(format);
    date.format(&chrono_format).to_string()
}

/// Long date for detail pages ("January 15, 2024" / "2024年1月15日")
pub fn format_date_long<Tz: TimeZone>(date: &DateTime<Tz>, language: Language) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match language {
        Language::En => date.format("%B %-d, %Y").to_string(),
        Language::ZhCn => format!("{}年{}月{}日", date.year(), date.month(), date.day()),
    }
}

/// Short date for compact listings ("Jan 15" / "1月15日")
pub fn format_date_short<Tz: TimeZone>(date: &DateTime<Tz>, language: Language) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match language {
        Language::En => date.format("%b %-d").to_string(),
        Language::ZhCn => format!("{}月{}日", date.month(), date.day()),
    }
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

/// Parse a date string in the formats posts are written with.
///
/// Strings without an offset are read as UTC.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0)?));
        }
    }

    None
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    let replacements = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("mm", "%M"),
        ("ss", "%S"),
    ];

    let mut result = format.to_string();
    for (from, to) in replacements {
        result = result.replace(from, to);
    }
    result
}
