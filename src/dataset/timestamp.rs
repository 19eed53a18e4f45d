//! Lenient timestamp parsing for the `taken_dt` / `upload_dt` columns.
//!
//! Exports come from different tools, so a handful of layouts are accepted.
//! Anything unrecognised becomes `None` instead of failing the load.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Layouts tried in order after RFC 3339. `%.f` also matches no fraction.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y:%m:%d %H:%M:%S", // EXIF DateTimeOriginal
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a timestamp cell. Offsets are converted to UTC and dropped.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.naive_utc());
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}
