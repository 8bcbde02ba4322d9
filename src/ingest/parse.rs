use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Trim whitespace and strip one pair of outer quotes.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

/// Finite float, or `None`. `NaN` and infinities count as missing.
pub fn parse_float(raw: &str) -> Option<f64> {
    clean_str(raw)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Integer, also accepting whole-number float text such as `"12.0"`.
pub fn parse_int(raw: &str) -> Option<i64> {
    let s = clean_str(raw);
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Date or date-time text → naive timestamp. Dates land on midnight;
/// RFC 3339 values are converted to UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = clean_str(raw);
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_utc())
}

pub fn parse_timestamp_millis(raw: &str) -> Option<i64> {
    parse_timestamp(raw).map(|dt| dt.and_utc().timestamp_millis())
}

/// Trim, then title-case: the first letter of every alphabetic run is upper
/// case, the rest lower case. `"entire home/apt"` → `"Entire Home/Apt"`.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_alpha = false;
    for ch in raw.trim().chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_cases_room_types() {
        assert_eq!(title_case(" private room "), "Private Room");
        assert_eq!(title_case("entire home/apt"), "Entire Home/Apt");
        assert_eq!(title_case("SHARED ROOM"), "Shared Room");
        assert_eq!(title_case("Hotel room"), "Hotel Room");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn floats_coerce_or_vanish() {
        assert_eq!(parse_float("85.0"), Some(85.0));
        assert_eq!(parse_float(" 120 "), Some(120.0));
        assert_eq!(parse_float("\"42.5\""), Some(42.5));
        assert_eq!(parse_float("$1,200.00"), None);
        assert_eq!(parse_float("abc"), None);
        assert_eq!(parse_float("NaN"), None);
        assert_eq!(parse_float("inf"), None);
        assert_eq!(parse_float(""), None);
    }

    #[test]
    fn ints_accept_whole_floats() {
        assert_eq!(parse_int("12"), Some(12));
        assert_eq!(parse_int("12.0"), Some(12));
        assert_eq!(parse_int("-3"), Some(-3));
        assert_eq!(parse_int("12.5"), None);
        assert_eq!(parse_int("twelve"), None);
    }

    #[test]
    fn timestamps_from_common_layouts() {
        let midnight = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-03-15"), Some(midnight));
        assert_eq!(parse_timestamp("2024/03/15"), Some(midnight));
        assert_eq!(parse_timestamp("2024-03-15 00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2024-03-15T02:00:00+02:00"), Some(midnight));
        assert_eq!(parse_timestamp("2024-02-30"), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("  "), None);
        assert_eq!(
            parse_timestamp_millis("1970-01-02"),
            Some(24 * 60 * 60 * 1000)
        );
    }
}
