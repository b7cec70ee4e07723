use std::path::Path;

use chrono::NaiveDate;
use encoding_rs::WINDOWS_1252;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Raw text reading
// ---------------------------------------------------------------------------

/// Read a file declared as ISO-8859-1 by its institution. Decoded as
/// Windows-1252, the practical superset browsers use for that label.
pub fn read_latin1(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let (text, _, _) = WINDOWS_1252.decode(&bytes);
    Ok(text.into_owned())
}

pub fn read_utf8(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

// ---------------------------------------------------------------------------
// French numerals and day-first dates
// ---------------------------------------------------------------------------

/// Parse a French-locale amount: `,` as decimal separator, space (regular or
/// non-breaking) as thousands separator, e.g. "-123 456,78".
pub fn parse_fr_amount(raw: &str) -> Option<f64> {
    let s: String = raw
        .trim()
        .replace([' ', '\u{a0}'], "")
        .replace(',', ".");
    if s.is_empty() {
        return None;
    }
    s.parse().ok()
}

/// Parse a plain decimal amount, tolerating surrounding whitespace.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    s.parse().ok()
}

/// Parse a day-first date: "05/06/2019" -> 2019-06-05.
pub fn parse_date_dmy(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y").ok()
}

/// Parse a date that may be ISO ("2019-08-30") or day-first ("30/08/2019");
/// Boursorama switched formats over time.
pub fn parse_date_flex(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
        .ok()
}

/// Parse a timestamp ("2021-01-05 14:00:41") or bare date, truncating any
/// time-of-day to the calendar date.
pub fn parse_datetime_as_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fr_amount() {
        assert_eq!(parse_fr_amount("67,97"), Some(67.97));
        assert_eq!(parse_fr_amount("-123 456,78"), Some(-123456.78));
        assert_eq!(parse_fr_amount("1 000,00"), Some(1000.0));
        assert_eq!(parse_fr_amount(" 45"), Some(45.0));
        assert_eq!(parse_fr_amount(""), None);
        assert_eq!(parse_fr_amount("-"), None);
    }

    #[test]
    fn test_parse_date_dmy() {
        assert_eq!(
            parse_date_dmy("05/06/2019"),
            NaiveDate::from_ymd_opt(2019, 6, 5)
        );
        assert_eq!(parse_date_dmy("31/02/2019"), None);
        assert_eq!(parse_date_dmy("2019-06-05"), None);
    }

    #[test]
    fn test_parse_date_flex() {
        assert_eq!(
            parse_date_flex("2019-08-30"),
            NaiveDate::from_ymd_opt(2019, 8, 30)
        );
        assert_eq!(
            parse_date_flex("30/08/2019"),
            NaiveDate::from_ymd_opt(2019, 8, 30)
        );
    }

    #[test]
    fn test_parse_datetime_as_date() {
        assert_eq!(
            parse_datetime_as_date("2021-01-05 14:00:41"),
            NaiveDate::from_ymd_opt(2021, 1, 5)
        );
        assert_eq!(
            parse_datetime_as_date("2021-01-05"),
            NaiveDate::from_ymd_opt(2021, 1, 5)
        );
        assert_eq!(parse_datetime_as_date("garbage"), None);
    }
}
