//! Date utilities: day-first statement dates into canonical ISO dates.

use chrono::NaiveDate;

/// Formats tried in order. Indian statements are day-first, so there is no `%m/%d` here.
const DATE_FORMATS: &[&str] = &[
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%d %b, %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
];

/// Two-digit-year variants (`01-04-24`, `01 Apr 24`).
const SHORT_YEAR_FORMATS: &[&str] = &[
    "%d-%m-%y",
    "%d/%m/%y",
    "%d.%m.%y",
    "%d %b %y",
    "%d-%b-%y",
];

/// Parse a statement date such as `01-04-2024`, `06 Nov 2024` or `Nov 06, 2024`.
pub fn parse_statement_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let s = s.replace(" ,", ",");
    if s.is_empty() {
        return None;
    }

    // %Y accepts any digit count, so "05-04-24" must hit the %y formats first or it
    // becomes year 24.
    let trailing_digits = s
        .rsplit(|c: char| !c.is_ascii_digit())
        .next()
        .map(|t| t.len())
        .unwrap_or(0);
    if trailing_digits == 2 {
        for fmt in SHORT_YEAR_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(&s, fmt) {
                return Some(d);
            }
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&s, fmt).ok())
}

/// Canonical ISO representation used in reports.
pub fn to_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_first_numeric() {
        assert_eq!(parse_statement_date("01-04-2024"), Some(ymd(2024, 4, 1)));
        assert_eq!(parse_statement_date("06/11/2024"), Some(ymd(2024, 11, 6)));
        assert_eq!(parse_statement_date("31.12.2023"), Some(ymd(2023, 12, 31)));
    }

    #[test]
    fn test_never_month_first() {
        // 13 can only be a day; 04/13 would need month-first and must fail.
        assert_eq!(parse_statement_date("13/04/2024"), Some(ymd(2024, 4, 13)));
        assert_eq!(parse_statement_date("04/13/2024"), None);
    }

    #[test]
    fn test_two_digit_year() {
        assert_eq!(parse_statement_date("05-04-24"), Some(ymd(2024, 4, 5)));
        assert_eq!(parse_statement_date("05 Apr 24"), Some(ymd(2024, 4, 5)));
    }

    #[test]
    fn test_month_names() {
        assert_eq!(parse_statement_date("Nov 06, 2024"), Some(ymd(2024, 11, 6)));
        assert_eq!(parse_statement_date("06 Nov 2024"), Some(ymd(2024, 11, 6)));
        assert_eq!(parse_statement_date("6 November 2024"), Some(ymd(2024, 11, 6)));
        assert_eq!(parse_statement_date("06-Nov-2024"), Some(ymd(2024, 11, 6)));
        assert_eq!(parse_statement_date("Nov  6 , 2024"), Some(ymd(2024, 11, 6)));
    }

    #[test]
    fn test_iso_passthrough() {
        let d = parse_statement_date("2024-01-02").unwrap();
        assert_eq!(to_iso_date(d), "2024-01-02");
    }

    #[test]
    fn test_garbage() {
        assert_eq!(parse_statement_date(""), None);
        assert_eq!(parse_statement_date("Opening Balance"), None);
    }
}
