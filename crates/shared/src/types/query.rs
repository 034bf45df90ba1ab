//! Lenient parsing of query-string values.
//!
//! Filters and paging knobs never fail a read request: a value that does not
//! parse, or parses outside its allowed range, is treated as absent.

use std::ops::RangeInclusive;
use std::str::FromStr;

/// Parses `raw` as `T`, returning `None` for missing, blank, or malformed input.
#[must_use]
pub fn parse_opt<T: FromStr>(raw: Option<&str>) -> Option<T> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse().ok())
}

/// Parses `raw` and keeps it only when it falls inside `range`; otherwise
/// returns `default`.
#[must_use]
pub fn parse_in_range<T>(raw: Option<&str>, range: RangeInclusive<T>, default: T) -> T
where
    T: FromStr + PartialOrd,
{
    parse_opt(raw)
        .filter(|value| range.contains(value))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn test_parse_opt_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_opt::<Uuid>(Some(&id.to_string())), Some(id));
        assert_eq!(parse_opt::<Uuid>(Some("not-a-uuid")), None);
        assert_eq!(parse_opt::<Uuid>(Some("   ")), None);
        assert_eq!(parse_opt::<Uuid>(None), None);
    }

    #[test]
    fn test_parse_opt_date() {
        assert_eq!(
            parse_opt::<NaiveDate>(Some("2024-03-01")),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(parse_opt::<NaiveDate>(Some("2024-13-01")), None);
    }

    #[test]
    fn test_parse_in_range() {
        assert_eq!(parse_in_range(Some("12"), 1..=60, 12), 12);
        assert_eq!(parse_in_range(Some("61"), 1..=60_u32, 12), 12);
        assert_eq!(parse_in_range(Some("x"), 1..=60_u32, 12), 12);
        assert_eq!(parse_in_range(None, 1..=60_u32, 7), 7);
    }
}
