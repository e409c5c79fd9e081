//! Point-in-time validity of cadastral records
//!
//! Registry records carry a business validity interval (`virkningFra`/`virkningTil`)
//! and a registration interval (`registreringFra`/`registreringTil`). A record
//! is current when both intervals have started on or before the reference date
//! and neither has a readable end date.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// The four interval bounds of a registry record, as captured from JSON
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidityWindow {
    pub virkning_fra: Option<String>,
    pub virkning_til: Option<String>,
    pub registrering_fra: Option<String>,
    pub registrering_til: Option<String>,
}

impl ValidityWindow {
    /// Currently effective and not superseded as of `reference_date`
    ///
    /// Both start bounds must be present, parseable and on or before the
    /// reference date (calendar date only). Neither end bound may hold a
    /// parseable date; empty or unreadable end bounds count as open.
    pub fn is_current(&self, reference_date: NaiveDate) -> bool {
        let ended = |bound: &Option<String>| {
            bound.as_deref().and_then(parse_registry_date).is_some()
        };
        if ended(&self.virkning_til) || ended(&self.registrering_til) {
            return false;
        }

        let started = |bound: &Option<String>| {
            bound
                .as_deref()
                .and_then(parse_registry_date)
                .is_some_and(|date| date <= reference_date)
        };

        started(&self.virkning_fra) && started(&self.registrering_fra)
    }
}

/// Parse the date part of a registry timestamp
///
/// Accepts RFC 3339 timestamps (`2019-03-07T10:11:12.345678+01:00`), naive
/// timestamps with or without fractional seconds, and plain dates. Offset
/// timestamps keep the calendar date of their own offset.
pub fn parse_registry_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(timestamp.date());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn window(fra: &str, til: Option<&str>, reg_fra: &str, reg_til: Option<&str>) -> ValidityWindow {
        ValidityWindow {
            virkning_fra: Some(fra.to_string()),
            virkning_til: til.map(str::to_string),
            registrering_fra: Some(reg_fra.to_string()),
            registrering_til: reg_til.map(str::to_string),
        }
    }

    #[test]
    fn test_started_yesterday_open_ended_is_current() {
        let yesterday = (today() - Duration::days(1)).format("%Y-%m-%dT08:00:00.000000Z").to_string();

        assert!(window(&yesterday, None, &yesterday, None).is_current(today()));
    }

    #[test]
    fn test_ended_record_is_excluded() {
        let w = window(
            "2020-01-01T00:00:00Z",
            Some("2023-01-01T00:00:00Z"),
            "2020-01-01T00:00:00Z",
            None,
        );
        assert!(!w.is_current(today()));

        // A future end date still marks the record as superseded
        let w = window("2020-01-01", None, "2020-01-01", Some("2030-01-01"));
        assert!(!w.is_current(today()));
    }

    #[test]
    fn test_unreadable_end_is_treated_as_open() {
        let w = window(
            "2020-01-01T00:00:00Z",
            None,
            "2020-01-01T00:00:00Z",
            Some("not a date"),
        );
        assert!(w.is_current(today()));

        let w = window("2020-01-01", Some(""), "2020-01-01", None);
        assert!(w.is_current(today()));

        let w = window("2020-01-01", Some("  "), "2020-01-01", Some(""));
        assert!(w.is_current(today()));
    }

    #[test]
    fn test_future_start_is_excluded() {
        let w = window("2024-06-16T00:00:00Z", None, "2020-01-01T00:00:00Z", None);
        assert!(!w.is_current(today()));

        let w = window("2020-01-01T00:00:00Z", None, "2024-06-16T00:00:00Z", None);
        assert!(!w.is_current(today()));
    }

    #[test]
    fn test_start_on_reference_day_counts_regardless_of_time() {
        let w = window(
            "2024-06-15T23:59:59.999999+02:00",
            None,
            "2024-06-15",
            None,
        );
        assert!(w.is_current(today()));
    }

    #[test]
    fn test_missing_or_unparseable_start_is_excluded() {
        let mut w = window("2020-01-01", None, "2020-01-01", None);
        w.registrering_fra = None;
        assert!(!w.is_current(today()));

        let w = window("garbage", None, "2020-01-01", None);
        assert!(!w.is_current(today()));
    }

    #[test]
    fn test_parse_registry_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2019, 3, 7);

        assert_eq!(parse_registry_date("2019-03-07T10:11:12.345678+01:00"), expected);
        assert_eq!(parse_registry_date("2019-03-07T10:11:12Z"), expected);
        assert_eq!(parse_registry_date("2019-03-07T10:11:12.5"), expected);
        assert_eq!(parse_registry_date("2019-03-07 10:11:12"), expected);
        assert_eq!(parse_registry_date("2019-03-07"), expected);
        assert_eq!(parse_registry_date(""), None);
        assert_eq!(parse_registry_date("07/03/2019"), None);
    }
}
