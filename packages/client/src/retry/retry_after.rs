//! `Retry-After` header parsing
//!
//! Accepts both delta-seconds (`120`, fractional values allowed) and
//! HTTP-dates in any of the three forms recipients must understand:
//! IMF-fixdate, RFC 850 and asctime. Dates in the past and
//! negative deltas yield zero; anything else that fails to parse is ignored.

use std::time::Duration;

use chrono::{DateTime, Utc};
use http::HeaderMap;
use http::header::RETRY_AFTER;

/// Parse a raw `Retry-After` value relative to `now`.
#[must_use]
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(seconds) = value.parse::<f64>() {
        if !seconds.is_finite() {
            return None;
        }
        return Some(Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX));
    }

    let when = DateTime::<Utc>::from(httpdate::parse_http_date(value).ok()?);
    Some((when - now).to_std().unwrap_or(Duration::ZERO))
}

/// Delay requested by the `Retry-After` header of `headers`, if any.
#[must_use]
pub fn retry_after_delay(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    parse_retry_after(value, now)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use http::HeaderValue;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn delta_seconds() {
        assert_eq!(parse_retry_after("120", now()), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after(" 0 ", now()), Some(Duration::ZERO));
        assert_eq!(parse_retry_after("1.5", now()), Some(Duration::from_millis(1500)));
        assert_eq!(parse_retry_after("-5", now()), Some(Duration::ZERO));
    }

    #[test]
    fn http_dates() {
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:28:30 GMT", now()),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:00:00 GMT", now()),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn obsolete_http_date_forms() {
        let now = Utc
            .with_ymd_and_hms(1994, 11, 6, 8, 49, 0)
            .single()
            .expect("valid timestamp");
        assert_eq!(
            parse_retry_after("Sunday, 06-Nov-94 08:49:37 GMT", now),
            Some(Duration::from_secs(37))
        );
        assert_eq!(
            parse_retry_after("Sun Nov  6 08:49:37 1994", now),
            Some(Duration::from_secs(37))
        );
    }

    #[test]
    fn malformed_values_are_ignored() {
        assert_eq!(parse_retry_after("", now()), None);
        assert_eq!(parse_retry_after("soon", now()), None);
        assert_eq!(parse_retry_after("NaN", now()), None);
        assert_eq!(parse_retry_after("inf", now()), None);
    }

    #[test]
    fn reads_header_map() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after_delay(&headers, now()), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(retry_after_delay(&headers, now()), Some(Duration::from_secs(3)));
    }
}
