//! HTTP cache control module
//!
//! Provides `ETag` generation, HTTP date handling and conditional request
//! (freshness) evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds in one (non-leap) year, used for `MaxAge::Forever`
pub const ONE_YEAR_SECS: u64 = 60 * 60 * 24 * 365;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Milliseconds since the Unix epoch; times before the epoch clamp to 0
pub fn mtime_millis(mtime: SystemTime) -> u128 {
    mtime
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

/// Generate an `ETag` from size and modification time
///
/// Returns a quoted string of the form `"<size>-<mtimeMillis>"`.
pub fn generate_etag(size: u64, mtime: SystemTime) -> String {
    format!("\"{size}-{}\"", mtime_millis(mtime))
}

/// Format a timestamp as an IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`)
pub fn format_http_date(time: SystemTime) -> String {
    let time: DateTime<Utc> = time.into();
    time.format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an HTTP date. IMF-fixdate and other RFC 2822 forms are accepted.
pub fn parse_http_date(value: &str) -> Option<SystemTime> {
    let value = value.trim();
    DateTime::parse_from_rfc2822(value)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(value, HTTP_DATE_FORMAT).map(|t| t.and_utc())
        })
        .ok()
        .map(SystemTime::from)
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", "def456"`
/// - Weak validators: `W/"abc123"`
/// - Wildcard: `*`
pub fn check_etag_match(if_none_match: &str, etag: &str) -> bool {
    let etag = etag.trim_start_matches("W/");
    if_none_match.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.trim_start_matches("W/") == etag
    })
}

/// Check `If-Modified-Since` against the resource's `Last-Modified` value.
///
/// Both headers carry second precision, so the comparison is done on the
/// parsed dates. An unparseable value on either side is never fresh.
pub fn check_not_modified_since(if_modified_since: &str, last_modified: &str) -> bool {
    match (
        parse_http_date(if_modified_since),
        parse_http_date(last_modified),
    ) {
        (Some(since), Some(modified)) => modified <= since,
        _ => false,
    }
}

/// Standard conditional-GET freshness test.
///
/// Every validator the client sent must hold; if it sent none the response
/// is not fresh.
pub fn is_fresh(
    if_none_match: Option<&str>,
    if_modified_since: Option<&str>,
    etag: Option<&str>,
    last_modified: Option<&str>,
) -> bool {
    if if_none_match.is_none() && if_modified_since.is_none() {
        return false;
    }

    if let Some(inm) = if_none_match {
        let Some(etag) = etag else {
            return false;
        };
        if !check_etag_match(inm, etag) {
            return false;
        }
    }

    if let Some(ims) = if_modified_since {
        let Some(last_modified) = last_modified else {
            return false;
        };
        if !check_not_modified_since(ims, last_modified) {
            return false;
        }
    }

    true
}

/// How long clients may cache a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(try_from = "MaxAgeRepr", into = "MaxAgeRepr")]
pub enum MaxAge {
    #[default]
    Zero,
    Seconds(u64),
    /// One year, the conventional "never expires" value
    Forever,
}

impl MaxAge {
    pub const fn as_secs(self) -> u64 {
        match self {
            Self::Zero => 0,
            Self::Seconds(s) => s,
            Self::Forever => ONE_YEAR_SECS,
        }
    }

    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> String {
        format!("public, max-age={}", self.as_secs())
    }
}

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum MaxAgeRepr {
    Seconds(u64),
    Keyword(String),
}

impl TryFrom<MaxAgeRepr> for MaxAge {
    type Error = String;

    fn try_from(repr: MaxAgeRepr) -> Result<Self, Self::Error> {
        match repr {
            MaxAgeRepr::Seconds(0) => Ok(Self::Zero),
            MaxAgeRepr::Seconds(s) => Ok(Self::Seconds(s)),
            MaxAgeRepr::Keyword(k) if k.eq_ignore_ascii_case("forever") => Ok(Self::Forever),
            MaxAgeRepr::Keyword(k) => Err(format!(
                "invalid max_age '{k}': expected seconds or \"forever\""
            )),
        }
    }
}

impl From<MaxAge> for MaxAgeRepr {
    fn from(age: MaxAge) -> Self {
        match age {
            MaxAge::Forever => Self::Keyword("forever".to_string()),
            other => Self::Seconds(other.as_secs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_generate_etag() {
        let mtime = UNIX_EPOCH + Duration::from_millis(1_500);
        assert_eq!(generate_etag(42, mtime), "\"42-1500\"");
    }

    #[test]
    fn test_http_date_roundtrip() {
        let formatted = format_http_date(at(784_111_777));
        assert_eq!(formatted, "Sun, 06 Nov 1994 08:49:37 GMT");
        assert_eq!(parse_http_date(&formatted), Some(at(784_111_777)));
        assert_eq!(parse_http_date("yesterday"), None);
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "\"5-1000\"";
        assert!(check_etag_match("\"5-1000\"", etag));
        assert!(check_etag_match("\"xyz\", \"5-1000\"", etag));
        assert!(check_etag_match("W/\"5-1000\"", etag));
        assert!(check_etag_match("*", etag));
        assert!(!check_etag_match("\"different\"", etag));
    }

    #[test]
    fn test_is_fresh() {
        let last_modified = format_http_date(at(1_000_000));
        let later = format_http_date(at(1_000_100));
        let earlier = format_http_date(at(999_000));
        let etag = "\"1-1000000000\"";

        assert!(!is_fresh(None, None, Some(etag), Some(&last_modified)));
        assert!(is_fresh(Some(etag), None, Some(etag), Some(&last_modified)));
        assert!(!is_fresh(Some("\"x\""), None, Some(etag), Some(&last_modified)));
        assert!(is_fresh(None, Some(&later), Some(etag), Some(&last_modified)));
        assert!(is_fresh(None, Some(&last_modified), Some(etag), Some(&last_modified)));
        assert!(!is_fresh(None, Some(&earlier), Some(etag), Some(&last_modified)));
        assert!(!is_fresh(None, Some("garbage"), Some(etag), Some(&last_modified)));
        // Both validators must hold
        assert!(!is_fresh(Some(etag), Some(&earlier), Some(etag), Some(&last_modified)));
    }

    #[test]
    fn test_max_age() {
        assert_eq!(MaxAge::default().to_header_value(), "public, max-age=0");
        assert_eq!(
            MaxAge::Seconds(3600).to_header_value(),
            "public, max-age=3600"
        );
        assert_eq!(
            MaxAge::Forever.to_header_value(),
            "public, max-age=31536000"
        );
    }

    #[test]
    fn test_max_age_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            max_age: MaxAge,
        }
        let w: Wrapper = toml::from_str("max_age = 600").unwrap();
        assert_eq!(w.max_age, MaxAge::Seconds(600));
        let w: Wrapper = toml::from_str("max_age = \"forever\"").unwrap();
        assert_eq!(w.max_age, MaxAge::Forever);
        assert!(toml::from_str::<Wrapper>("max_age = \"soon\"").is_err());
    }
}
