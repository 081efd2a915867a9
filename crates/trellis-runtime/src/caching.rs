//! Conditional GET support.
//!
//! [`evaluate`] decides from the validators a client sent whether the page
//! it has cached is still fresh. It is pure; the presenter's
//! `last_modified` helper sets the response headers around it.
//!
//! | `If-None-Match` | `If-Modified-Since` | Result |
//! |-----------------|---------------------|--------|
//! | `*` or contains the ETag | absent | not modified |
//! | `*` or contains the ETag | `last_modified <= ims` | not modified |
//! | `*` or contains the ETag | otherwise | modified |
//! | present, no match | any | modified |
//! | absent | `last_modified <= ims` | not modified |
//! | absent | otherwise / absent | modified |
//!
//! Outside production mode no decision is made at all.

use chrono::{DateTime, Utc};
use trellis_event::Outcome;

/// Outcome of a freshness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    /// Caching is off (not in production mode).
    Disabled,
    /// The client's copy is fresh; answer 304 and stop.
    NotModified,
    /// The page must be rendered. Carries the parsed `If-Modified-Since`.
    Modified(Option<DateTime<Utc>>),
}

impl CacheDecision {
    #[must_use]
    pub fn is_not_modified(&self) -> bool {
        matches!(self, Self::NotModified)
    }

    /// The client's `If-Modified-Since`, when the page must be rendered.
    #[must_use]
    pub fn if_modified_since(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Modified(ims) => *ims,
            _ => None,
        }
    }

    /// `Terminate` for a fresh client copy, `Continue` otherwise.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        if self.is_not_modified() {
            Outcome::Terminate
        } else {
            Outcome::Continue
        }
    }
}

/// Decides whether the client's cached copy is still fresh.
///
/// `etag` is the already quoted entity tag (see [`format_etag`]).
#[must_use]
pub fn evaluate(
    production: bool,
    last_modified: Option<DateTime<Utc>>,
    etag: Option<&str>,
    if_none_match: Option<&str>,
    if_modified_since: Option<&str>,
) -> CacheDecision {
    if !production {
        return CacheDecision::Disabled;
    }

    let ims = if_modified_since.and_then(parse_http_date);
    let mut matched = false;

    if let Some(inm) = if_none_match {
        if inm == "*" {
            matched = true;
        } else {
            let Some(etag) = etag else {
                return CacheDecision::Modified(ims);
            };
            let normalized = format!(" {}", inm.replace([',', '\t'], " "));
            if !normalized.contains(&format!(" {etag}")) {
                return CacheDecision::Modified(ims);
            }
            matched = true;
        }
    }

    if if_modified_since.is_some() {
        match (last_modified, ims) {
            (Some(lm), Some(ims)) if lm.timestamp() > 0 && lm <= ims => matched = true,
            _ => return CacheDecision::Modified(ims),
        }
    }

    if matched {
        CacheDecision::NotModified
    } else {
        CacheDecision::Modified(ims)
    }
}

/// Quotes an entity tag, escaping quotes and backslashes.
///
/// # Example
///
/// ```
/// use trellis_runtime::caching::format_etag;
///
/// assert_eq!(format_etag("v1"), "\"v1\"");
/// assert_eq!(format_etag("a\"b"), "\"a\\\"b\"");
/// ```
#[must_use]
pub fn format_etag(etag: &str) -> String {
    let mut out = String::with_capacity(etag.len() + 2);
    out.push('"');
    for c in etag.chars() {
        match c {
            '"' | '\'' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Formats a timestamp as an HTTP date (`Sun, 06 Nov 1994 08:49:37 GMT`).
#[must_use]
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parses an HTTP date header value.
#[must_use]
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const IMS: &str = "Sun, 06 Nov 1994 08:49:37 GMT";

    fn at(secs: i64) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(secs, 0).single()
    }

    fn ims_time() -> DateTime<Utc> {
        parse_http_date(IMS).expect("valid date")
    }

    #[test]
    fn disabled_outside_production() {
        let decision = evaluate(false, at(1), Some("\"v1\""), Some("*"), None);
        assert_eq!(decision, CacheDecision::Disabled);
        assert!(decision.outcome().is_continue());
    }

    #[test]
    fn wildcard_matches() {
        let decision = evaluate(true, None, None, Some("*"), None);
        assert_eq!(decision, CacheDecision::NotModified);
        assert_eq!(decision.outcome(), Outcome::Terminate);
    }

    #[test]
    fn etag_in_multi_value_header_matches() {
        let decision = evaluate(true, None, Some("\"v2\""), Some("\"v1\",\t\"v2\""), None);
        assert!(decision.is_not_modified());
    }

    #[test]
    fn etag_mismatch_returns_ims() {
        let decision = evaluate(true, None, Some("\"v3\""), Some("\"v1\", \"v2\""), Some(IMS));
        assert_eq!(decision, CacheDecision::Modified(Some(ims_time())));
    }

    #[test]
    fn none_match_without_etag_is_modified() {
        let decision = evaluate(true, None, None, Some("\"v1\""), None);
        assert_eq!(decision, CacheDecision::Modified(None));
    }

    #[test]
    fn etag_match_requires_fresh_last_modified() {
        let ims = ims_time();
        let older = Some(ims - chrono::Duration::seconds(60));
        let newer = Some(ims + chrono::Duration::seconds(60));

        assert!(evaluate(true, older, Some("\"v1\""), Some("\"v1\""), Some(IMS)).is_not_modified());
        assert_eq!(
            evaluate(true, newer, Some("\"v1\""), Some("\"v1\""), Some(IMS)),
            CacheDecision::Modified(Some(ims))
        );
    }

    #[test]
    fn modified_since_alone() {
        let ims = ims_time();
        assert!(evaluate(true, Some(ims), None, None, Some(IMS)).is_not_modified());
        assert_eq!(
            evaluate(true, None, None, None, Some(IMS)),
            CacheDecision::Modified(Some(ims))
        );
    }

    #[test]
    fn no_validators_is_modified() {
        assert_eq!(evaluate(true, at(100), Some("\"v\""), None, None), CacheDecision::Modified(None));
    }

    #[test]
    fn http_date_round_trip() {
        let time = ims_time();
        assert_eq!(http_date(time), IMS);
    }
}
