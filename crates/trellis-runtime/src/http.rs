//! HTTP boundary.
//!
//! The dispatch engine never talks to a transport directly. It reads the
//! current request through [`HttpContext`] and writes status codes and
//! headers through [`HttpResponse`]; a front controller supplies both.

use percent_encoding::percent_decode_str;
use url::Url;

/// Read-only view of the HTTP request being served.
pub trait HttpContext: Send + Sync {
    /// Upper-case method token (`GET`, `HEAD`, `POST`, …).
    fn method(&self) -> &str;

    /// Header value, looked up ignoring case.
    fn header(&self, name: &str) -> Option<&str>;

    /// Returns `true` for requests sent by the AJAX channel.
    fn is_ajax(&self) -> bool;

    /// Absolute URL of the request.
    fn uri(&self) -> &str;

    /// `scheme://host[:port]` of the request, without a trailing slash.
    fn host_uri(&self) -> &str;

    /// Case-insensitive method check.
    fn is_method(&self, method: &str) -> bool {
        self.method().eq_ignore_ascii_case(method)
    }
}

/// Response headers the engine is allowed to set.
///
/// Methods take `&self`; implementations use interior mutability.
pub trait HttpResponse: Send + Sync {
    fn set_code(&self, code: u16);

    fn set_header(&self, name: &str, value: &str);

    /// Allows caching for `seconds` (`Cache-Control` / `Expires`).
    fn set_expiration(&self, seconds: u64);
}

/// Compares two URLs the way a browser would address them.
///
/// Scheme and host compare case-insensitively, a default port equals no
/// port, path segments compare percent-decoded, query parameters compare
/// in any order, and the fragment is ignored. Text that does not parse as
/// an absolute URL compares literally.
///
/// # Example
///
/// ```
/// use trellis_runtime::uri_equals;
///
/// assert!(uri_equals("http://x/?a=1&b=2", "http://x/?b=2&a=1"));
/// assert!(uri_equals("http://Example.com:80/~user", "http://example.com/%7Euser"));
/// assert!(!uri_equals("http://x/?a=1", "http://x/?a=2"));
/// ```
#[must_use]
pub fn uri_equals(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => UrlKey::of(&a) == UrlKey::of(&b),
        _ => a == b,
    }
}

#[derive(PartialEq)]
struct UrlKey<'a> {
    scheme: &'a str,
    host: Option<&'a str>,
    port: Option<u16>,
    path: Vec<String>,
    query: Vec<(String, String)>,
}

impl<'a> UrlKey<'a> {
    fn of(url: &'a Url) -> Self {
        let path = url
            .path_segments()
            .map(|segments| {
                segments
                    .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_else(|| vec![url.path().to_string()]);
        let mut query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        query.sort_unstable();

        Self {
            scheme: url.scheme(),
            host: url.host_str(),
            port: url.port_or_known_default(),
            path,
            query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_ignores_query_order_and_fragment() {
        assert!(uri_equals("http://x/a?p=1&q=2#top", "http://x/a?q=2&p=1"));
        assert!(uri_equals("http://x/a", "http://x/a?"));
    }

    #[test]
    fn equivalent_spellings_are_equal() {
        assert!(uri_equals("http://Example.com/shop", "http://example.com/shop"));
        assert!(uri_equals("http://example.com:80/shop", "http://example.com/shop"));
        assert!(uri_equals("https://example.com:443/", "https://example.com/"));
        assert!(uri_equals("http://example.com/%7Euser", "http://example.com/~user"));
        assert!(uri_equals("http://x/a?q=a%20b", "http://x/a?q=a+b"));
    }

    #[test]
    fn different_urls_differ() {
        assert!(!uri_equals("http://x/a", "http://x/b"));
        assert!(!uri_equals("http://x/a?p=1", "http://x/a"));
        assert!(!uri_equals("http://x:8080/a", "http://x/a"));
        assert!(!uri_equals("https://x/a", "http://x/a"));
    }

    #[test]
    fn relative_text_compares_literally() {
        assert!(uri_equals("/shop", "/shop"));
        assert!(!uri_equals("/shop", "/Shop"));
    }
}
