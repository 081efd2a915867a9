//! Unified error interface for Trellis.
//!
//! Every error enum in the workspace implements [`ErrorCode`] so that a host
//! application can map failures to HTTP responses without matching on
//! concrete types.
//!
//! # Example
//!
//! ```
//! use trellis_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum RouteError {
//!     NoRoute(String),
//!     Unreachable,
//! }
//!
//! impl ErrorCode for RouteError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::NoRoute(_) => "ROUTE_NO_ROUTE",
//!             Self::Unreachable => "ROUTE_UNREACHABLE",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Unreachable)
//!     }
//! }
//!
//! let err = RouteError::NoRoute("Shop:Products".into());
//! assert_eq!(err.code(), "ROUTE_NO_ROUTE");
//! assert!(!err.is_recoverable());
//! ```

/// Machine-readable error classification.
///
/// # Code Format
///
/// - **UPPER_SNAKE_CASE**: e.g. `"DISPATCH_BAD_SIGNAL"`
/// - **Prefixed by layer**: `COMPONENT_`, `EVENT_`, `HOOK_`, `DISPATCH_`, `CONFIG_`
/// - **Stable**: codes are part of the public contract
///
/// # Recoverability
///
/// An error is recoverable when a different request (or a retry with
/// corrected input) may succeed. Programming errors such as mutating frozen
/// state are never recoverable.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns whether the error is recoverable.
    fn is_recoverable(&self) -> bool;
}

/// Validates that an error code follows the workspace conventions.
///
/// # Panics
///
/// Panics when the code lacks `expected_prefix` or is not UPPER_SNAKE_CASE.
///
/// # Example
///
/// ```
/// use trellis_types::{ErrorCode, assert_error_code};
///
/// #[derive(Debug)]
/// enum MyError { Missing }
///
/// impl ErrorCode for MyError {
///     fn code(&self) -> &'static str { "MY_MISSING" }
///     fn is_recoverable(&self) -> bool { false }
/// }
///
/// assert_error_code(&MyError::Missing, "MY_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();
    assert!(
        code.starts_with(expected_prefix),
        "error code '{code}' lacks prefix '{expected_prefix}'"
    );
    assert!(
        is_upper_snake_case(code),
        "error code '{code}' is not UPPER_SNAKE_CASE"
    );
}

/// [`assert_error_code`] over a list of variants.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    errors
        .iter()
        .for_each(|err| assert_error_code(err, expected_prefix));
}

/// Non-empty words of `A-Z0-9` joined by single underscores.
fn is_upper_snake_case(s: &str) -> bool {
    s.split('_').all(|word| {
        !word.is_empty()
            && word
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum LinkFailure {
        NoRoute,
        Frozen,
    }

    impl ErrorCode for LinkFailure {
        fn code(&self) -> &'static str {
            match self {
                Self::NoRoute => "LINK_NO_ROUTE",
                Self::Frozen => "LINK_FROZEN",
            }
        }

        fn is_recoverable(&self) -> bool {
            matches!(self, Self::NoRoute)
        }
    }

    #[test]
    fn conforming_codes_pass() {
        assert_error_codes(&[LinkFailure::NoRoute, LinkFailure::Frozen], "LINK_");
    }

    #[test]
    #[should_panic(expected = "lacks prefix")]
    fn foreign_prefix_panics() {
        assert_error_code(&LinkFailure::Frozen, "DISPATCH_");
    }

    #[test]
    fn upper_snake_case_rules() {
        assert!(is_upper_snake_case("DISPATCH_BAD_SIGNAL"));
        assert!(is_upper_snake_case("HTTP_304"));
        assert!(!is_upper_snake_case(""));
        assert!(!is_upper_snake_case("dispatch"));
        assert!(!is_upper_snake_case("_LEADING"));
        assert!(!is_upper_snake_case("TRAILING_"));
        assert!(!is_upper_snake_case("DOUBLE__UNDERSCORE"));
    }
}
