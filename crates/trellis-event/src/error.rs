//! Errors raised while building or decoding request values.
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`EventError::InvalidSignal`] | `EVENT_INVALID_SIGNAL` | No |
//! | [`EventError::InvalidRequest`] | `EVENT_INVALID_REQUEST` | No |
//! | [`EventError::UnknownMethod`] | `EVENT_UNKNOWN_METHOD` | Yes |
//!
//! ```
//! use trellis_event::EventError;
//! use trellis_types::ErrorCode;
//!
//! let err = EventError::InvalidSignal("receiver 'a--b' has an empty segment".into());
//! assert_eq!(err.code(), "EVENT_INVALID_SIGNAL");
//! assert!(err.to_string().starts_with("invalid signal"));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use trellis_types::ErrorCode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum EventError {
    /// Malformed `do` parameter.
    #[error("invalid signal: {0}")]
    InvalidSignal(String),

    /// A request was constructed with invalid content.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The method token is not one the engine knows.
    #[error("unknown request method: {0}")]
    UnknownMethod(String),
}

impl ErrorCode for EventError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidSignal(_) => "EVENT_INVALID_SIGNAL",
            Self::InvalidRequest(_) => "EVENT_INVALID_REQUEST",
            Self::UnknownMethod(_) => "EVENT_UNKNOWN_METHOD",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownMethod(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_types::assert_error_codes;

    #[test]
    fn codes_carry_the_prefix() {
        assert_error_codes(
            &[
                EventError::InvalidSignal("do".into()),
                EventError::InvalidRequest("presenter".into()),
                EventError::UnknownMethod("BREW".into()),
            ],
            "EVENT_",
        );
    }

    #[test]
    fn unknown_method_is_recoverable() {
        let err = EventError::UnknownMethod("BREW".into());
        assert_eq!(err.code(), "EVENT_UNKNOWN_METHOD");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("BREW"));
    }

    #[test]
    fn invalid_request_error() {
        let err = EventError::InvalidRequest("empty name".into());
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("invalid request"));
    }
}
