//! Hook configuration errors.
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`InvalidPattern`](HookError::InvalidPattern) | `HOOK_INVALID_PATTERN` | No |
//! | [`UnknownHookPoint`](HookError::UnknownHookPoint) | `HOOK_UNKNOWN_POINT` | No |
//! | [`NotFound`](HookError::NotFound) | `HOOK_NOT_FOUND` | Yes |

use thiserror::Error;
use trellis_types::ErrorCode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    /// Presenter pattern that does not parse.
    #[error("invalid presenter pattern: {0}")]
    InvalidPattern(String),

    /// Hook point name outside [`HookPoint::ALL`](crate::HookPoint::ALL).
    #[error("unknown hook point: {0}")]
    UnknownHookPoint(String),

    /// No registered hook carries the id.
    #[error("hook not found: {0}")]
    NotFound(String),
}

impl ErrorCode for HookError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidPattern(_) => "HOOK_INVALID_PATTERN",
            Self::UnknownHookPoint(_) => "HOOK_UNKNOWN_POINT",
            Self::NotFound(_) => "HOOK_NOT_FOUND",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound(_))
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
                HookError::InvalidPattern("x".into()),
                HookError::UnknownHookPoint("x".into()),
                HookError::NotFound("x".into()),
            ],
            "HOOK_",
        );
    }

    #[test]
    fn messages() {
        assert_eq!(
            HookError::InvalidPattern("empty segment".into()).to_string(),
            "invalid presenter pattern: empty segment"
        );
        assert_eq!(
            HookError::NotFound("audit".into()).to_string(),
            "hook not found: audit"
        );
        assert!(HookError::NotFound("audit".into()).is_recoverable());
    }
}
