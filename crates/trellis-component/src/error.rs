//! Component layer errors.
//!
//! Errors that can occur while declaring classes, building the component
//! tree, binding handler arguments and saving or loading state.
//! All errors implement [`ErrorCode`] for unified handling.
//!
//! # Error Code Convention
//!
//! All component errors use the `COMPONENT_` prefix:
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`InvalidName`](ComponentError::InvalidName) | `COMPONENT_INVALID_NAME` | No |
//! | [`DuplicateChild`](ComponentError::DuplicateChild) | `COMPONENT_DUPLICATE_CHILD` | No |
//! | [`NotFound`](ComponentError::NotFound) | `COMPONENT_NOT_FOUND` | Yes |
//! | [`UnknownClass`](ComponentError::UnknownClass) | `COMPONENT_UNKNOWN_CLASS` | No |
//! | [`InvalidParam`](ComponentError::InvalidParam) | `COMPONENT_INVALID_PARAM` | Yes |
//! | [`InvalidLink`](ComponentError::InvalidLink) | `COMPONENT_INVALID_LINK` | Yes |
//! | [`BadSignal`](ComponentError::BadSignal) | `COMPONENT_BAD_SIGNAL` | Yes |
//! | [`InvalidState`](ComponentError::InvalidState) | `COMPONENT_INVALID_STATE` | No |
//! | [`Failed`](ComponentError::Failed) | `COMPONENT_FAILED` | Yes |
//!
//! # Recoverability
//!
//! - **Recoverable**: caused by request data; another request may succeed
//! - **Not Recoverable**: a programming error in the application
//!
//! # Example
//!
//! ```
//! use trellis_component::ComponentError;
//! use trellis_types::ErrorCode;
//!
//! let err = ComponentError::DuplicateChild("menu".into());
//! assert_eq!(err.code(), "COMPONENT_DUPLICATE_CHILD");
//! assert!(!err.is_recoverable());
//!
//! let err = ComponentError::BadSignal("no handler for 'next'".into());
//! assert!(err.is_recoverable());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use trellis_types::ErrorCode;

/// Component layer error.
///
/// # Variants
///
/// | Variant | When | Recovery |
/// |---------|------|----------|
/// | `InvalidName` | Child name outside `[A-Za-z0-9_]+` | Fix the name |
/// | `DuplicateChild` | Sibling with the same name exists | Pick another name |
/// | `NotFound` | No component at a path | Check the path |
/// | `UnknownClass` | Class never declared | Register the class |
/// | `InvalidParam` | Argument missing or of the wrong type | Fix request data |
/// | `InvalidLink` | Link could not be built | Fix the destination |
/// | `BadSignal` | Signal cannot be delivered | Fix the link |
/// | `InvalidState` | Misuse such as mutating frozen state | Fix the caller |
/// | `Failed` | Handler reported a failure | Depends on handler |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ComponentError {
    /// A component name violates the naming rule.
    #[error("component name '{0}' is invalid")]
    InvalidName(String),

    /// A sibling with the same name already exists.
    #[error("component with name '{0}' already exists")]
    DuplicateChild(String),

    /// No component lives at the given path.
    #[error("component '{0}' does not exist")]
    NotFound(String),

    /// The class was not declared in the registry.
    #[error("unknown class '{0}'")]
    UnknownClass(String),

    /// A handler or persistent parameter could not be bound.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// A link could not be resolved.
    #[error("{0}")]
    InvalidLink(String),

    /// A signal could not be delivered.
    #[error("{0}")]
    BadSignal(String),

    /// The operation is not allowed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A handler failed.
    #[error("handler failed: {0}")]
    Failed(String),
}

impl ErrorCode for ComponentError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidName(_) => "COMPONENT_INVALID_NAME",
            Self::DuplicateChild(_) => "COMPONENT_DUPLICATE_CHILD",
            Self::NotFound(_) => "COMPONENT_NOT_FOUND",
            Self::UnknownClass(_) => "COMPONENT_UNKNOWN_CLASS",
            Self::InvalidParam(_) => "COMPONENT_INVALID_PARAM",
            Self::InvalidLink(_) => "COMPONENT_INVALID_LINK",
            Self::BadSignal(_) => "COMPONENT_BAD_SIGNAL",
            Self::InvalidState(_) => "COMPONENT_INVALID_STATE",
            Self::Failed(_) => "COMPONENT_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::NotFound(_)
            | Self::InvalidParam(_)
            | Self::InvalidLink(_)
            | Self::BadSignal(_)
            | Self::Failed(_) => true,
            Self::InvalidName(_)
            | Self::DuplicateChild(_)
            | Self::UnknownClass(_)
            | Self::InvalidState(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_types::assert_error_codes;

    fn all_variants() -> Vec<ComponentError> {
        vec![
            ComponentError::InvalidName("x".into()),
            ComponentError::DuplicateChild("x".into()),
            ComponentError::NotFound("x".into()),
            ComponentError::UnknownClass("x".into()),
            ComponentError::InvalidParam("x".into()),
            ComponentError::InvalidLink("x".into()),
            ComponentError::BadSignal("x".into()),
            ComponentError::InvalidState("x".into()),
            ComponentError::Failed("x".into()),
        ]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "COMPONENT_");
    }

    #[test]
    fn link_and_signal_messages_are_verbatim() {
        let err = ComponentError::InvalidLink("Destination must be non-empty string.".into());
        assert_eq!(err.to_string(), "Destination must be non-empty string.");

        let err = ComponentError::BadSignal("no receiver".into());
        assert_eq!(err.to_string(), "no receiver");
    }

    #[test]
    fn invalid_state_is_fatal() {
        let err = ComponentError::InvalidState("frozen".into());
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("invalid state"));
    }
}
