//! Dispatch errors.
//!
//! Failures that end a dispatch. Terminating, redirecting and forwarding
//! are [`Outcome`]s and never appear here.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable | HTTP |
//! |---------|------|-------------|------|
//! | [`DispatchError::BadSignal`] | `DISPATCH_BAD_SIGNAL` | Yes | 403 |
//! | [`DispatchError::BadRequest`] | `DISPATCH_BAD_REQUEST` | Yes | 404 |
//! | [`DispatchError::InvalidLink`] | `DISPATCH_INVALID_LINK` | Yes | 500 |
//! | [`DispatchError::InvalidState`] | `DISPATCH_INVALID_STATE` | No | 500 |
//! | [`DispatchError::HookAborted`] | `DISPATCH_HOOK_ABORTED` | No | 500 |
//! | [`DispatchError::Component`] | `DISPATCH_COMPONENT` | inner | 500 |
//! | [`DispatchError::Config`] | `DISPATCH_CONFIG` | No | 500 |
//! | [`DispatchError::Handler`] | `DISPATCH_HANDLER` | No | 500 |
//!
//! # Recoverability
//!
//! Recoverable errors are caused by request data (a stale link, a typo in
//! the URL). Non-recoverable errors are programming or deployment mistakes.

use crate::config::ConfigError;
use thiserror::Error;
use trellis_component::ComponentError;
use trellis_event::Outcome;
use trellis_hook::HookPoint;
use trellis_types::ErrorCode;

/// Result of a dispatch step or of a whole dispatch.
pub type DispatchResult = Result<Outcome, DispatchError>;

/// Dispatch layer error.
///
/// # Example
///
/// ```
/// use trellis_runtime::DispatchError;
/// use trellis_types::ErrorCode;
///
/// let err = DispatchError::BadRequest("Page not found.".into());
/// assert_eq!(err.code(), "DISPATCH_BAD_REQUEST");
/// assert_eq!(err.http_status(), 404);
/// ```
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The pending signal cannot be delivered.
    #[error("{0}")]
    BadSignal(String),

    /// The request cannot be served (bad action name, missing template,
    /// missing handler argument).
    #[error("{0}")]
    BadRequest(String),

    /// A link could not be resolved and the invalid-link mode re-raises.
    #[error("{0}")]
    InvalidLink(String),

    /// Misuse of the presenter, such as reading state during shutdown.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A pre-hook aborted the dispatch.
    #[error("hook at {point} aborted: {reason}")]
    HookAborted { point: HookPoint, reason: String },

    /// Component layer failure.
    #[error(transparent)]
    Component(ComponentError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Any other failure reported by application code.
    #[error("handler failed: {0}")]
    Handler(String),
}

impl DispatchError {
    /// HTTP status a front controller should answer with.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 404,
            Self::BadSignal(_) => 403,
            _ => 500,
        }
    }
}

impl From<ComponentError> for DispatchError {
    fn from(err: ComponentError) -> Self {
        match err {
            ComponentError::InvalidLink(msg) => Self::InvalidLink(msg),
            ComponentError::BadSignal(msg) => Self::BadSignal(msg),
            ComponentError::InvalidState(msg) => Self::InvalidState(msg),
            other => Self::Component(other),
        }
    }
}

/// Errors surfacing inside a component handler keep their kind where the
/// component layer has one.
impl From<DispatchError> for ComponentError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::InvalidLink(msg) => Self::InvalidLink(msg),
            DispatchError::BadSignal(msg) => Self::BadSignal(msg),
            DispatchError::InvalidState(msg) => Self::InvalidState(msg),
            DispatchError::BadRequest(msg) => Self::InvalidParam(msg),
            DispatchError::Component(inner) => inner,
            other => Self::Failed(other.to_string()),
        }
    }
}

impl ErrorCode for DispatchError {
    fn code(&self) -> &'static str {
        match self {
            Self::BadSignal(_) => "DISPATCH_BAD_SIGNAL",
            Self::BadRequest(_) => "DISPATCH_BAD_REQUEST",
            Self::InvalidLink(_) => "DISPATCH_INVALID_LINK",
            Self::InvalidState(_) => "DISPATCH_INVALID_STATE",
            Self::HookAborted { .. } => "DISPATCH_HOOK_ABORTED",
            Self::Component(_) => "DISPATCH_COMPONENT",
            Self::Config(_) => "DISPATCH_CONFIG",
            Self::Handler(_) => "DISPATCH_HANDLER",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::BadSignal(_) | Self::BadRequest(_) | Self::InvalidLink(_) => true,
            Self::Component(inner) => inner.is_recoverable(),
            Self::InvalidState(_) | Self::HookAborted { .. } | Self::Config(_) | Self::Handler(_) => {
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_types::assert_error_codes;

    fn all_variants() -> Vec<DispatchError> {
        vec![
            DispatchError::BadSignal("x".into()),
            DispatchError::BadRequest("x".into()),
            DispatchError::InvalidLink("x".into()),
            DispatchError::InvalidState("x".into()),
            DispatchError::HookAborted {
                point: HookPoint::RequestPreDispatch,
                reason: "x".into(),
            },
            DispatchError::Component(ComponentError::Failed("x".into())),
            DispatchError::Config(ConfigError::invalid_env_var("X", "y")),
            DispatchError::Handler("x".into()),
        ]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "DISPATCH_");
    }

    #[test]
    fn component_errors_map_to_dispatch_kinds() {
        let err: DispatchError = ComponentError::BadSignal("no receiver".into()).into();
        assert!(matches!(err, DispatchError::BadSignal(ref m) if m == "no receiver"));

        let err: DispatchError = ComponentError::InvalidLink("bad".into()).into();
        assert_eq!(err.code(), "DISPATCH_INVALID_LINK");

        let err: DispatchError = ComponentError::InvalidState("frozen".into()).into();
        assert!(!err.is_recoverable());

        let err: DispatchError = ComponentError::NotFound("menu".into()).into();
        assert!(matches!(err, DispatchError::Component(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn dispatch_errors_map_back_to_component_kinds() {
        let err: ComponentError = DispatchError::InvalidLink("No route".into()).into();
        assert_eq!(err, ComponentError::InvalidLink("No route".into()));

        let err: ComponentError =
            DispatchError::Component(ComponentError::NotFound("menu".into())).into();
        assert_eq!(err, ComponentError::NotFound("menu".into()));

        let err: ComponentError = DispatchError::Handler("boom".into()).into();
        assert_eq!(err, ComponentError::Failed("handler failed: boom".into()));
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(DispatchError::BadSignal("x".into()).http_status(), 403);
        assert_eq!(DispatchError::BadRequest("x".into()).http_status(), 404);
        assert_eq!(DispatchError::Handler("x".into()).http_status(), 500);
    }

    #[test]
    fn messages_are_verbatim() {
        let err = DispatchError::BadRequest("Action name 'x-y' is not alphanumeric string.".into());
        assert_eq!(err.to_string(), "Action name 'x-y' is not alphanumeric string.");
    }
}
