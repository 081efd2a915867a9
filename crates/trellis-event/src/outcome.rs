//! Dispatch outcomes.
//!
//! Terminating, redirecting and forwarding are ordinary results of a
//! dispatch, not failures. Every phase step returns an [`Outcome`]; anything
//! other than [`Outcome::Continue`] stops the remaining phase work and is
//! handed to the shutdown phase, then to the caller.
//!
//! ```text
//! step ──► Continue ──► next step
//!   │
//!   └────► Terminate | Redirect | Forward ──► Shutdown ──► caller
//! ```

use crate::Request;
use serde::{Deserialize, Serialize};

/// Result of a dispatch step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// Keep going.
    Continue,
    /// Stop without further output (e.g. 304, HEAD).
    Terminate,
    /// Send the client to `uri` with the given status code.
    Redirect { uri: String, code: u16 },
    /// Dispatch a different request in place of this one.
    Forward(Box<Request>),
}

impl Outcome {
    /// `301 Moved Permanently`, used for canonical redirects.
    pub const MOVED_PERMANENTLY: u16 = 301;

    /// `303 See Other`, the default redirect code.
    pub const SEE_OTHER: u16 = 303;

    /// `304 Not Modified`.
    pub const NOT_MODIFIED: u16 = 304;

    #[must_use]
    pub fn redirect(uri: impl Into<String>, code: u16) -> Self {
        Self::Redirect {
            uri: uri.into(),
            code,
        }
    }

    #[must_use]
    pub fn forward(request: Request) -> Self {
        Self::Forward(Box::new(request))
    }

    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }

    #[must_use]
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect { .. })
    }

    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Terminate => "terminate",
            Self::Redirect { .. } => "redirect",
            Self::Forward(_) => "forward",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RequestMethod;
    use trellis_types::Params;

    #[test]
    fn redirect_helpers() {
        let outcome = Outcome::redirect("/shop", Outcome::SEE_OTHER);
        assert!(outcome.is_redirect());
        assert!(!outcome.is_continue());
        assert_eq!(outcome.kind(), "redirect");
    }

    #[test]
    fn forward_boxes_request() {
        let request = Request::new("Front", RequestMethod::Forward, Params::new());
        let outcome = Outcome::forward(request.clone());
        assert_eq!(outcome, Outcome::Forward(Box::new(request)));
        assert_eq!(outcome.kind(), "forward");
    }
}
