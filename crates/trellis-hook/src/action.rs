//! Hook verdicts.

use crate::HookContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a hook asks the host to do next.
///
/// | Variant | Pre point | Guard point | Post point | Event point |
/// |---------|-----------|-------------|------------|-------------|
/// | `Continue` | next hook, then the operation | next hook, then the operation | next hook | next hook |
/// | `Skip` | operation skipped | ignored | ignored | ignored |
/// | `Abort` | dispatch fails | dispatch fails | ignored | ignored |
/// | `Replace` | ignored | ignored | payload replaced | ignored |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HookAction {
    Continue(Box<HookContext>),
    Skip(Value),
    Abort { reason: String },
    Replace(Value),
}

impl HookAction {
    /// `Continue` with `ctx` unchanged.
    #[must_use]
    pub fn proceed(ctx: HookContext) -> Self {
        Self::Continue(Box::new(ctx))
    }

    #[must_use]
    pub fn abort(reason: impl Into<String>) -> Self {
        Self::Abort {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }

    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip(_))
    }

    #[must_use]
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Abort { .. })
    }

    #[must_use]
    pub fn is_replace(&self) -> bool {
        matches!(self, Self::Replace(_))
    }

    #[must_use]
    pub fn into_context(self) -> Option<HookContext> {
        match self {
            Self::Continue(ctx) => Some(*ctx),
            _ => None,
        }
    }
}
