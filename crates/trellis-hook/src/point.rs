//! Hook lifecycle points.
//!
//! | Point | Kind | Payload |
//! |-------|------|---------|
//! | `request.pre_dispatch` | guard | `{method, params}` |
//! | `request.post_dispatch` | post | `{outcome}` |
//! | `phase.on_enter` | event | `{phase}` |
//! | `signal.pre_dispatch` | guard | `{receiver, signal}` |
//! | `signal.post_dispatch` | post | `{receiver, signal, outcome}` |
//! | `link.post_resolve` | event | `{destination, url, current}` |
//! | `template.pre_render` | pre | `{template, layout}` |
//! | `presenter.on_shutdown` | event | `{cause}` |

use crate::HookError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the registry treats verdicts at a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    /// `Skip` and `Abort` stop the chain and reach the host.
    Pre,
    /// Only `Abort` stops the chain. The guarded operation either runs or
    /// fails the dispatch; it is never dropped.
    Guard,
    /// `Replace` swaps the payload for the rest of the chain.
    Post,
    /// Notification only.
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookPoint {
    /// Fires inside the startup phase, before request parameters are read.
    RequestPreDispatch,
    /// Fires whatever the outcome, errors included.
    RequestPostDispatch,
    PhaseOnEnter,
    SignalPreDispatch,
    SignalPostDispatch,
    /// Observes resolved links; the URL cannot be changed.
    LinkPostResolve,
    TemplatePreRender,
    /// Runs before the presenter's own shutdown handler.
    PresenterOnShutdown,
}

impl HookPoint {
    /// Every point, in the order a full dispatch reaches them.
    pub const ALL: &'static [HookPoint] = &[
        HookPoint::PhaseOnEnter,
        HookPoint::RequestPreDispatch,
        HookPoint::SignalPreDispatch,
        HookPoint::SignalPostDispatch,
        HookPoint::LinkPostResolve,
        HookPoint::TemplatePreRender,
        HookPoint::PresenterOnShutdown,
        HookPoint::RequestPostDispatch,
    ];

    #[must_use]
    pub fn kind(self) -> HookKind {
        match self {
            Self::TemplatePreRender => HookKind::Pre,
            Self::RequestPreDispatch | Self::SignalPreDispatch => HookKind::Guard,
            Self::RequestPostDispatch | Self::SignalPostDispatch => HookKind::Post,
            Self::PhaseOnEnter | Self::LinkPostResolve | Self::PresenterOnShutdown => HookKind::Event,
        }
    }

    #[must_use]
    pub fn is_pre(self) -> bool {
        self.kind() == HookKind::Pre
    }

    #[must_use]
    pub fn is_post(self) -> bool {
        self.kind() == HookKind::Post
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RequestPreDispatch => "request.pre_dispatch",
            Self::RequestPostDispatch => "request.post_dispatch",
            Self::PhaseOnEnter => "phase.on_enter",
            Self::SignalPreDispatch => "signal.pre_dispatch",
            Self::SignalPostDispatch => "signal.post_dispatch",
            Self::LinkPostResolve => "link.post_resolve",
            Self::TemplatePreRender => "template.pre_render",
            Self::PresenterOnShutdown => "presenter.on_shutdown",
        }
    }
}

impl FromStr for HookPoint {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| HookError::UnknownHookPoint(s.to_string()))
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
