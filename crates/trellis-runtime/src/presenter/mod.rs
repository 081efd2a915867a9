//! Presenter lifecycle.
//!
//! A [`PresenterHost`] runs one [`Presenter`] through one request:
//!
//! ```text
//! ┌─────────┐   ┌─────────┐   ┌────────┐   ┌────────┐   ┌──────────┐
//! │ Startup │──►│ Prepare │──►│ Signal │──►│ Render │──►│ Shutdown │
//! └─────────┘   └─────────┘   └────────┘   └────────┘   └──────────┘
//!   restore        prepare<V>   handle<S>    render<V>     always runs
//!   action<A>                                freeze state
//!   canonicalize                             template
//! ```
//!
//! Any handler may end the dispatch early with a non-`Continue`
//! [`Outcome`](trellis_event::Outcome) (terminate, redirect, forward); the
//! remaining phases are skipped and shutdown runs.
//!
//! # Handlers
//!
//! Lifecycle handlers are looked up by name on the presenter's class and
//! skipped when undeclared:
//!
//! | Phase | Handler |
//! |-------|---------|
//! | startup | [`Presenter::startup`], `action<Action>` |
//! | prepare | [`Presenter::before_prepare`], `prepare<View>` |
//! | signal | `handle<Signal>` on the receiver |
//! | render | [`Presenter::before_render`], `render<View>`, [`Presenter::after_render`] |
//! | shutdown | on-shutdown hooks, [`Presenter::shutdown`] |

mod context;
mod host;
mod state;

pub use context::{ComponentScope, PresenterContext};
pub use host::PresenterHost;
pub use state::PresenterState;

use crate::{DispatchError, DispatchResult, Services};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use trellis_component::Component;
use trellis_event::Outcome;
use trellis_hook::{run_chain, HookAction, HookContext, HookPoint};
use trellis_types::{capitalize, ClassId, ComponentPath, Params};

/// Lifecycle phase of a presenter. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Startup,
    Prepare,
    Signal,
    Render,
    Shutdown,
}

impl Phase {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Prepare => "prepare",
            Self::Signal => "signal",
            Self::Render => "render",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a dispatch is shutting down early.
#[derive(Debug, Clone, Copy)]
pub enum ShutdownCause<'a> {
    /// A handler ended the dispatch with this outcome.
    Outcome(&'a Outcome),
    /// The dispatch failed.
    Error(&'a DispatchError),
}

impl ShutdownCause<'_> {
    fn describe(&self) -> Value {
        match self {
            Self::Outcome(outcome) => serde_json::json!({ "outcome": outcome.kind() }),
            Self::Error(err) => serde_json::json!({ "error": err.to_string() }),
        }
    }
}

/// Application presenter.
///
/// Only handlers declared on the presenter's class are passed to
/// [`call`](Self::call); arguments arrive bound and coerced.
pub trait Presenter: Send {
    fn class(&self) -> &ClassId;

    /// Runs the declared handler `method` (`actionShow`, `renderDefault`,
    /// `handleLogout`, …).
    ///
    /// # Errors
    ///
    /// Whatever the handler reports; it ends the dispatch.
    fn call(&mut self, method: &str, args: &Params, ctx: &mut PresenterContext<'_>) -> DispatchResult;

    /// First handler of the startup phase.
    ///
    /// # Errors
    ///
    /// Ends the dispatch.
    fn startup(&mut self, _ctx: &mut PresenterContext<'_>) -> DispatchResult {
        Ok(Outcome::Continue)
    }

    /// # Errors
    ///
    /// Ends the dispatch.
    fn before_prepare(&mut self, _ctx: &mut PresenterContext<'_>) -> DispatchResult {
        Ok(Outcome::Continue)
    }

    /// # Errors
    ///
    /// Ends the dispatch.
    fn before_render(&mut self, _ctx: &mut PresenterContext<'_>) -> DispatchResult {
        Ok(Outcome::Continue)
    }

    /// # Errors
    ///
    /// Ends the dispatch.
    fn after_render(&mut self, _ctx: &mut PresenterContext<'_>) -> DispatchResult {
        Ok(Outcome::Continue)
    }

    /// Last call of every dispatch. `cause` is `None` after a normal
    /// completion.
    fn shutdown(&mut self, _cause: Option<ShutdownCause<'_>>) {}

    /// Creates the top-level component `name` on demand.
    fn create_component(&mut self, _name: &str) -> Option<Box<dyn Component>> {
        None
    }
}

/// `action<Action>`
#[must_use]
pub fn action_method(action: &str) -> String {
    format!("action{}", capitalize(action))
}

/// `prepare<View>`
#[must_use]
pub fn prepare_method(view: &str) -> String {
    format!("prepare{}", capitalize(view))
}

/// `render<View>`
#[must_use]
pub fn render_method(view: &str) -> String {
    format!("render{}", capitalize(view))
}

/// Result of running hooks at one point.
pub(crate) enum HookFlow {
    /// Proceed with the (possibly modified) payload.
    Continue(Value),
    /// A pre-hook asked to skip the operation.
    Skip,
}

/// Runs the hooks registered at `point`.
///
/// The registry lock is released before the first hook runs, so hooks may
/// register or remove hooks themselves.
///
/// # Errors
///
/// [`DispatchError::HookAborted`] when a pre or guard hook aborts.
pub(crate) fn fire_hook(
    services: &Services,
    presenter: &str,
    point: HookPoint,
    component: Option<&ComponentPath>,
    payload: Value,
) -> Result<HookFlow, DispatchError> {
    let chain = services.hooks().read().chain(point, presenter, component);
    if chain.is_empty() {
        return Ok(HookFlow::Continue(payload));
    }

    let mut ctx = HookContext::new(point, presenter, payload);
    if let Some(path) = component {
        ctx = ctx.with_component(path.clone());
    }
    match run_chain(point, &chain, ctx) {
        HookAction::Continue(ctx) => Ok(HookFlow::Continue(ctx.payload)),
        HookAction::Replace(value) => Ok(HookFlow::Continue(value)),
        HookAction::Skip(_) => {
            tracing::debug!(point = %point, presenter, "operation skipped by hook");
            Ok(HookFlow::Skip)
        }
        HookAction::Abort { reason } => Err(DispatchError::HookAborted { point, reason }),
    }
}
