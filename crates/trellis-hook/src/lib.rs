//! Hook system for Trellis.
//!
//! Hooks inject cross-cutting concerns (auditing, maintenance switches,
//! template overrides, shutdown listeners) at fixed points of a presenter's
//! request lifecycle, without touching presenter code.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  trellis-types / trellis-event / trellis-component          │
//! └─────────────────────────────────────────────────────────────┘
//!           ↕ depends on types, depended on by runtime
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Hook Layer                  ◄── HERE   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  trellis-hook : Hook trait, Registry, PresenterPattern      │
//! └─────────────────────────────────────────────────────────────┘
//!           ↕
//! ┌─────────────────────────────────────────────────────────────┐
//! │  trellis-runtime : PresenterHost, LinkResolver              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Core Concepts
//!
//! ## Hook Points
//!
//! [`HookPoint`] enumerates the lifecycle points: request entry and exit,
//! phase entry, signal delivery, link resolution, template rendering and
//! shutdown.
//!
//! ## Presenter Patterns
//!
//! [`PresenterPattern`] selects presenters by name: `"*"`, `"Shop:*"`,
//! `"Front:Homepage#menu"`.
//!
//! ## Hook Actions
//!
//! [`HookAction`] determines what happens after a hook executes:
//!
//! - `Continue(ctx)`: hand the (edited) context to the next hook
//! - `Skip(value)`: skip the operation ([`HookKind::Pre`] points)
//! - `Abort { reason }`: fail the dispatch ([`HookKind::Pre`] and
//!   [`HookKind::Guard`] points)
//! - `Replace(value)`: swap the payload ([`HookKind::Post`] points)
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use trellis_hook::{HookContext, HookPoint, HookRegistry};
//!
//! let registry = HookRegistry::new();
//! let ctx = HookContext::new(HookPoint::RequestPreDispatch, "Shop:Products", json!({}));
//!
//! // no hooks registered → Continue with unchanged context
//! let action = registry.dispatch(HookPoint::RequestPreDispatch, "Shop:Products", None, ctx);
//! assert!(action.is_continue());
//! ```

mod action;
mod context;
mod error;
pub mod hook;
mod pattern;
mod point;
mod registry;

pub use action::HookAction;
pub use context::HookContext;
pub use error::HookError;
pub use hook::{Hook, DEFAULT_PRIORITY};
pub use pattern::{PatternSegment, PresenterPattern};
pub use point::{HookKind, HookPoint};
pub use registry::{run_chain, HookRegistry, SharedHookRegistry};

pub mod testing {
    //! Test utilities for the hook system.
    pub use crate::hook::testing::{CallCount, HookLog, MockHook, RecordingHook};
}
