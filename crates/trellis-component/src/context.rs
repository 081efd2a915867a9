//! Component context for runtime interaction.
//!
//! Provides the interface between a component handler and the presenter
//! hosting it. Through the context a handler can:
//!
//! - Read and change its own parameters (including persistent ones)
//! - Build links and redirects relative to itself
//! - Attach child components
//! - Query and mark invalidation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PresenterHost (runtime)                  │
//! │                                                             │
//! │  ┌───────────────────────────────────────────────────┐      │
//! │  │              ComponentScope                       │      │
//! │  │  - params / set_param  → tree node                │      │
//! │  │  - link / redirect     → LinkResolver             │      │
//! │  │  - attach              → ComponentTree            │      │
//! │  └───────────────────────────────────────────────────┘      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              │ passed to Component::call
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Component handler                       │
//! │                                                             │
//! │  fn call(&mut self, "handleNext", args, ctx) {              │
//! │      ctx.set_param("page", json!(2));                       │
//! │      ctx.redirect("this", Args::new())                      │
//! │  }                                                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::{Component, ComponentError, HandlerResult};
use serde_json::Value;
use trellis_event::Args;
use trellis_types::{ComponentPath, Params};

/// Runtime services available to a component handler.
///
/// Links created through the context are resolved relative to the
/// component: a destination ending in `!` names one of its signals, and any
/// other destination from a non-presenter origin is treated as a signal too.
pub trait ComponentContext {
    /// Path of the component the context belongs to.
    fn path(&self) -> &ComponentPath;

    /// The component's current parameters.
    fn params(&self) -> &Params;

    /// A single parameter.
    fn param(&self, name: &str) -> Option<&Value> {
        self.params().get(name)
    }

    /// Sets a parameter; persistent ones flow into later links.
    fn set_param(&mut self, name: &str, value: Value);

    /// Builds a link.
    ///
    /// Invalid links are handled by the configured invalid-link policy;
    /// an error is only returned when that policy re-raises.
    ///
    /// # Errors
    ///
    /// [`ComponentError::InvalidLink`] in exception mode.
    fn link(&mut self, destination: &str, args: Args) -> Result<String, ComponentError>;

    /// Builds a redirect outcome (status 303).
    ///
    /// # Errors
    ///
    /// [`ComponentError::InvalidLink`] if the destination cannot be resolved.
    fn redirect(&mut self, destination: &str, args: Args) -> HandlerResult;

    /// Returns `true` if the pending signal targets this component.
    ///
    /// With `signal` set, the signal name must match as well (ignoring case).
    fn is_signal_receiver(&self, signal: Option<&str>) -> bool;

    /// Attaches a child component below this one.
    ///
    /// Parameters restored for the child's path are loaded right away.
    ///
    /// # Errors
    ///
    /// - [`ComponentError::InvalidName`] / [`ComponentError::DuplicateChild`]
    /// - [`ComponentError::UnknownClass`] if the child's class is undeclared
    fn attach(&mut self, name: &str, component: Box<dyn Component>) -> Result<(), ComponentError>;

    /// Marks the component as needing to be re-rendered.
    fn invalidate(&mut self);

    /// Returns `true` if the component was invalidated during this request.
    fn is_invalid(&self) -> bool;
}
