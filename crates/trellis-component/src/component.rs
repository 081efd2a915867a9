//! Component trait for nodes of the presenter's component tree.
//!
//! A component is the behaviour half of a tree node: it implements the
//! handlers its class declares. The data half (name, path, parameters,
//! invalidation flag) lives in the [`ComponentNode`](crate::ComponentNode)
//! and is reached through the [`ComponentContext`] passed to every call.
//!
//! # Handler Naming
//!
//! | Prefix | Invoked for |
//! |--------|-------------|
//! | `handle<Signal>` | A signal addressed to the component |
//! | `action<Action>` | Presenter startup phase |
//! | `prepare<View>` | Presenter prepare phase |
//! | `render<View>` | Presenter render phase |
//!
//! Only handlers listed in the class declaration are ever called, and the
//! name passed to [`Component::call`] is the declared one.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use trellis_component::{Component, ComponentContext, ComponentError, HandlerResult};
//! use trellis_event::Outcome;
//! use trellis_types::{ClassId, Params};
//!
//! struct Pager {
//!     class: ClassId,
//! }
//!
//! impl Component for Pager {
//!     fn class(&self) -> &ClassId {
//!         &self.class
//!     }
//!
//!     fn call(
//!         &mut self,
//!         method: &str,
//!         _args: &Params,
//!         ctx: &mut dyn ComponentContext,
//!     ) -> HandlerResult {
//!         match method {
//!             "handleNext" => {
//!                 let page = ctx.param("page").and_then(|v| v.as_i64()).unwrap_or(1);
//!                 ctx.set_param("page", json!(page + 1));
//!                 Ok(Outcome::Continue)
//!             }
//!             other => Err(ComponentError::Failed(format!("unexpected handler {other}"))),
//!         }
//!     }
//! }
//! ```

use crate::{ComponentContext, ComponentError};
use trellis_event::Outcome;
use trellis_types::{ClassId, Params};

/// Result of a handler: an outcome for the lifecycle, or a failure.
pub type HandlerResult = Result<Outcome, ComponentError>;

/// Behaviour of a component tree node.
///
/// # Contract
///
/// - [`class`](Self::class) never changes for an instance.
/// - [`call`](Self::call) is only invoked with methods declared by the
///   class; `args` holds exactly the declared arguments, already coerced.
/// - Returning anything but [`Outcome::Continue`] stops the current
///   lifecycle phase.
pub trait Component: Send {
    /// Returns the component's class.
    fn class(&self) -> &ClassId;

    /// Runs the declared handler `method`.
    ///
    /// # Errors
    ///
    /// Whatever the handler reports; it escapes the dispatch.
    fn call(&mut self, method: &str, args: &Params, ctx: &mut dyn ComponentContext)
        -> HandlerResult;

    /// Creates child `name` the first time it is needed (e.g. as a signal
    /// receiver). `None` if the component has no such child.
    fn create_component(&mut self, _name: &str) -> Option<Box<dyn Component>> {
        None
    }
}

/// Formats the handler name for a signal (`handle` + signal).
#[must_use]
pub fn signal_method(signal: &str) -> String {
    format!("handle{}", trellis_types::capitalize(signal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_method_prefixes_handle() {
        assert_eq!(signal_method("next"), "handleNext");
        assert_eq!(signal_method("Logout"), "handleLogout");
    }
}
