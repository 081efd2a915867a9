//! Component system for Trellis.
//!
//! This crate provides the component layer of a Trellis presenter: class
//! declarations, the component tree, handler binding and persistent state.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Component Layer                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  trellis-types     : ClassId, ComponentPath, Params         │
//! │  trellis-event     : Request, Signal, Outcome               │
//! │  trellis-component : classes, tree, state     ◄── HERE      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  trellis-hook      : lifecycle hooks                        │
//! │  trellis-runtime   : PresenterHost, links, dispatch         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Classes and Instances
//!
//! Behaviour and metadata are split:
//!
//! ```text
//!   ClassDecl ──register──► ClassRegistry ──resolve──► Arc<ResolvedClass>
//!   (builder)                                          (ancestry flattened)
//!                                                              │
//!   Box<dyn Component> ──────────────┐                         │
//!   (handlers)                       ▼                         ▼
//!                          ComponentTree::add(parent, name, class, component)
//!                                    │
//!                                    ▼
//!                              ComponentNode
//!                  (path, params, invalidated, children)
//! ```
//!
//! A [`ClassDecl`] lists a class's capabilities, persistent parameters,
//! persistent child components and callable handlers. The runtime consults
//! only the declaration when deciding what may be called; the
//! [`Component`] itself just executes handlers.
//!
//! # Capabilities
//!
//! | Capability | Meaning |
//! |------------|---------|
//! | `SIGNAL_RECEIVER` | May receive signals (`handle<Signal>`) |
//! | `STATE_PERSISTENT` | Contributes persistent parameters to links |
//! | `RENDERABLE` | Is invalidated when it receives a signal |
//!
//! # Persistent State
//!
//! [`load_state`] coerces an incoming parameter bag; [`save_state`]
//! produces the values a component contributes to links. A value equal to
//! its declared default saves as `null` and is left out of URLs.
//!
//! # Testing
//!
//! The [`testing`] module provides [`MockComponent`](testing::MockComponent),
//! [`TestClasses`](testing::TestClasses) and
//! [`ComponentTestHarness`](testing::ComponentTestHarness).

mod binding;
mod capability;
mod class;
mod component;
mod context;
mod error;
mod persistent;
mod tree;

pub mod testing;

pub use binding::{args_to_params, bind_params};
pub use capability::Capabilities;
pub use class::{ArgDecl, ClassDecl, ClassRegistry, MethodDecl, PersistentParamMeta, ResolvedClass};
pub use component::{signal_method, Component, HandlerResult};
pub use context::ComponentContext;
pub use error::ComponentError;
pub use persistent::{load_state, save_state};
pub use tree::{ComponentNode, ComponentTree};

// Re-export commonly used types from dependencies
pub use trellis_event::{Args, Outcome};
pub use trellis_types::{ClassId, ComponentPath, ErrorCode, Params};
