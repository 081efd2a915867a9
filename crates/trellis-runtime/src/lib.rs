//! Trellis Runtime - presenter dispatch lifecycle.
//!
//! This crate drives one presenter through one request: it restores
//! persistent state, delivers the pending signal, renders, and reconstructs
//! links that carry the state forward.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Component Layer                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  trellis-types     : ClassId, ComponentPath, Params         │
//! │  trellis-event     : Request, Signal, Outcome               │
//! │  trellis-component : classes, tree, state                   │
//! │  trellis-hook      : lifecycle hooks                        │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Runtime Layer (THIS CRATE)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  presenter/ : PresenterHost, PresenterState, contexts       │
//! │  state      : PersistentStateManager, GlobalState           │
//! │  signal     : SignalDispatcher                              │
//! │  link/      : Destination parsing, LinkResolver             │
//! │  services   : Router, PresenterLoader, AjaxDriver           │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Front Controller                          │
//! │  (routing, HTTP transport, template engine)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Lifecycle
//!
//! ```text
//! PresenterHost::run
//!   ├── startup   restore state, pick action, decode signal,
//!   │             action<Action>, canonicalize
//!   ├── prepare   prepare<View>
//!   ├── signal    handle<Signal> on the receiver
//!   ├── render    render<View>, freeze global state, template
//!   └── shutdown  always; flash expiration, on_shutdown hooks
//! ```
//!
//! Any handler may stop the sequence with a non-`Continue`
//! [`Outcome`](trellis_event::Outcome) (redirect, forward, terminate);
//! shutdown still runs.
//!
//! # Modules
//!
//! ## [`presenter`] - Lifecycle
//!
//! - [`PresenterHost`]: runs the phases
//! - [`PresenterContext`]: handler view of the presenter
//! - [`Presenter`]: application presenter trait
//!
//! ## [`state`] - Persistent State
//!
//! - [`PersistentStateManager`]: restore, collect, freeze
//! - [`GlobalState`]: flat `component-param` map with ownership
//!
//! ## [`link`] - Link Reconstruction
//!
//! - [`LinkResolver`]: destination → request → URL
//! - [`LinkMode`]: forward, redirect, link, canonical
//!
//! ## [`config`] - Configuration
//!
//! - [`TrellisConfig`]: unified configuration
//! - [`ConfigLoader`]: Default < Global < Project < Environment
//!
//! # Testing
//!
//! The [`testing`] module provides doubles for every collaborator and a
//! scriptable [`TestPresenter`](testing::TestPresenter).

pub mod caching;
pub mod config;
mod error;
mod http;
pub mod link;
pub mod presenter;
mod services;
pub mod session;
pub mod signal;
pub mod state;
pub mod templates;

pub mod testing;

pub use caching::CacheDecision;
pub use config::{
    default_config_dir, default_config_path, ConfigError, ConfigLoader, FlashConfig,
    InvalidLinkMode, PresenterConfig, TemplatesConfig, TrellisConfig,
};
pub use error::{DispatchError, DispatchResult};
pub use http::{uri_equals, HttpContext, HttpResponse};
pub use link::{handle_invalid_link, Destination, LinkMode, LinkResolver, ResolvedLink, Target};
pub use presenter::{
    action_method, prepare_method, render_method, ComponentScope, Phase, Presenter,
    PresenterContext, PresenterHost, PresenterState, ShutdownCause,
};
pub use services::{AjaxDriver, PresenterLoader, Router, Services};
pub use session::{FlashSession, MemorySessionStore, SessionStore};
pub use signal::{is_signal_receiver, Delivery, SignalDispatcher, SignalQuery};
pub use state::{split_param_key, GlobalState, PersistentStateManager, StateSource};
pub use templates::{select_template, TemplateRenderer, TemplateSelection};
