//! Request-level values for Trellis.
//!
//! This crate provides the values that flow through one dispatch: the
//! incoming [`Request`], the pending [`Signal`], link [`Args`], and the
//! [`Outcome`] each phase step reports.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application SDK Layer                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  trellis-types     : ClassId, ComponentPath, Params         │
//! │  trellis-event     : Request, Signal, Args, Outcome ◄── HERE │
//! │  trellis-component : Component trait, ClassRegistry, tree   │
//! │  trellis-hook      : lifecycle hooks                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Dispatch Flow
//!
//! ```text
//!  Router ──► Request ──► PresenterHost::run
//!                              │
//!                              ├─ "do" param ──► Signal ──► SignalDispatcher
//!                              │
//!                              ├─ link(dest, Args) ──► Request (FORWARD) ──► Router ──► URL
//!                              │
//!                              └─► Outcome: Continue | Terminate | Redirect | Forward
//! ```
//!
//! # Message Types
//!
//! | Type | Produced by | Consumed by |
//! |------|-------------|-------------|
//! | [`Request`] | Router, link resolver | Presenter host |
//! | [`Signal`] | Decoding the `do` parameter | Signal dispatcher |
//! | [`Args`] | Application code | Link resolver |
//! | [`Outcome`] | Phase steps, navigation helpers | Presenter host, caller |
//!
//! # Error Handling
//!
//! ```
//! use trellis_event::{EventError, RequestMethod};
//! use trellis_types::ErrorCode;
//!
//! let err = "BREW".parse::<RequestMethod>().unwrap_err();
//! assert_eq!(err.code(), "EVENT_UNKNOWN_METHOD");
//! ```

mod args;
mod error;
mod outcome;
mod request;
mod signal;

pub use args::Args;
pub use error::EventError;
pub use outcome::Outcome;
pub use request::{Request, RequestMethod, RequestPart};
pub use signal::Signal;
