//! Core types for Trellis.
//!
//! This crate provides the identifier and parameter types shared by every
//! layer of the Trellis presenter engine.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application SDK Layer                     │
//! │  (SemVer stable, safe to depend on from presenters)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  trellis-types     : ClassId, ComponentPath, Params ◄── HERE │
//! │  trellis-event     : Request, Signal, Args, Outcome         │
//! │  trellis-component : Component trait, ClassRegistry, tree   │
//! │  trellis-hook      : lifecycle hooks                        │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Runtime Layer                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  trellis-runtime   : state, signals, links, lifecycle       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Naming
//!
//! | Item | Rule |
//! |------|------|
//! | Component name | `[A-Za-z0-9_]+`, unique among siblings |
//! | Component path | names joined with `-` (`"menu-item"`) |
//! | Parameter id | `path-param`, or just `param` on the presenter |
//! | Action name | starts with a letter or digit |
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use trellis_types::{ComponentPath, Params, SIGNAL_KEY};
//!
//! let pager = ComponentPath::root().child("grid").child("pager");
//!
//! let mut params = Params::new();
//! params.insert(pager.param_id("page"), json!(2));
//! params.insert(SIGNAL_KEY.into(), json!(pager.param_id("next")));
//!
//! assert_eq!(params["grid-pager-page"], json!(2));
//! assert_eq!(params["do"], json!("grid-pager-next"));
//! ```

mod error;
mod id;
mod params;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{ClassId, ComponentPath, NAME_SEPARATOR};
pub use params::{
    capitalize, coerce_like, is_scalar, is_valid_action_name, is_valid_component_name,
    param_to_string, Params, ACTION_KEY, FLASH_KEY, SIGNAL_KEY,
};
