//! Signals addressed to components.
//!
//! A signal is a named event aimed at one node of the component tree. It
//! travels in the `do` request parameter as the receiver's path and the
//! signal name joined with `-`:
//!
//! ```text
//! do=logout              → receiver ""         (the presenter), signal "logout"
//! do=cart-remove         → receiver "cart"     , signal "remove"
//! do=grid-pager-next     → receiver "grid-pager", signal "next"
//! ```
//!
//! At most one signal is pending per request. The dispatcher consumes it in
//! the signal phase and clears it right after delivery.
//!
//! # Example
//!
//! ```
//! use trellis_event::Signal;
//!
//! let signal = Signal::decode("grid-pager-next").expect("valid signal");
//! assert_eq!(signal.receiver().as_str(), "grid-pager");
//! assert_eq!(signal.name(), "next");
//! assert_eq!(signal.encode(), "grid-pager-next");
//!
//! let own = Signal::decode("logout").expect("valid signal");
//! assert!(own.is_for_presenter());
//! ```

use crate::EventError;
use serde::{Deserialize, Serialize};
use trellis_types::{ComponentPath, NAME_SEPARATOR};

/// A pending signal: receiver path plus signal name.
///
/// # Why No Default?
///
/// A signal without a name would be delivered as an empty handler call.
/// "No signal" is expressed as `Option<Signal>` instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signal {
    receiver: ComponentPath,
    name: String,
}

impl Signal {
    /// Creates a signal for the component at `receiver`.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidSignal`] if `name` is empty.
    pub fn new(receiver: ComponentPath, name: impl Into<String>) -> Result<Self, EventError> {
        let name = name.into();
        if name.is_empty() {
            return Err(EventError::InvalidSignal(format!(
                "signal for '{receiver}' must have a name"
            )));
        }
        Ok(Self { receiver, name })
    }

    /// Creates a signal addressed to the presenter itself.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidSignal`] if `name` is empty.
    pub fn for_presenter(name: impl Into<String>) -> Result<Self, EventError> {
        Self::new(ComponentPath::root(), name)
    }

    /// Decodes the value of the `do` parameter.
    ///
    /// The value is split at its last `-`. A separator in the first position
    /// does not count, so `"-x"` names signal `"-x"` on the presenter.
    /// Returns `None` when the signal name part is empty.
    #[must_use]
    pub fn decode(raw: &str) -> Option<Self> {
        let (receiver, name) = match raw.rfind(NAME_SEPARATOR) {
            Some(pos) if pos > 0 => (ComponentPath::from_joined(&raw[..pos]), &raw[pos + 1..]),
            _ => (ComponentPath::root(), raw),
        };
        Self::new(receiver, name).ok()
    }

    /// Encodes the signal for the `do` parameter.
    #[must_use]
    pub fn encode(&self) -> String {
        self.receiver.param_id(&self.name)
    }

    #[must_use]
    pub fn receiver(&self) -> &ComponentPath {
        &self.receiver
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the presenter itself receives this signal.
    #[must_use]
    pub fn is_for_presenter(&self) -> bool {
        self.receiver.is_root()
    }

    /// Returns `true` if `receiver` and `name` match, ignoring the name's case.
    #[must_use]
    pub fn matches(&self, receiver: &ComponentPath, name: &str) -> bool {
        &self.receiver == receiver && self.name.eq_ignore_ascii_case(name)
    }

    /// Returns `true` if the receiver is `path` or lies below it.
    #[must_use]
    pub fn targets_subtree(&self, path: &ComponentPath) -> bool {
        self.receiver.is_within(path)
    }
}
