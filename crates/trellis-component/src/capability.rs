//! Component capabilities.
//!
//! A component class declares once which optional roles its instances play.
//! The tree and the dispatcher test these flags instead of probing the
//! concrete type at every access.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Optional roles of a component class.
    ///
    /// | Capability | Used by |
    /// |------------|---------|
    /// | [`SIGNAL_RECEIVER`](Self::SIGNAL_RECEIVER) | Signal dispatch (`handle<Signal>` handlers) |
    /// | [`STATE_PERSISTENT`](Self::STATE_PERSISTENT) | Persistent state restore and snapshot |
    /// | [`RENDERABLE`](Self::RENDERABLE) | Invalidation before signal delivery |
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Capabilities: u8 {
        /// Accepts signals addressed to its path.
        const SIGNAL_RECEIVER  = 0b0000_0001;
        /// Carries persistent parameters across requests.
        const STATE_PERSISTENT = 0b0000_0010;
        /// Renders output and can be invalidated.
        const RENDERABLE       = 0b0000_0100;
    }
}

impl Capabilities {
    /// Plain component: receives signals and keeps state.
    pub const COMPONENT: Self = Self::SIGNAL_RECEIVER.union(Self::STATE_PERSISTENT);

    /// Control: a component that also renders.
    pub const CONTROL: Self = Self::COMPONENT.union(Self::RENDERABLE);

    /// Returns a human-readable list of capability names.
    ///
    /// # Example
    ///
    /// ```
    /// use trellis_component::Capabilities;
    ///
    /// let names = Capabilities::CONTROL.names();
    /// assert_eq!(names, vec!["SIGNAL_RECEIVER", "STATE_PERSISTENT", "RENDERABLE"]);
    /// ```
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Self::SIGNAL_RECEIVER) {
            names.push("SIGNAL_RECEIVER");
        }
        if self.contains(Self::STATE_PERSISTENT) {
            names.push("STATE_PERSISTENT");
        }
        if self.contains(Self::RENDERABLE) {
            names.push("RENDERABLE");
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_contains_component() {
        assert!(Capabilities::CONTROL.contains(Capabilities::COMPONENT));
        assert!(!Capabilities::COMPONENT.contains(Capabilities::RENDERABLE));
    }

    #[test]
    fn empty_has_no_names() {
        assert!(Capabilities::empty().names().is_empty());
    }
}
