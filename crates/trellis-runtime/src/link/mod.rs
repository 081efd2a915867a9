//! Link construction.
//!
//! | Mode | Used by | URL | Flash id | Invalid links |
//! |------|---------|-----|----------|---------------|
//! | [`LinkMode::Link`] | `link()` | relative to the host | - | invalid-link policy |
//! | [`LinkMode::Redirect`] | `redirect()` | absolute | carried | error |
//! | [`LinkMode::Canonical`] | canonicalization | absolute | - | error |
//! | [`LinkMode::Forward`] | `forward()` | none | - | error |
//!
//! Every resolution also records the created request, which the presenter
//! exposes as the last created request.

mod destination;
mod policy;
mod resolver;

pub use destination::{parse_query, Destination, Target};
pub use policy::handle_invalid_link;
pub use resolver::LinkResolver;

use trellis_event::Request;

/// What a link is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkMode {
    /// An internal forward; no URL is built.
    Forward,
    /// A redirect; the flash session id is carried along.
    Redirect,
    /// A link rendered into output.
    Link,
    /// The canonical URL of the current request.
    Canonical,
}

/// Result of resolving a destination.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLink {
    /// Request the link stands for, flagged `current` when it matches the
    /// request being served.
    pub request: Request,
    /// URL including the fragment; `None` in forward mode.
    pub url: Option<String>,
}

impl ResolvedLink {
    /// Returns `true` if the link points at the current page.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.request.has_flag(Request::FLAG_CURRENT)
    }
}
