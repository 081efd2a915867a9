//! Identifier types: presenter/component classes and component paths.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between component path segments (`"menu-item"`).
pub const NAME_SEPARATOR: char = '-';

/// Identifier of a presenter or component class.
///
/// Classes are explicit, statically known tags. Their ancestry is declared
/// once (see `trellis_component::ClassRegistry`) so that "is this class a
/// descendant of that one" is a set-membership test instead of reflection.
///
/// # Example
///
/// ```
/// use trellis_types::ClassId;
///
/// let class = ClassId::new("ProductsPresenter");
/// assert_eq!(class.as_str(), "ProductsPresenter");
/// assert_eq!(class.to_string(), "ProductsPresenter");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(String);

impl ClassId {
    /// Creates a class identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the class name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ClassId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Path of a component relative to its presenter.
///
/// Segments are joined with [`NAME_SEPARATOR`]. The empty path addresses the
/// presenter itself, which is why signal receivers and parameter prefixes
/// treat `""` specially.
///
/// # Example
///
/// ```
/// use trellis_types::ComponentPath;
///
/// let menu = ComponentPath::root().child("menu");
/// let item = menu.child("item");
///
/// assert_eq!(item.as_str(), "menu-item");
/// assert_eq!(item.depth(), 2);
/// assert_eq!(item.parent(), Some(menu.clone()));
/// assert_eq!(item.param_id("page"), "menu-item-page");
/// assert_eq!(ComponentPath::root().param_id("page"), "page");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentPath(String);

impl ComponentPath {
    /// The presenter's own path (`""`).
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Wraps an already joined path without validating its segments.
    #[must_use]
    pub fn from_joined(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Returns the path of the child `name` under this path.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}{}{}", self.0, NAME_SEPARATOR, name))
        }
    }

    /// Returns `true` for the presenter's own path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the joined path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the path segments (empty for the root).
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(NAME_SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Number of segments; the root has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// First segment, i.e. the top-level component this path belongs to.
    #[must_use]
    pub fn top_level(&self) -> Option<&str> {
        self.segments().next()
    }

    /// Last segment (the component's own name).
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Parent path; `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind(NAME_SEPARATOR) {
            Some(pos) => Some(Self(self.0[..pos].to_string())),
            None => Some(Self::root()),
        }
    }

    /// Name under which a parameter of this component travels in a URL.
    ///
    /// The presenter's own parameters are not prefixed.
    #[must_use]
    pub fn param_id(&self, name: &str) -> String {
        if self.0.is_empty() {
            name.to_string()
        } else {
            format!("{}{}{}", self.0, NAME_SEPARATOR, name)
        }
    }

    /// Returns `true` if `self` equals `other` or lies below it.
    #[must_use]
    pub fn is_within(&self, other: &ComponentPath) -> bool {
        other.is_root()
            || self.0 == other.0
            || (self.0.starts_with(&other.0)
                && self.0[other.0.len()..].starts_with(NAME_SEPARATOR))
    }
}

impl fmt::Display for ComponentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_path_properties() {
        let root = ComponentPath::root();
        assert!(root.is_root());
        assert_eq!(root.depth(), 0);
        assert_eq!(root.parent(), None);
        assert_eq!(root.top_level(), None);
    }

    #[test]
    fn nested_path_parent_chain() {
        let path = ComponentPath::from_joined("a-b-c");
        assert_eq!(path.name(), Some("c"));
        assert_eq!(path.top_level(), Some("a"));
        let parent = path.parent().expect("nested path has parent");
        assert_eq!(parent.as_str(), "a-b");
        let top = parent.parent().expect("a-b has parent");
        assert_eq!(top.as_str(), "a");
        assert_eq!(top.parent(), Some(ComponentPath::root()));
    }

    #[test]
    fn is_within_respects_segment_boundaries() {
        let menu = ComponentPath::from_joined("menu");
        let item = ComponentPath::from_joined("menu-item");
        let menus = ComponentPath::from_joined("menus");

        assert!(item.is_within(&menu));
        assert!(menu.is_within(&menu));
        assert!(!menus.is_within(&menu));
        assert!(menu.is_within(&ComponentPath::root()));
    }

    #[test]
    fn class_id_serde_is_transparent() {
        let json = serde_json::to_string(&ClassId::new("Base")).expect("serialize class");
        assert_eq!(json, "\"Base\"");
    }
}
