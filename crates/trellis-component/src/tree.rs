//! The presenter's component tree.
//!
//! The presenter is the implicit root (path `""`). Every other node has a
//! name unique among its siblings, and its path is the `-`-joined chain of
//! names from the root. Parents own their children; the path stored on a
//! node is the only upward reference.
//!
//! ```text
//! (presenter)            ""
//!  ├── menu              "menu"
//!  │    └── item         "menu-item"
//!  └── grid              "grid"
//!       └── pager        "grid-pager"
//! ```
//!
//! [`ComponentTree::walk`] visits nodes in pre-order (self first), which is
//! the order persistent state is collected in.

use crate::{Capabilities, Component, ComponentError, ResolvedClass};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use trellis_types::{is_valid_component_name, ComponentPath, Params};

/// One node of the component tree.
pub struct ComponentNode {
    name: String,
    path: ComponentPath,
    class: Arc<ResolvedClass>,
    component: Option<Box<dyn Component>>,
    params: Params,
    invalidated: bool,
    children: Vec<ComponentNode>,
}

impl ComponentNode {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn path(&self) -> &ComponentPath {
        &self.path
    }

    #[must_use]
    pub fn class(&self) -> &Arc<ResolvedClass> {
        &self.class
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.class.capabilities()
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Replaces all parameters (used when state is loaded).
    pub fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    pub fn set_param(&mut self, name: &str, value: Value) {
        self.params.insert(name.to_string(), value);
    }

    #[must_use]
    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    #[must_use]
    pub fn children(&self) -> &[ComponentNode] {
        &self.children
    }

    /// Takes the component out of the node while one of its handlers runs.
    ///
    /// Returns `None` if it is already taken.
    pub fn take_component(&mut self) -> Option<Box<dyn Component>> {
        self.component.take()
    }

    /// Puts a taken component back.
    pub fn restore_component(&mut self, component: Box<dyn Component>) {
        self.component = Some(component);
    }

    /// Returns `true` if the component is currently taken out.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.component.is_none()
    }
}

impl fmt::Debug for ComponentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentNode")
            .field("path", &self.path)
            .field("class", self.class.id())
            .field("params", &self.params)
            .field("invalidated", &self.invalidated)
            .field("children", &self.children)
            .finish()
    }
}

/// Components attached below a presenter.
#[derive(Debug, Default)]
pub struct ComponentTree {
    children: Vec<ComponentNode>,
}

impl ComponentTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `component` as child `name` of the node at `parent`.
    ///
    /// `class` must be the resolved class of `component`.
    ///
    /// # Errors
    ///
    /// - [`ComponentError::InvalidName`] if `name` is not `[A-Za-z0-9_]+`
    /// - [`ComponentError::NotFound`] if `parent` does not exist
    /// - [`ComponentError::DuplicateChild`] if the parent already has a
    ///   child called `name`
    /// - [`ComponentError::InvalidState`] if `class` does not match the
    ///   component
    pub fn add(
        &mut self,
        parent: &ComponentPath,
        name: &str,
        class: Arc<ResolvedClass>,
        component: Box<dyn Component>,
    ) -> Result<&mut ComponentNode, ComponentError> {
        if !is_valid_component_name(name) {
            return Err(ComponentError::InvalidName(name.to_string()));
        }
        if class.id() != component.class() {
            return Err(ComponentError::InvalidState(format!(
                "component of class '{}' attached as '{}'",
                component.class(),
                class.id()
            )));
        }

        let siblings = if parent.is_root() {
            &mut self.children
        } else {
            &mut self
                .get_mut(parent)
                .ok_or_else(|| ComponentError::NotFound(parent.to_string()))?
                .children
        };

        let path = parent.child(name);
        if siblings.iter().any(|c| c.name == name) {
            return Err(ComponentError::DuplicateChild(path.to_string()));
        }

        tracing::debug!(path = %path, class = %class.id(), "component attached");
        siblings.push(ComponentNode {
            name: name.to_string(),
            path,
            class,
            component: Some(component),
            params: Params::new(),
            invalidated: false,
            children: Vec::new(),
        });
        let index = siblings.len() - 1;
        Ok(&mut siblings[index])
    }

    /// Looks up a node by its full path (the root has no node).
    #[must_use]
    pub fn get(&self, path: &ComponentPath) -> Option<&ComponentNode> {
        let mut nodes = &self.children;
        let mut found = None;
        for segment in path.segments() {
            let node = nodes.iter().find(|n| n.name == segment)?;
            nodes = &node.children;
            found = Some(node);
        }
        found
    }

    #[must_use]
    pub fn get_mut(&mut self, path: &ComponentPath) -> Option<&mut ComponentNode> {
        let mut segments = path.segments();
        let first = segments.next()?;
        let mut node = self.children.iter_mut().find(|n| n.name == first)?;
        for segment in segments {
            node = node.children.iter_mut().find(|n| n.name == segment)?;
        }
        Some(node)
    }

    #[must_use]
    pub fn contains(&self, path: &ComponentPath) -> bool {
        self.get(path).is_some()
    }

    /// Detaches the node at `path` together with its subtree.
    pub fn remove(&mut self, path: &ComponentPath) -> Option<ComponentNode> {
        let name = path.name()?;
        let siblings = match path.parent() {
            Some(parent) if !parent.is_root() => &mut self.get_mut(&parent)?.children,
            _ => &mut self.children,
        };
        let index = siblings.iter().position(|n| n.name == name)?;
        Some(siblings.remove(index))
    }

    /// Nodes having all of `filter`'s capabilities, in pre-order.
    ///
    /// Nodes that do not match are skipped but their subtrees are still
    /// visited. An empty filter matches every node.
    #[must_use]
    pub fn walk(&self, filter: Capabilities) -> Vec<&ComponentNode> {
        fn visit<'a>(nodes: &'a [ComponentNode], filter: Capabilities, out: &mut Vec<&'a ComponentNode>) {
            for node in nodes {
                if node.capabilities().contains(filter) {
                    out.push(node);
                }
                visit(&node.children, filter, out);
            }
        }

        let mut out = Vec::new();
        visit(&self.children, filter, &mut out);
        out
    }

    /// Paths of the nodes [`walk`](Self::walk) would return.
    #[must_use]
    pub fn paths(&self, filter: Capabilities) -> Vec<ComponentPath> {
        self.walk(filter).into_iter().map(|n| n.path.clone()).collect()
    }

    /// Top-level nodes.
    #[must_use]
    pub fn children(&self) -> &[ComponentNode] {
        &self.children
    }

    /// Total number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.walk(Capabilities::empty()).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
