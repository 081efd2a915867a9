//! Persistent state across requests.
//!
//! Persistent parameters are the component parameters that every generated
//! link carries, so a pager keeps its page while the user sorts a grid.
//! [`PersistentStateManager`] owns the request-scoped side of this:
//!
//! ```text
//! request params ──restore──► presenter params
//!                       └───► per-component bags ──► loaded on attach
//!
//! presenter + tree ──snapshot──► global state ──filter(for_class)──► link args
//!                  ──freeze────► frozen global state (read-only)
//! ```
//!
//! # Parameter Keys
//!
//! A key belongs to a component when it contains a `-` before its last
//! character: the text up to the last `-` is the component path, the rest
//! the parameter name (`grid-pager-page` → `grid-pager` / `page`). Keys of
//! length two or less, and keys without such a `-`, belong to the
//! presenter.
//!
//! # Since Filtering
//!
//! Every entry of the global state records the class that declared it
//! persistent ("since"). When the state is filtered for a target class,
//! entries are visited in order and grouped into contiguous runs sharing
//! the same since. A run is kept only if the target class is its since
//! class or descends from it; runs without a since are always dropped.
//!
//! ```text
//! key            since      for_class = ProductsPresenter (extends Base)
//! lang           Base       keep
//! page           Products   keep
//! cart-count     Base       keep
//! menu-open      Admin      drop
//! q-x            (none)     drop
//! ```

use crate::DispatchError;
use std::collections::{BTreeMap, HashMap};
use trellis_component::{load_state, save_state, Capabilities, ComponentNode, ComponentTree, ResolvedClass};
use trellis_types::{ClassId, ComponentPath, Params, NAME_SEPARATOR};

/// Splits a request parameter key into component path and parameter name.
///
/// Returns `None` for keys owned by the presenter.
///
/// # Example
///
/// ```
/// use trellis_runtime::split_param_key;
///
/// assert_eq!(split_param_key("grid-pager-page"), Some(("grid-pager", "page")));
/// assert_eq!(split_param_key("page"), None);
/// assert_eq!(split_param_key("a-"), None);
/// ```
#[must_use]
pub fn split_param_key(key: &str) -> Option<(&str, &str)> {
    if key.len() <= 2 {
        return None;
    }
    let last = key.char_indices().last().map_or(0, |(i, _)| i);
    let pos = key[..last].rfind(NAME_SEPARATOR)?;
    Some((&key[..pos], &key[pos + 1..]))
}

/// Global state together with the since class of each entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalState {
    values: Params,
    sinces: HashMap<String, Option<ClassId>>,
}

impl GlobalState {
    /// All entries, keyed by parameter id.
    #[must_use]
    pub fn values(&self) -> &Params {
        &self.values
    }

    /// Since class of `key`.
    ///
    /// Keys without a recorded since inherit the since of their nearest
    /// `-`-separated prefix; `None` when no prefix has one.
    #[must_use]
    pub fn since(&self, key: &str) -> Option<&ClassId> {
        if let Some(since) = self.sinces.get(key) {
            return since.as_ref();
        }
        let mut prefix = key;
        while let Some(pos) = prefix.rfind(NAME_SEPARATOR) {
            prefix = &prefix[..pos];
            if let Some(since) = self.sinces.get(prefix) {
                return since.as_ref();
            }
        }
        None
    }

    /// Entries visible to links targeting `class`.
    #[must_use]
    pub fn filter_for(&self, class: &ResolvedClass) -> Params {
        let mut out = Params::new();
        let mut run: Option<Option<&ClassId>> = None;
        let mut keep = false;

        for (key, value) in &self.values {
            let since = self.since(key);
            if run != Some(since) {
                run = Some(since);
                keep = since.is_some_and(|s| class.is_a(s));
            }
            if keep {
                out.insert(key.clone(), value.clone());
            }
        }
        out
    }

    fn insert(&mut self, key: String, value: serde_json::Value, since: Option<ClassId>) {
        self.sinces.insert(key.clone(), since);
        self.values.insert(key, value);
    }
}

/// What a snapshot is taken of.
#[derive(Debug, Clone, Copy)]
pub struct StateSource<'a> {
    /// Class of the presenter.
    pub class: &'a ResolvedClass,
    /// The presenter's own parameters.
    pub params: &'a Params,
    pub tree: &'a ComponentTree,
    /// `true` once the shutdown phase has begun.
    pub shutting_down: bool,
}

/// Request-scoped persistent state: pending parameter bags and the frozen
/// global state.
#[derive(Debug, Default)]
pub struct PersistentStateManager {
    pending: BTreeMap<String, Params>,
    frozen: Option<GlobalState>,
}

impl PersistentStateManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Partitions request parameters and loads the bags of attached
    /// components.
    ///
    /// Bags for components not attached yet stay pending until
    /// [`load_into`](Self::load_into) or [`pop`](Self::pop). Returns the
    /// presenter's own (unprefixed) parameters.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidState`] once the state is frozen.
    pub fn restore(&mut self, tree: &mut ComponentTree, params: &Params) -> Result<Params, DispatchError> {
        if self.is_frozen() {
            return Err(DispatchError::InvalidState(
                "Presenter is shutting down, cannot restore state.".into(),
            ));
        }

        self.pending.clear();
        let mut own = Params::new();
        for (key, value) in params {
            match split_param_key(key) {
                Some((component, name)) => {
                    self.pending
                        .entry(component.to_string())
                        .or_default()
                        .insert(name.to_string(), value.clone());
                }
                None => {
                    own.insert(key.clone(), value.clone());
                }
            }
        }

        for path in tree.paths(Capabilities::empty()) {
            if let Some(node) = tree.get_mut(&path) {
                self.load_into(node);
            }
        }

        tracing::debug!(
            own = own.len(),
            pending = self.pending.len(),
            "persistent state restored"
        );
        Ok(own)
    }

    /// Removes and returns the pending bag of the component at `path`.
    pub fn pop(&mut self, path: &ComponentPath) -> Params {
        self.pending.remove(path.as_str()).unwrap_or_default()
    }

    /// Pending bag of `path`, if any.
    #[must_use]
    pub fn pending(&self, path: &ComponentPath) -> Option<&Params> {
        self.pending.get(path.as_str())
    }

    /// Pops the node's pending bag and loads it into the node.
    ///
    /// Only persistent components coerce their declared parameters; other
    /// components receive the bag as it is.
    pub fn load_into(&mut self, node: &mut ComponentNode) {
        let bag = self.pop(node.path());
        if bag.is_empty() {
            return;
        }
        let params = if node.capabilities().contains(Capabilities::STATE_PERSISTENT) {
            load_state(node.class(), bag)
        } else {
            bag
        };
        node.set_params(params);
    }

    /// Global state, filtered for `for_class` when given.
    ///
    /// Once frozen, the frozen state is returned instead of a fresh
    /// snapshot.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::InvalidState`] when a fresh snapshot is needed
    ///   during shutdown
    /// - [`DispatchError::Component`] when a persistent value cannot be saved
    pub fn snapshot(
        &self,
        source: StateSource<'_>,
        for_class: Option<&ResolvedClass>,
    ) -> Result<Params, DispatchError> {
        let collected;
        let state = match &self.frozen {
            Some(frozen) => frozen,
            None => {
                collected = self.collect(source, for_class)?;
                &collected
            }
        };
        Ok(match for_class {
            Some(class) => state.filter_for(class),
            None => state.values.clone(),
        })
    }

    /// Takes the final snapshot. Later calls return the same state.
    ///
    /// # Errors
    ///
    /// As [`snapshot`](Self::snapshot).
    pub fn freeze(&mut self, source: StateSource<'_>) -> Result<&GlobalState, DispatchError> {
        if self.frozen.is_none() {
            let state = self.collect(source, None)?;
            self.pending.clear();
            tracing::debug!(entries = state.values.len(), "global state frozen");
            self.frozen = Some(state);
        }
        self.frozen
            .as_ref()
            .ok_or_else(|| DispatchError::InvalidState("global state was not frozen".into()))
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// The frozen state, if any.
    #[must_use]
    pub fn frozen(&self) -> Option<&GlobalState> {
        self.frozen.as_ref()
    }

    fn collect(
        &self,
        source: StateSource<'_>,
        for_class: Option<&ResolvedClass>,
    ) -> Result<GlobalState, DispatchError> {
        if source.shutting_down {
            return Err(DispatchError::InvalidState(
                "Presenter is shutting down, cannot save state.".into(),
            ));
        }

        let mut state = GlobalState::default();

        for (id, bag) in &self.pending {
            for (key, value) in bag {
                state
                    .values
                    .insert(format!("{id}{NAME_SEPARATOR}{key}"), value.clone());
            }
        }

        save_state(
            source.class,
            source.params,
            for_class.unwrap_or(source.class),
            &mut state.values,
        )?;
        for (name, meta) in source.class.persistent_params() {
            state.sinces.insert(name.to_string(), Some(meta.since.clone()));
        }

        for node in source.tree.walk(Capabilities::STATE_PERSISTENT) {
            let since = node
                .path()
                .top_level()
                .and_then(|top| source.class.persistent_component_since(top))
                .cloned();

            let mut params = Params::new();
            save_state(node.class(), node.params(), node.class(), &mut params)?;
            for (key, value) in params {
                state.insert(node.path().param_id(&key), value, since.clone());
            }
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use trellis_component::testing::MockComponent;
    use trellis_component::{ClassDecl, ClassRegistry};

    struct Fixture {
        registry: ClassRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = ClassRegistry::new();
            registry
                .register(
                    ClassDecl::presenter("Base")
                        .persistent("lang", json!("en"))
                        .persistent_component("cart"),
                )
                .expect("base");
            registry
                .register(
                    ClassDecl::presenter("Products")
                        .extends("Base")
                        .persistent("page", json!(1))
                        .persistent_component("grid"),
                )
                .expect("products");
            registry
                .register(ClassDecl::presenter("Other").persistent("tab", json!("a")))
                .expect("other");
            registry
                .register(ClassDecl::control("Pager").persistent("page", json!(1)))
                .expect("pager");
            Self { registry }
        }

        fn class(&self, id: &str) -> Arc<ResolvedClass> {
            self.registry.resolve(&ClassId::new(id)).expect("class")
        }

        fn attach(&self, tree: &mut ComponentTree, parent: &str, name: &str, class: &str) {
            tree.add(
                &ComponentPath::from_joined(parent),
                name,
                self.class(class),
                MockComponent::boxed(class),
            )
            .expect("attach");
        }
    }

    fn params(pairs: &[(&str, Value)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn source<'a>(class: &'a ResolvedClass, params: &'a Params, tree: &'a ComponentTree) -> StateSource<'a> {
        StateSource {
            class,
            params,
            tree,
            shutting_down: false,
        }
    }

    #[test]
    fn split_keys() {
        assert_eq!(split_param_key("cart-count"), Some(("cart", "count")));
        assert_eq!(split_param_key("a-b"), None);
        assert_eq!(split_param_key("do"), None);
        assert_eq!(split_param_key("grid-"), None);
        assert_eq!(split_param_key("-page"), Some(("", "page")));
    }

    #[test]
    fn restore_partitions_and_loads_attached() {
        let fx = Fixture::new();
        let mut tree = ComponentTree::new();
        fx.attach(&mut tree, "", "grid", "Pager");

        let mut manager = PersistentStateManager::new();
        let own = manager
            .restore(
                &mut tree,
                &params(&[
                    ("action", json!("show")),
                    ("grid-page", json!("3")),
                    ("menu-open", json!("1")),
                ]),
            )
            .expect("restore");

        assert_eq!(own, params(&[("action", json!("show"))]));
        let grid = tree.get(&ComponentPath::from_joined("grid")).expect("grid");
        assert_eq!(grid.params()["page"], json!(3));
        assert!(manager.pending(&ComponentPath::from_joined("grid")).is_none());
        assert_eq!(
            manager.pop(&ComponentPath::from_joined("menu")),
            params(&[("open", json!("1"))])
        );
        assert!(manager.pop(&ComponentPath::from_joined("menu")).is_empty());
    }

    #[test]
    fn snapshot_collects_presenter_and_components_pre_order() {
        let fx = Fixture::new();
        let products = fx.class("Products");
        let mut tree = ComponentTree::new();
        fx.attach(&mut tree, "", "grid", "Pager");
        fx.attach(&mut tree, "grid", "pager", "Pager");
        tree.get_mut(&ComponentPath::from_joined("grid-pager"))
            .expect("pager")
            .set_param("page", json!(4));

        let own = params(&[("lang", json!("cs"))]);
        let manager = PersistentStateManager::new();
        let state = manager
            .snapshot(source(&products, &own, &tree), None)
            .expect("snapshot");

        let keys: Vec<&str> = state.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["lang", "page", "grid-page", "grid-pager-page"]);
        assert_eq!(state["lang"], json!("cs"));
        assert_eq!(state["grid-page"], Value::Null);
        assert_eq!(state["grid-pager-page"], json!(4));
    }

    #[test]
    fn filter_keeps_runs_by_since() {
        let fx = Fixture::new();
        let products = fx.class("Products");
        let mut tree = ComponentTree::new();
        fx.attach(&mut tree, "", "grid", "Pager");
        fx.attach(&mut tree, "", "cart", "Pager");
        fx.attach(&mut tree, "", "extra", "Pager");

        let own = Params::new();
        let manager = PersistentStateManager::new();

        let for_base = manager
            .snapshot(source(&products, &own, &tree), Some(&fx.class("Base")))
            .expect("snapshot");
        let keys: Vec<&str> = for_base.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["lang", "cart-page"]);

        let for_products = manager
            .snapshot(source(&products, &own, &tree), Some(&products))
            .expect("snapshot");
        let keys: Vec<&str> = for_products.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["lang", "page", "grid-page", "cart-page"]);

        let for_other = manager
            .snapshot(source(&products, &own, &tree), Some(&fx.class("Other")))
            .expect("snapshot");
        assert!(for_other.is_empty());
    }

    #[test]
    fn pending_bags_without_since_are_dropped_when_filtering() {
        let fx = Fixture::new();
        let products = fx.class("Products");
        let mut tree = ComponentTree::new();
        let mut manager = PersistentStateManager::new();
        manager
            .restore(&mut tree, &params(&[("menu-open", json!("1"))]))
            .expect("restore");

        let own = Params::new();
        let all = manager
            .snapshot(source(&products, &own, &tree), None)
            .expect("snapshot");
        assert_eq!(all["menu-open"], json!("1"));

        let filtered = manager
            .snapshot(source(&products, &own, &tree), Some(&products))
            .expect("snapshot");
        assert!(!filtered.contains_key("menu-open"));
    }

    #[test]
    fn since_derives_from_prefix() {
        let mut state = GlobalState::default();
        state.insert("grid-page".into(), json!(2), Some(ClassId::new("Products")));
        state.insert("grid".into(), json!(null), Some(ClassId::new("Base")));
        state.values.insert("grid-sort-dir".into(), json!("asc"));

        assert_eq!(state.since("grid-sort-dir"), Some(&ClassId::new("Base")));
        assert_eq!(state.since("cart-x"), None);
    }

    #[test]
    fn freeze_is_idempotent_and_blocks_restore() {
        let fx = Fixture::new();
        let products = fx.class("Products");
        let mut tree = ComponentTree::new();
        let own = params(&[("page", json!(5))]);
        let mut manager = PersistentStateManager::new();

        let first = manager
            .freeze(source(&products, &own, &tree))
            .expect("freeze")
            .clone();

        let changed = params(&[("page", json!(9))]);
        let second = manager
            .freeze(source(&products, &changed, &tree))
            .expect("freeze")
            .clone();
        assert_eq!(first, second);

        let snapshot = manager
            .snapshot(source(&products, &changed, &tree), None)
            .expect("snapshot");
        assert_eq!(snapshot["page"], json!(5));

        let err = manager.restore(&mut tree, &Params::new()).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidState(_)));
    }

    #[test]
    fn snapshot_during_shutdown_fails_unless_frozen() {
        let fx = Fixture::new();
        let products = fx.class("Products");
        let tree = ComponentTree::new();
        let own = Params::new();
        let manager = PersistentStateManager::new();

        let err = manager
            .snapshot(
                StateSource {
                    shutting_down: true,
                    ..source(&products, &own, &tree)
                },
                None,
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid state: Presenter is shutting down, cannot save state."
        );
    }
}
