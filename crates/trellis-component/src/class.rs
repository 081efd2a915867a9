//! Declarative class metadata.
//!
//! Presenter and component classes are explicit, statically known tags.
//! Each class declares its parent, its capabilities, its persistent
//! parameters and child components, and the handler methods it implements.
//! The [`ClassRegistry`] flattens a declaration and its ancestors into a
//! [`ResolvedClass`] once; every later lookup reads the cached value.
//!
//! # Resolution
//!
//! ```text
//! ClassDecl("BasePresenter")      persistent: lang        methods: handleLogout
//!        ▲
//! ClassDecl("ProductsPresenter")  persistent: page        methods: actionShow, renderShow
//!        │
//!        ▼ resolve()
//! ResolvedClass("ProductsPresenter")
//!   ancestors:  {ProductsPresenter, BasePresenter}
//!   persistent: lang (since BasePresenter), page (since ProductsPresenter)
//!   methods:    handlelogout, actionshow, rendershow
//! ```
//!
//! Ancestors' persistent declarations come first and cannot be removed by a
//! subclass. Handler methods of a subclass override those of its ancestors.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use trellis_component::{ClassDecl, ClassRegistry, MethodDecl};
//! use trellis_types::ClassId;
//!
//! let registry = ClassRegistry::new();
//! registry
//!     .register(ClassDecl::presenter("BasePresenter").persistent("lang", json!("en")))
//!     .expect("register base");
//! registry
//!     .register(
//!         ClassDecl::presenter("ProductsPresenter")
//!             .extends("BasePresenter")
//!             .method(MethodDecl::new("actionShow").arg("id")),
//!     )
//!     .expect("register products");
//!
//! let class = registry.resolve(&ClassId::new("ProductsPresenter")).expect("resolve");
//! assert!(class.is_a(&ClassId::new("BasePresenter")));
//! assert!(class.is_persistent("lang"));
//! assert!(class.method("ACTIONshow").is_some());
//! ```

use crate::{Capabilities, ComponentError};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use trellis_types::ClassId;

/// A declared handler argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgDecl {
    pub name: String,
    /// `None` marks a required argument.
    pub default: Option<Value>,
}

/// A declared handler method (`actionShow`, `renderDefault`, `handleNext`, …).
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    name: String,
    args: Vec<ArgDecl>,
}

impl MethodDecl {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Adds a required argument.
    #[must_use]
    pub fn arg(mut self, name: impl Into<String>) -> Self {
        self.args.push(ArgDecl {
            name: name.into(),
            default: None,
        });
        self
    }

    /// Adds an argument with a default value.
    ///
    /// The default also fixes the type incoming values are coerced to.
    #[must_use]
    pub fn arg_or(mut self, name: impl Into<String>, default: Value) -> Self {
        self.args.push(ArgDecl {
            name: name.into(),
            default: Some(default),
        });
        self
    }

    /// Method name as declared.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn args(&self) -> &[ArgDecl] {
        &self.args
    }
}

/// Metadata of one persistent parameter after resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistentParamMeta {
    /// Default value; also the type the value is coerced to.
    pub default: Value,
    /// Class that declared the parameter.
    pub since: ClassId,
}

/// Declaration of a presenter or component class.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    id: ClassId,
    parent: Option<ClassId>,
    presenter: bool,
    capabilities: Capabilities,
    persistent_params: Vec<(String, Value)>,
    persistent_components: Vec<String>,
    methods: Vec<MethodDecl>,
}

impl ClassDecl {
    fn with_kind(id: impl Into<ClassId>, presenter: bool, capabilities: Capabilities) -> Self {
        Self {
            id: id.into(),
            parent: None,
            presenter,
            capabilities,
            persistent_params: Vec::new(),
            persistent_components: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Declares a presenter class (dispatch-capable tree root).
    #[must_use]
    pub fn presenter(id: impl Into<ClassId>) -> Self {
        Self::with_kind(id, true, Capabilities::CONTROL)
    }

    /// Declares a renderable component class.
    #[must_use]
    pub fn control(id: impl Into<ClassId>) -> Self {
        Self::with_kind(id, false, Capabilities::CONTROL)
    }

    /// Declares a non-rendering component class.
    #[must_use]
    pub fn component(id: impl Into<ClassId>) -> Self {
        Self::with_kind(id, false, Capabilities::COMPONENT)
    }

    /// Sets the parent class.
    #[must_use]
    pub fn extends(mut self, parent: impl Into<ClassId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Replaces the capability set declared by this class. Capabilities of
    /// ancestors are inherited regardless.
    #[must_use]
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Declares a persistent parameter with its default value.
    #[must_use]
    pub fn persistent(mut self, name: impl Into<String>, default: Value) -> Self {
        self.persistent_params.push((name.into(), default));
        self
    }

    /// Declares a persistent child component (presenters only).
    #[must_use]
    pub fn persistent_component(mut self, name: impl Into<String>) -> Self {
        self.persistent_components.push(name.into());
        self
    }

    /// Declares a handler method.
    #[must_use]
    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn id(&self) -> &ClassId {
        &self.id
    }
}

/// A class flattened together with all its ancestors.
#[derive(Debug, Clone)]
pub struct ResolvedClass {
    id: ClassId,
    ancestors: HashSet<ClassId>,
    presenter: bool,
    capabilities: Capabilities,
    persistent_params: Vec<(String, PersistentParamMeta)>,
    persistent_components: Vec<(String, ClassId)>,
    methods: HashMap<String, MethodDecl>,
}

impl ResolvedClass {
    #[must_use]
    pub fn id(&self) -> &ClassId {
        &self.id
    }

    /// Returns `true` if this class is `other` or descends from it.
    #[must_use]
    pub fn is_a(&self, other: &ClassId) -> bool {
        self.ancestors.contains(other)
    }

    /// Returns `true` for presenter classes and their descendants.
    #[must_use]
    pub fn is_presenter(&self) -> bool {
        self.presenter
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    #[must_use]
    pub fn has_capability(&self, capability: Capabilities) -> bool {
        self.capabilities.contains(capability)
    }

    /// Persistent parameters, ancestors' declarations first.
    pub fn persistent_params(&self) -> impl Iterator<Item = (&str, &PersistentParamMeta)> {
        self.persistent_params.iter().map(|(k, m)| (k.as_str(), m))
    }

    #[must_use]
    pub fn persistent_param(&self, name: &str) -> Option<&PersistentParamMeta> {
        self.persistent_params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, m)| m)
    }

    #[must_use]
    pub fn is_persistent(&self, name: &str) -> bool {
        self.persistent_param(name).is_some()
    }

    /// Persistent child components with the class that declared them.
    pub fn persistent_components(&self) -> impl Iterator<Item = (&str, &ClassId)> {
        self.persistent_components.iter().map(|(k, c)| (k.as_str(), c))
    }

    /// Class that declared `name` as a persistent component, if any.
    #[must_use]
    pub fn persistent_component_since(&self, name: &str) -> Option<&ClassId> {
        self.persistent_components
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, c)| c)
    }

    /// Looks up a handler method, ignoring case.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.get(&name.to_ascii_lowercase())
    }

    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.method(name).is_some()
    }
}

/// Process-wide registry of class declarations.
///
/// Resolution happens at most once per class; the result is shared as an
/// `Arc` and never changes afterwards. The registry is `Sync`, so one
/// instance can serve concurrent dispatches.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    decls: RwLock<HashMap<ClassId, ClassDecl>>,
    resolved: RwLock<HashMap<ClassId, Arc<ResolvedClass>>>,
}

impl ClassRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class declaration.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidState`] if the class was already
    /// declared.
    pub fn register(&self, decl: ClassDecl) -> Result<(), ComponentError> {
        let mut decls = self.decls.write();
        if decls.contains_key(decl.id()) {
            return Err(ComponentError::InvalidState(format!(
                "class '{}' is already declared",
                decl.id()
            )));
        }
        tracing::debug!(class = %decl.id(), parent = ?decl.parent, "class declared");
        decls.insert(decl.id().clone(), decl);
        Ok(())
    }

    /// Returns `true` if the class was declared.
    #[must_use]
    pub fn contains(&self, id: &ClassId) -> bool {
        self.decls.read().contains_key(id)
    }

    /// Resolves a class and its ancestry, caching the result.
    ///
    /// # Errors
    ///
    /// - [`ComponentError::UnknownClass`] if the class or an ancestor was
    ///   never declared
    /// - [`ComponentError::InvalidState`] if the ancestry is cyclic
    pub fn resolve(&self, id: &ClassId) -> Result<Arc<ResolvedClass>, ComponentError> {
        if let Some(class) = self.resolved.read().get(id) {
            return Ok(Arc::clone(class));
        }

        let class = Arc::new(self.flatten(id)?);
        let mut resolved = self.resolved.write();
        let entry = resolved.entry(id.clone()).or_insert(class);
        Ok(Arc::clone(entry))
    }

    fn flatten(&self, id: &ClassId) -> Result<ResolvedClass, ComponentError> {
        let decls = self.decls.read();

        // self first, root-most ancestor last
        let mut chain: Vec<&ClassDecl> = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(id);
        while let Some(current) = next {
            if !seen.insert(current.clone()) {
                return Err(ComponentError::InvalidState(format!(
                    "class hierarchy of '{id}' is cyclic"
                )));
            }
            let decl = decls
                .get(current)
                .ok_or_else(|| ComponentError::UnknownClass(current.to_string()))?;
            chain.push(decl);
            next = decl.parent.as_ref();
        }

        let own = chain[0];
        let mut persistent_params: Vec<(String, PersistentParamMeta)> = Vec::new();
        let mut persistent_components: Vec<(String, ClassId)> = Vec::new();
        let mut methods = HashMap::new();

        for decl in chain.iter().rev() {
            for (name, default) in &decl.persistent_params {
                if !persistent_params.iter().any(|(k, _)| k == name) {
                    persistent_params.push((
                        name.clone(),
                        PersistentParamMeta {
                            default: default.clone(),
                            since: decl.id.clone(),
                        },
                    ));
                }
            }
            for name in &decl.persistent_components {
                if !persistent_components.iter().any(|(k, _)| k == name) {
                    persistent_components.push((name.clone(), decl.id.clone()));
                }
            }
            for method in &decl.methods {
                methods.insert(method.name.to_ascii_lowercase(), method.clone());
            }
        }

        Ok(ResolvedClass {
            id: own.id.clone(),
            presenter: chain.iter().any(|d| d.presenter),
            capabilities: chain
                .iter()
                .fold(Capabilities::empty(), |all, d| all | d.capabilities),
            ancestors: seen,
            persistent_params,
            persistent_components,
            methods,
        })
    }
}
