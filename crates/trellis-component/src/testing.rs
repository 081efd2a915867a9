//! Testing harnesses for Component implementations.
//!
//! Provides doubles and a harness for testing components without a
//! presenter host.
//!
//! # Features
//!
//! - [`MockComponent`]: records every handler call, with scripted outcomes
//! - [`TestClasses`]: a registry pre-populated with two small classes
//! - [`ComponentTestHarness`]: drives one component through state loading,
//!   handler calls and signals against a [`TestContext`]
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use trellis_component::testing::{ComponentTestHarness, MockComponent, TestClasses};
//! use trellis_component::ComponentContext;
//! use trellis_types::Params;
//!
//! let classes = TestClasses::new();
//! let mock = MockComponent::new("Control").setting("handleNext", "page", json!(2));
//! let log = mock.log();
//!
//! let mut harness = ComponentTestHarness::new(mock, classes.control());
//! harness.signal("next").expect("signal handled");
//!
//! assert_eq!(log.count("handleNext"), 1);
//! assert_eq!(harness.context().params()["page"], json!(2));
//! assert_eq!(harness.save().expect("save")["page"], json!(2));
//! ```

use crate::{
    bind_params, load_state, save_state, signal_method, Capabilities, ClassDecl, ClassRegistry,
    Component, ComponentContext, ComponentError, HandlerResult, MethodDecl, ResolvedClass,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use trellis_event::{Args, Outcome, Signal};
use trellis_types::{ClassId, ComponentPath, Params};

/// Record of a handler call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Path of the component the call was made through.
    pub path: ComponentPath,
    /// Declared method name.
    pub method: String,
    /// Bound arguments.
    pub args: Params,
}

/// Shared log of handler calls.
///
/// Cloning shares the underlying log, so a test can keep a handle after the
/// component was boxed into a tree.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<CallRecord>>>);

impl CallLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: CallRecord) {
        self.0.lock().push(record);
    }

    /// Snapshot of all recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<CallRecord> {
        self.0.lock().clone()
    }

    /// Recorded method names, in call order.
    #[must_use]
    pub fn methods(&self) -> Vec<String> {
        self.0.lock().iter().map(|r| r.method.clone()).collect()
    }

    /// Number of calls of `method` (case-insensitive).
    #[must_use]
    pub fn count(&self, method: &str) -> usize {
        self.0
            .lock()
            .iter()
            .filter(|r| r.method.eq_ignore_ascii_case(method))
            .count()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Scripted component double.
///
/// Every call is recorded. Unless scripted otherwise a handler returns
/// [`Outcome::Continue`].
#[derive(Debug, Clone)]
pub struct MockComponent {
    class: ClassId,
    log: CallLog,
    outcomes: HashMap<String, Outcome>,
    failures: HashMap<String, String>,
    writes: HashMap<String, Vec<(String, Value)>>,
    redirects: HashMap<String, String>,
    children: HashMap<String, ClassId>,
}

impl MockComponent {
    #[must_use]
    pub fn new(class: impl Into<ClassId>) -> Self {
        Self {
            class: class.into(),
            log: CallLog::new(),
            outcomes: HashMap::new(),
            failures: HashMap::new(),
            writes: HashMap::new(),
            redirects: HashMap::new(),
            children: HashMap::new(),
        }
    }

    /// Boxed mock with a fresh log.
    #[must_use]
    pub fn boxed(class: impl Into<ClassId>) -> Box<dyn Component> {
        Box::new(Self::new(class))
    }

    /// Records into an existing log.
    #[must_use]
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Makes `method` return `outcome`.
    #[must_use]
    pub fn responding(mut self, method: &str, outcome: Outcome) -> Self {
        self.outcomes.insert(method.to_ascii_lowercase(), outcome);
        self
    }

    /// Makes `method` fail with [`ComponentError::Failed`].
    #[must_use]
    pub fn failing(mut self, method: &str, message: impl Into<String>) -> Self {
        self.failures.insert(method.to_ascii_lowercase(), message.into());
        self
    }

    /// Makes `method` set parameter `name` through its context.
    #[must_use]
    pub fn setting(mut self, method: &str, name: &str, value: Value) -> Self {
        self.writes
            .entry(method.to_ascii_lowercase())
            .or_default()
            .push((name.to_string(), value));
        self
    }

    /// Makes `method` redirect to `destination` through its context.
    #[must_use]
    pub fn redirecting(mut self, method: &str, destination: impl Into<String>) -> Self {
        self.redirects
            .insert(method.to_ascii_lowercase(), destination.into());
        self
    }

    /// Makes the mock create child `name` of class `class` on demand. The
    /// child shares the parent's log.
    #[must_use]
    pub fn spawning(mut self, name: &str, class: impl Into<ClassId>) -> Self {
        self.children.insert(name.to_string(), class.into());
        self
    }

    /// Handle to the call log.
    #[must_use]
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl Component for MockComponent {
    fn class(&self) -> &ClassId {
        &self.class
    }

    fn call(
        &mut self,
        method: &str,
        args: &Params,
        ctx: &mut dyn ComponentContext,
    ) -> HandlerResult {
        self.log.push(CallRecord {
            path: ctx.path().clone(),
            method: method.to_string(),
            args: args.clone(),
        });

        let key = method.to_ascii_lowercase();
        if let Some(writes) = self.writes.get(&key) {
            for (name, value) in writes {
                ctx.set_param(name, value.clone());
            }
        }
        if let Some(message) = self.failures.get(&key) {
            return Err(ComponentError::Failed(message.clone()));
        }
        if let Some(destination) = self.redirects.get(&key) {
            return ctx.redirect(destination, Args::new());
        }
        Ok(self.outcomes.get(&key).cloned().unwrap_or(Outcome::Continue))
    }

    fn create_component(&mut self, name: &str) -> Option<Box<dyn Component>> {
        let class = self.children.get(name)?.clone();
        Some(Box::new(MockComponent::new(class).with_log(self.log.clone())))
    }
}

/// Registry with two ready-made classes.
///
/// | Class | Capabilities | Persistent | Handlers |
/// |-------|--------------|------------|----------|
/// | `Control` | control | `page = 1` | `handleNext`, `handleGo(page = 1)`, `renderDefault` |
/// | `Plain` | component | - | `handleSubmit` |
#[derive(Debug)]
pub struct TestClasses {
    registry: ClassRegistry,
}

impl TestClasses {
    /// # Panics
    ///
    /// Never in practice: the built-in declarations are valid.
    #[must_use]
    pub fn new() -> Self {
        let registry = ClassRegistry::new();
        registry
            .register(
                ClassDecl::control("Control")
                    .persistent("page", json!(1))
                    .method(MethodDecl::new("handleNext"))
                    .method(MethodDecl::new("handleGo").arg_or("page", json!(1)))
                    .method(MethodDecl::new("renderDefault")),
            )
            .expect("Control declaration is valid");
        registry
            .register(
                ClassDecl::component("Plain")
                    .capabilities(Capabilities::COMPONENT)
                    .method(MethodDecl::new("handleSubmit")),
            )
            .expect("Plain declaration is valid");
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// # Panics
    ///
    /// If `id` was not declared.
    #[must_use]
    pub fn resolve(&self, id: &str) -> Arc<ResolvedClass> {
        self.registry
            .resolve(&ClassId::new(id))
            .expect("test class is declared")
    }

    #[must_use]
    pub fn control(&self) -> Arc<ResolvedClass> {
        self.resolve("Control")
    }

    #[must_use]
    pub fn plain(&self) -> Arc<ResolvedClass> {
        self.resolve("Plain")
    }
}

impl Default for TestClasses {
    fn default() -> Self {
        Self::new()
    }
}

/// [`ComponentContext`] without a presenter behind it.
///
/// Links render as `link:<destination>`, redirects as a 303 to
/// `/<destination>`. Attached children are only remembered by name.
#[derive(Debug, Default)]
pub struct TestContext {
    path: ComponentPath,
    params: Params,
    signal: Option<Signal>,
    invalid: bool,
    links: Vec<String>,
    attached: Vec<String>,
}

impl TestContext {
    #[must_use]
    pub fn new(path: ComponentPath) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }

    /// Destinations of all links and redirects created so far.
    #[must_use]
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Names of attached children.
    #[must_use]
    pub fn attached(&self) -> &[String] {
        &self.attached
    }

    pub fn set_signal(&mut self, signal: Option<Signal>) {
        self.signal = signal;
    }

    pub fn replace_params(&mut self, params: Params) {
        self.params = params;
    }
}

impl ComponentContext for TestContext {
    fn path(&self) -> &ComponentPath {
        &self.path
    }

    fn params(&self) -> &Params {
        &self.params
    }

    fn set_param(&mut self, name: &str, value: Value) {
        self.params.insert(name.to_string(), value);
    }

    fn link(&mut self, destination: &str, _args: Args) -> Result<String, ComponentError> {
        self.links.push(destination.to_string());
        Ok(format!("link:{destination}"))
    }

    fn redirect(&mut self, destination: &str, _args: Args) -> HandlerResult {
        self.links.push(destination.to_string());
        Ok(Outcome::redirect(format!("/{destination}"), Outcome::SEE_OTHER))
    }

    fn is_signal_receiver(&self, signal: Option<&str>) -> bool {
        match (&self.signal, signal) {
            (Some(pending), Some(name)) => pending.matches(&self.path, name),
            (Some(pending), None) => pending.receiver() == &self.path,
            (None, _) => false,
        }
    }

    fn attach(&mut self, name: &str, component: Box<dyn Component>) -> Result<(), ComponentError> {
        if !trellis_types::is_valid_component_name(name) {
            return Err(ComponentError::InvalidName(name.to_string()));
        }
        if self.attached.iter().any(|n| n == name) {
            return Err(ComponentError::DuplicateChild(self.path.child(name).to_string()));
        }
        drop(component);
        self.attached.push(name.to_string());
        Ok(())
    }

    fn invalidate(&mut self) {
        self.invalid = true;
    }

    fn is_invalid(&self) -> bool {
        self.invalid
    }
}

/// Test harness for Component implementations.
///
/// Mirrors what the presenter host does for one node: state loading,
/// argument binding, signal delivery with invalidation, and state saving.
pub struct ComponentTestHarness<C: Component> {
    component: C,
    class: Arc<ResolvedClass>,
    context: TestContext,
}

impl<C: Component> ComponentTestHarness<C> {
    /// Creates a harness with the component at path `"test"`.
    pub fn new(component: C, class: Arc<ResolvedClass>) -> Self {
        Self {
            component,
            class,
            context: TestContext::new(ComponentPath::root().child("test")),
        }
    }

    #[must_use]
    pub fn component(&self) -> &C {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut C {
        &mut self.component
    }

    #[must_use]
    pub fn context(&self) -> &TestContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut TestContext {
        &mut self.context
    }

    /// Loads a parameter bag the way a restore would.
    pub fn load(&mut self, params: Params) {
        let loaded = load_state(&self.class, params);
        self.context.replace_params(loaded);
    }

    /// Saves the component's persistent state for its own class.
    ///
    /// # Errors
    ///
    /// Propagates [`save_state`] failures.
    pub fn save(&self) -> Result<Params, ComponentError> {
        let mut out = Params::new();
        save_state(&self.class, &self.context.params, &self.class, &mut out)?;
        Ok(out)
    }

    /// Calls a declared handler with arguments bound from the current params.
    ///
    /// Returns `Ok(None)` if the class does not declare `method`.
    ///
    /// # Errors
    ///
    /// Binding failures and handler errors.
    pub fn call(&mut self, method: &str) -> Result<Option<Outcome>, ComponentError> {
        let Some(decl) = self.class.method(method).cloned() else {
            return Ok(None);
        };
        let args = bind_params(&self.class, &decl, &self.context.params)?;
        self.component
            .call(decl.name(), &args, &mut self.context)
            .map(Some)
    }

    /// Delivers a signal, invalidating renderable components first.
    ///
    /// # Errors
    ///
    /// [`ComponentError::BadSignal`] if the class has no handler for it.
    pub fn signal(&mut self, name: &str) -> HandlerResult {
        let signal = Signal::new(self.context.path.clone(), name)
            .map_err(|e| ComponentError::BadSignal(e.to_string()))?;
        self.context.set_signal(Some(signal));
        if self.class.has_capability(Capabilities::RENDERABLE) {
            self.context.invalidate();
        }
        let result = self.call(&signal_method(name));
        self.context.set_signal(None);
        result?.ok_or_else(|| {
            ComponentError::BadSignal(format!(
                "There is no handler for signal '{name}' in class {}.",
                self.class.id()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_records_calls_through_shared_log() {
        let log = CallLog::new();
        let mut component: Box<dyn Component> =
            Box::new(MockComponent::new("Control").with_log(log.clone()));
        let mut ctx = TestContext::new(ComponentPath::from_joined("menu"));

        component
            .call("renderDefault", &Params::new(), &mut ctx)
            .expect("call");

        assert_eq!(log.methods(), vec!["renderDefault"]);
        assert_eq!(log.calls()[0].path.as_str(), "menu");
    }

    #[test]
    fn mock_scripted_failure() {
        let mut mock = MockComponent::new("Plain").failing("handleSubmit", "boom");
        let mut ctx = TestContext::default();
        let err = mock.call("handleSubmit", &Params::new(), &mut ctx).unwrap_err();
        assert_eq!(err, ComponentError::Failed("boom".into()));
    }

    #[test]
    fn harness_signal_without_handler_is_bad_signal() {
        let classes = TestClasses::new();
        let mut harness = ComponentTestHarness::new(MockComponent::new("Plain"), classes.plain());
        let err = harness.signal("missing").unwrap_err();
        assert!(matches!(err, ComponentError::BadSignal(_)));
        assert!(!harness.context().is_invalid());
    }

    #[test]
    fn harness_signal_invalidates_renderable() {
        let classes = TestClasses::new();
        let mut harness =
            ComponentTestHarness::new(MockComponent::new("Control"), classes.control());
        harness.signal("next").expect("signal");
        assert!(harness.context().is_invalid());
        assert!(!harness.context().is_signal_receiver(None));
    }

    #[test]
    fn harness_binds_from_loaded_params() {
        let classes = TestClasses::new();
        let mock = MockComponent::new("Control");
        let log = mock.log();
        let mut harness = ComponentTestHarness::new(mock, classes.control());

        let mut params = Params::new();
        params.insert("page".into(), json!("4"));
        harness.load(params);
        harness.signal("go").expect("signal");

        assert_eq!(log.calls()[0].args["page"], json!(4));
    }

    #[test]
    fn harness_redirect_outcome() {
        let classes = TestClasses::new();
        let mock = MockComponent::new("Control").redirecting("handleNext", "this");
        let mut harness = ComponentTestHarness::new(mock, classes.control());

        let outcome = harness.signal("next").expect("signal");
        assert_eq!(outcome, Outcome::redirect("/this", Outcome::SEE_OTHER));
        assert_eq!(harness.context().links(), &["this".to_string()]);
    }

    #[test]
    fn context_attach_validates_names() {
        let mut ctx = TestContext::default();
        ctx.attach("child", MockComponent::boxed("Plain")).expect("attach");
        assert!(ctx.attach("child", MockComponent::boxed("Plain")).is_err());
        assert!(ctx.attach("bad name", MockComponent::boxed("Plain")).is_err());
    }
}
