//! Running a presenter through one request.

use super::{
    action_method, fire_hook, prepare_method, render_method, ComponentScope, HookFlow, Phase, Presenter,
    PresenterContext, PresenterState, ShutdownCause,
};
use crate::http::uri_equals;
use crate::link::LinkMode;
use crate::session::flash_namespace;
use crate::signal::SignalDispatcher;
use crate::templates::select_template;
use crate::{DispatchError, DispatchResult, Services};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use trellis_component::{bind_params, load_state, signal_method, Component, ComponentError, MethodDecl, ResolvedClass};
use trellis_event::{Args, Outcome, Request, RequestPart, Signal};
use trellis_hook::HookPoint;
use trellis_types::{param_to_string, ComponentPath, Params, ACTION_KEY, SIGNAL_KEY};

/// Hosts one presenter instance for one request.
///
/// # Example
///
/// ```ignore
/// let mut host = PresenterHost::new(Box::new(ProductsPresenter::new()), request, services)?;
/// match host.run()? {
///     Outcome::Redirect { uri, code } => respond_redirect(&uri, code),
///     Outcome::Forward(request) => dispatch_again(*request),
///     _ => {}
/// }
/// ```
pub struct PresenterHost {
    presenter: Box<dyn Presenter>,
    state: PresenterState,
    services: Services,
    ran: bool,
    ajax_open: bool,
}

impl PresenterHost {
    /// Creates a host for `presenter` serving `request`.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Component`] if the presenter's class is not declared
    /// - [`DispatchError::InvalidState`] if the class is not a presenter class
    pub fn new(presenter: Box<dyn Presenter>, request: Request, services: Services) -> Result<Self, DispatchError> {
        let class = services.classes().resolve(presenter.class())?;
        if !class.is_presenter() {
            return Err(DispatchError::InvalidState(format!(
                "class '{}' is not a presenter class",
                class.id()
            )));
        }
        let state = PresenterState::new(request, class, &services.config().templates.layout);
        Ok(Self {
            presenter,
            state,
            services,
            ran: false,
            ajax_open: false,
        })
    }

    /// Read-only view of the presenter's state.
    #[must_use]
    pub fn state(&self) -> &PresenterState {
        &self.state
    }

    #[must_use]
    pub fn services(&self) -> &Services {
        &self.services
    }

    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        self.state.phase()
    }

    /// Global state (frozen once rendering finished).
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidState`] during shutdown unless frozen.
    pub fn global_state(&self) -> Result<Params, DispatchError> {
        self.state.global_state(None)
    }

    /// Presenter context outside of a handler.
    pub fn context(&mut self) -> PresenterContext<'_> {
        PresenterContext::new(&mut self.state, &self.services)
    }

    /// Attaches a component before or between dispatch steps.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Component`] for an unknown class, bad name or
    /// missing parent.
    pub fn attach(
        &mut self,
        parent: &ComponentPath,
        name: &str,
        component: Box<dyn Component>,
    ) -> Result<(), DispatchError> {
        self.state.attach(&self.services, parent, name, component)
    }

    /// Link for output from the component at `origin`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidLink`] in exception mode.
    pub fn create_link(&mut self, origin: &ComponentPath, destination: &str, args: Args) -> Result<String, DispatchError> {
        self.state.link(&self.services, origin, destination, args)
    }

    /// Redirect (303) to `destination`.
    ///
    /// # Errors
    ///
    /// Any link resolution error.
    pub fn redirect_to(&mut self, destination: &str, args: Args) -> DispatchResult {
        self.context().redirect_to(destination, args)
    }

    /// Forward to `destination`.
    ///
    /// # Errors
    ///
    /// Any link resolution error.
    pub fn forward_to(&mut self, destination: &str, args: Args) -> DispatchResult {
        self.context().forward(destination, args)
    }

    /// Runs the lifecycle.
    ///
    /// Returns [`Outcome::Continue`] when every phase completed, or the
    /// outcome that ended the dispatch early. Shutdown runs in every case,
    /// errors included.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::InvalidState`] when called a second time
    /// - whatever ended the dispatch
    pub fn run(&mut self) -> DispatchResult {
        if self.ran {
            return Err(DispatchError::InvalidState(
                "presenter instance has already run".into(),
            ));
        }
        self.ran = true;
        tracing::debug!(
            presenter = self.state.name(),
            method = self.state.request.method().as_str(),
            "dispatch started"
        );

        let result = self.run_phases();
        let result = self.shutdown(result);

        let payload = match &result {
            Ok(outcome) => json!({ "outcome": outcome.kind() }),
            Err(err) => json!({ "outcome": "error", "error": err.to_string() }),
        };
        if let Err(err) = fire_hook(
            &self.services,
            self.state.name(),
            HookPoint::RequestPostDispatch,
            None,
            payload,
        ) {
            tracing::warn!(error = %err, "post-dispatch hook failed");
        }
        result
    }

    fn run_phases(&mut self) -> DispatchResult {
        macro_rules! step {
            ($step:expr) => {
                match $step? {
                    Outcome::Continue => {}
                    outcome => return Ok(outcome),
                }
            };
        }

        self.enter(Phase::Startup);
        self.pre_dispatch()?;
        if self.services.is_ajax() {
            if let Some(ajax) = self.services.ajax() {
                ajax.open();
                self.ajax_open = true;
            }
        }
        self.init_global_params()?;
        step!(self.presenter.startup(&mut PresenterContext::new(&mut self.state, &self.services)));
        step!(self.try_call(&ComponentPath::root(), &action_method(&self.state.action)));
        if self.services.config().presenter.auto_canonicalize {
            step!(self.canonicalize());
        }
        if self.services.http().is_method("HEAD") {
            return Ok(Outcome::Terminate);
        }

        self.enter(Phase::Prepare);
        step!(self.presenter.before_prepare(&mut PresenterContext::new(&mut self.state, &self.services)));
        step!(self.try_call(&ComponentPath::root(), &prepare_method(&self.state.view)));

        self.enter(Phase::Signal);
        step!(self.process_signal());

        self.enter(Phase::Render);
        step!(self.presenter.before_render(&mut PresenterContext::new(&mut self.state, &self.services)));
        step!(self.try_call(&ComponentPath::root(), &render_method(&self.state.view)));
        step!(self.presenter.after_render(&mut PresenterContext::new(&mut self.state, &self.services)));

        let state = self.state.save_global_state()?;
        if self.services.is_ajax() {
            self.state.payload.insert("state".to_string(), Value::Object(state));
        }
        step!(self.render_template());

        Ok(Outcome::Continue)
    }

    fn enter(&mut self, phase: Phase) {
        self.state.enter(phase);
        tracing::debug!(presenter = self.state.name(), phase = %phase, "phase entered");
        if let Err(err) = fire_hook(
            &self.services,
            self.state.name(),
            HookPoint::PhaseOnEnter,
            None,
            json!({ "phase": phase.as_str() }),
        ) {
            tracing::warn!(error = %err, phase = %phase, "phase hook failed");
        }
    }

    /// Lets request guards abort the dispatch or rewrite its parameters.
    fn pre_dispatch(&mut self) -> Result<(), DispatchError> {
        let payload = json!({
            "method": self.state.request.method().as_str(),
            "params": Value::Object(self.state.request.params().clone()),
        });
        let flow = fire_hook(
            &self.services,
            self.state.name(),
            HookPoint::RequestPreDispatch,
            None,
            payload,
        )?;
        if let HookFlow::Continue(payload) = flow {
            if let Some(Value::Object(params)) = payload.get("params") {
                for (key, value) in params {
                    if self.state.request.param(key) != Some(value) {
                        self.state.request.modify(RequestPart::Params, key, value.clone());
                    }
                }
            }
        }
        Ok(())
    }

    /// Splits request parameters into presenter and component state and
    /// decodes the action and the pending signal.
    fn init_global_params(&mut self) -> Result<(), DispatchError> {
        let mut params = self.state.request.params().clone();
        if self.services.is_ajax() {
            let mut merged = self.state.request.post().clone();
            for (key, value) in params {
                merged.entry(key).or_insert(value);
            }
            params = merged;
        }

        let state = &mut self.state;
        let own = state.persistent.restore(&mut state.tree, &params)?;

        let action = own
            .get(ACTION_KEY)
            .filter(|v| !v.is_null())
            .map_or_else(
                || self.services.config().presenter.default_action.clone(),
                param_to_string,
            );
        state.change_action(&action)?;

        state.signal = own
            .get(SIGNAL_KEY)
            .map(param_to_string)
            .and_then(|raw| Signal::decode(&raw));
        state.params = load_state(&state.class, own);

        tracing::debug!(
            presenter = state.name(),
            action = %state.action,
            signal = state.signal.as_ref().map(Signal::encode),
            "global params initialized"
        );
        Ok(())
    }

    fn class_at(&self, path: &ComponentPath) -> Result<Arc<ResolvedClass>, DispatchError> {
        if path.is_root() {
            return Ok(Arc::clone(&self.state.class));
        }
        self.state
            .tree
            .get(path)
            .map(|node| Arc::clone(node.class()))
            .ok_or_else(|| DispatchError::InvalidState(format!("component '{path}' is not attached")))
    }

    /// Calls `method` if the class at `path` declares it.
    fn try_call(&mut self, path: &ComponentPath, method: &str) -> DispatchResult {
        let class = self.class_at(path)?;
        let Some(decl) = class.method(method).cloned() else {
            return Ok(Outcome::Continue);
        };
        self.invoke(path, &class, &decl)
    }

    fn invoke(&mut self, path: &ComponentPath, class: &ResolvedClass, method: &MethodDecl) -> DispatchResult {
        let params = self.state.node_params(path).cloned().unwrap_or_default();
        let args = bind_params(class, method, &params).map_err(|err| match err {
            ComponentError::InvalidParam(message) => DispatchError::BadRequest(message),
            other => other.into(),
        })?;
        tracing::debug!(component = %path, handler = method.name(), "calling handler");

        if path.is_root() {
            let mut ctx = PresenterContext::new(&mut self.state, &self.services);
            return self.presenter.call(method.name(), &args, &mut ctx);
        }

        let mut component = self
            .state
            .tree
            .get_mut(path)
            .and_then(|node| node.take_component())
            .ok_or_else(|| DispatchError::InvalidState(format!("component '{path}' is busy or detached")))?;
        let result = {
            let mut scope = ComponentScope::new(&mut self.state, &self.services, path.clone());
            component.call(method.name(), &args, &mut scope)
        };
        if let Some(node) = self.state.tree.get_mut(path) {
            node.restore_component(component);
        }
        result.map_err(DispatchError::from)
    }

    /// Redirects (301) to the canonical URL of the current request when it
    /// differs from the requested one.
    fn canonicalize(&mut self) -> DispatchResult {
        let request = &self.state.request;
        if self.services.is_ajax() || !(request.is_method("GET") || request.is_method("HEAD")) {
            return Ok(Outcome::Continue);
        }

        let mut args = self.state.global_state(None)?;
        for (key, value) in self.state.request.params() {
            args.entry(key.clone()).or_insert_with(|| value.clone());
        }
        let action = self.state.action.clone();

        let link = match self.state.resolve_link(
            &self.services,
            &ComponentPath::root(),
            &action,
            Args::from_params(args),
            LinkMode::Canonical,
        ) {
            Ok(link) => link,
            Err(DispatchError::InvalidLink(message)) => {
                tracing::debug!(error = %message, "no canonical URL, keeping request");
                return Ok(Outcome::Continue);
            }
            Err(err) => return Err(err),
        };

        let requested = self.services.http().uri();
        match link.url {
            Some(url) if !uri_equals(requested, &url) => {
                tracing::debug!(from = requested, to = %url, "canonical redirect");
                Ok(Outcome::redirect(url, Outcome::MOVED_PERMANENTLY))
            }
            _ => Ok(Outcome::Continue),
        }
    }

    fn process_signal(&mut self) -> DispatchResult {
        let Some(signal) = self.state.signal.clone() else {
            return Ok(Outcome::Continue);
        };
        let result = self.deliver(&signal);
        self.state.signal = None;
        result
    }

    fn deliver(&mut self, signal: &Signal) -> DispatchResult {
        let receiver = signal.receiver().clone();
        let payload = json!({ "receiver": receiver.as_str(), "signal": signal.name() });
        fire_hook(
            &self.services,
            self.state.name(),
            HookPoint::SignalPreDispatch,
            Some(&receiver),
            payload,
        )?;

        if !receiver.is_root() {
            self.ensure_component(&receiver)?;
        }

        let state = &mut self.state;
        let delivery = SignalDispatcher::new(&state.class, &mut state.invalidated, &mut state.tree).prepare(signal)?;
        tracing::debug!(
            receiver = %receiver,
            signal = signal.name(),
            handler = %signal_method(signal.name()),
            "delivering signal"
        );
        let outcome = self.invoke(&delivery.receiver, &delivery.class, &delivery.method)?;

        fire_hook(
            &self.services,
            self.state.name(),
            HookPoint::SignalPostDispatch,
            Some(&receiver),
            json!({ "receiver": receiver.as_str(), "signal": signal.name(), "outcome": outcome.kind() }),
        )?;
        Ok(outcome)
    }

    /// Creates the missing components along `path` through their parents'
    /// factories. Stops quietly at the first parent that cannot create the
    /// next child.
    fn ensure_component(&mut self, path: &ComponentPath) -> Result<(), DispatchError> {
        let segments: Vec<String> = path.segments().map(str::to_string).collect();
        let mut parent = ComponentPath::root();
        for name in segments {
            let child = parent.child(&name);
            if !self.state.tree.contains(&child) {
                let created = if parent.is_root() {
                    self.presenter.create_component(&name)
                } else {
                    self.create_child(&parent, &name)
                };
                let Some(component) = created else {
                    return Ok(());
                };
                tracing::debug!(path = %child, "component created on demand");
                self.state.attach(&self.services, &parent, &name, component)?;
            }
            parent = child;
        }
        Ok(())
    }

    fn create_child(&mut self, parent: &ComponentPath, name: &str) -> Option<Box<dyn Component>> {
        let node = self.state.tree.get_mut(parent)?;
        let mut component = node.take_component()?;
        let created = component.create_component(name);
        node.restore_component(component);
        created
    }

    fn render_template(&mut self) -> DispatchResult {
        let Some(renderer) = self.services.renderer() else {
            return Ok(Outcome::Continue);
        };
        let selection = select_template(
            renderer,
            &self.services.config().templates,
            self.state.name(),
            &self.state.view,
            self.state.layout.as_deref(),
        )?;

        let payload = json!({
            "template": selection.template.display().to_string(),
            "layout": selection.layout.as_ref().map(|l| l.display().to_string()),
        });
        let payload = match fire_hook(
            &self.services,
            self.state.name(),
            HookPoint::TemplatePreRender,
            None,
            payload,
        )? {
            HookFlow::Skip => return Ok(Outcome::Continue),
            HookFlow::Continue(payload) => payload,
        };

        let template = payload
            .get("template")
            .and_then(Value::as_str)
            .map_or(selection.template, PathBuf::from);
        let layout = payload
            .get("layout")
            .and_then(Value::as_str)
            .map(PathBuf::from);

        tracing::debug!(template = %template.display(), "rendering template");
        renderer
            .render(&template, layout.as_deref(), &self.state.params)
            .map_err(DispatchError::Handler)?;
        Ok(Outcome::Continue)
    }

    fn shutdown(&mut self, result: DispatchResult) -> DispatchResult {
        self.enter(Phase::Shutdown);

        if self.ajax_open {
            if let Some(ajax) = self.services.ajax() {
                ajax.close(&self.state.payload);
            }
        }

        if self.state.has_flash_session(&self.services) {
            if let (Some(store), Some(id)) = (self.services.session(), self.state.flash_id()) {
                let flash = &self.services.config().flash;
                let seconds = if matches!(result, Ok(Outcome::Redirect { .. })) {
                    flash.redirect_expiration_secs
                } else {
                    flash.expiration_secs
                };
                store.set_expiration(&flash_namespace(&id), seconds);
            }
        }

        let cause = match &result {
            Ok(Outcome::Continue) => None,
            Ok(outcome) => Some(ShutdownCause::Outcome(outcome)),
            Err(err) => Some(ShutdownCause::Error(err)),
        };
        if let Err(err) = fire_hook(
            &self.services,
            self.state.name(),
            HookPoint::PresenterOnShutdown,
            None,
            json!({ "cause": cause.map(|c| c.describe()) }),
        ) {
            tracing::warn!(error = %err, "shutdown hook failed");
        }
        self.presenter.shutdown(cause);

        match &result {
            Ok(outcome) => tracing::debug!(presenter = self.state.name(), outcome = outcome.kind(), "dispatch finished"),
            Err(err) => tracing::debug!(presenter = self.state.name(), error = %err, "dispatch failed"),
        }
        result
    }
}

impl std::fmt::Debug for PresenterHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenterHost")
            .field("presenter", self.presenter.class())
            .field("state", &self.state)
            .field("ran", &self.ran)
            .finish_non_exhaustive()
    }
}
