//! Handler contexts.
//!
//! [`ComponentScope`] is what component handlers see through
//! [`ComponentContext`]. [`PresenterContext`] is the presenter's own,
//! richer view: it implements the same trait for the root path and adds
//! the presenter-only operations (action and view control, navigation,
//! flash sessions, HTTP caching).

use super::state::PresenterState;
use crate::caching::{self, format_etag, http_date, CacheDecision};
use crate::link::LinkMode;
use crate::session::FlashSession;
use crate::signal::{is_signal_receiver, SignalQuery};
use crate::{DispatchError, DispatchResult, Services};
use chrono::{DateTime, Utc};
use serde_json::Value;
use trellis_component::{Component, ComponentContext, ComponentError, ComponentNode, HandlerResult};
use trellis_event::{Args, Outcome, Request, Signal};
use trellis_types::{ComponentPath, Params};

/// Context of a component handler (or of the presenter at the root path).
pub struct ComponentScope<'a> {
    state: &'a mut PresenterState,
    services: &'a Services,
    path: ComponentPath,
    empty: Params,
}

impl<'a> ComponentScope<'a> {
    pub(crate) fn new(state: &'a mut PresenterState, services: &'a Services, path: ComponentPath) -> Self {
        Self {
            state,
            services,
            path,
            empty: Params::new(),
        }
    }
}

impl ComponentContext for ComponentScope<'_> {
    fn path(&self) -> &ComponentPath {
        &self.path
    }

    fn params(&self) -> &Params {
        self.state.node_params(&self.path).unwrap_or(&self.empty)
    }

    fn set_param(&mut self, name: &str, value: Value) {
        self.state.set_node_param(&self.path, name, value);
    }

    fn link(&mut self, destination: &str, args: Args) -> Result<String, ComponentError> {
        Ok(self.state.link(self.services, &self.path, destination, args)?)
    }

    fn redirect(&mut self, destination: &str, args: Args) -> HandlerResult {
        Ok(self
            .state
            .redirect(self.services, &self.path, Outcome::SEE_OTHER, destination, args)?)
    }

    fn is_signal_receiver(&self, signal: Option<&str>) -> bool {
        let query = signal.map_or(SignalQuery::Receiver, SignalQuery::Named);
        is_signal_receiver(self.state.signal(), &self.path, query)
    }

    fn attach(&mut self, name: &str, component: Box<dyn Component>) -> Result<(), ComponentError> {
        Ok(self.state.attach(self.services, &self.path, name, component)?)
    }

    fn invalidate(&mut self) {
        if self.path.is_root() {
            self.state.invalidated = true;
        } else if let Some(node) = self.state.tree.get_mut(&self.path) {
            node.invalidate();
        }
    }

    fn is_invalid(&self) -> bool {
        if self.path.is_root() {
            self.state.invalidated
        } else {
            self.state
                .tree
                .get(&self.path)
                .is_some_and(ComponentNode::is_invalidated)
        }
    }
}

/// Context of a presenter handler.
///
/// # Example
///
/// ```ignore
/// fn call(&mut self, method: &str, args: &Params, ctx: &mut PresenterContext<'_>) -> DispatchResult {
///     match method {
///         "handleLogout" => ctx.redirect_to("Sign:in", Args::new()),
///         "actionEdit" if args["id"].is_null() => ctx.forward("default", Args::new()),
///         _ => Ok(Outcome::Continue),
///     }
/// }
/// ```
pub struct PresenterContext<'a> {
    scope: ComponentScope<'a>,
}

impl<'a> PresenterContext<'a> {
    pub(crate) fn new(state: &'a mut PresenterState, services: &'a Services) -> Self {
        Self {
            scope: ComponentScope::new(state, services, ComponentPath::root()),
        }
    }

    fn state(&self) -> &PresenterState {
        self.scope.state
    }

    fn state_mut(&mut self) -> &mut PresenterState {
        self.scope.state
    }

    fn services(&self) -> &'a Services {
        self.scope.services
    }

    /// The request being served.
    #[must_use]
    pub fn request(&self) -> &Request {
        self.state().request()
    }

    /// Module-qualified presenter name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.state().name()
    }

    /// Current action; `:<presenter>:<action>` when `fully_qualified`.
    #[must_use]
    pub fn action(&self, fully_qualified: bool) -> String {
        self.state().action_name(fully_qualified)
    }

    /// Switches the action (and with it the view).
    ///
    /// # Errors
    ///
    /// [`DispatchError::BadRequest`] if the name is not alphanumeric.
    pub fn change_action(&mut self, action: &str) -> Result<(), DispatchError> {
        self.state_mut().change_action(action)
    }

    #[must_use]
    pub fn view(&self) -> &str {
        self.state().view()
    }

    /// Switches the view; any name is accepted.
    pub fn set_view(&mut self, view: &str) {
        self.state_mut().view = view.to_string();
    }

    #[must_use]
    pub fn layout(&self) -> Option<&str> {
        self.state().layout()
    }

    /// Sets the layout; `None` or an empty name disables it.
    pub fn set_layout(&mut self, layout: Option<&str>) {
        self.state_mut().layout = layout.filter(|l| !l.is_empty()).map(str::to_string);
    }

    /// The signal waiting for delivery.
    #[must_use]
    pub fn signal(&self) -> Option<&Signal> {
        self.state().signal()
    }

    /// Asks whether the pending signal concerns the component at `path`.
    #[must_use]
    pub fn is_signal_receiver_at(&self, path: &ComponentPath, query: SignalQuery<'_>) -> bool {
        is_signal_receiver(self.state().signal(), path, query)
    }

    /// Node of an attached component.
    #[must_use]
    pub fn component(&self, path: &ComponentPath) -> Option<&ComponentNode> {
        self.state().tree().get(path)
    }

    /// Attaches `component` below the node at `parent`.
    ///
    /// # Errors
    ///
    /// As [`ComponentContext::attach`].
    pub fn attach_at(
        &mut self,
        parent: &ComponentPath,
        name: &str,
        component: Box<dyn Component>,
    ) -> Result<(), DispatchError> {
        let services = self.services();
        self.state_mut().attach(services, parent, name, component)
    }

    /// Persistent state carried by links, unfiltered.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidState`] during shutdown unless frozen.
    pub fn global_state(&self) -> Result<Params, DispatchError> {
        self.state().global_state(None)
    }

    /// Link for output, relative to the presenter.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidLink`] in exception mode.
    pub fn link_to(&mut self, destination: &str, args: Args) -> Result<String, DispatchError> {
        let services = self.services();
        self.state_mut()
            .link(services, &ComponentPath::root(), destination, args)
    }

    /// Redirect (303) to `destination`.
    ///
    /// # Errors
    ///
    /// Any link resolution error.
    pub fn redirect_to(&mut self, destination: &str, args: Args) -> DispatchResult {
        self.redirect_with_code(Outcome::SEE_OTHER, destination, args)
    }

    /// Redirect with an explicit status code.
    ///
    /// # Errors
    ///
    /// Any link resolution error.
    pub fn redirect_with_code(&mut self, code: u16, destination: &str, args: Args) -> DispatchResult {
        let services = self.services();
        self.state_mut()
            .redirect(services, &ComponentPath::root(), code, destination, args)
    }

    /// Redirect to a URL.
    pub fn redirect_uri(&mut self, uri: &str, code: u16) -> Outcome {
        let services = self.services();
        self.state_mut().redirect_uri(services, uri, code)
    }

    /// Forwards to `destination` without a round trip to the client.
    ///
    /// # Errors
    ///
    /// Any link resolution error.
    pub fn forward(&mut self, destination: &str, args: Args) -> DispatchResult {
        let services = self.services();
        let link = self.state_mut().resolve_link(
            services,
            &ComponentPath::root(),
            destination,
            args,
            LinkMode::Forward,
        )?;
        Ok(Outcome::forward(link.request))
    }

    /// Forwards to a ready-made request.
    #[must_use]
    pub fn forward_request(&self, request: Request) -> Outcome {
        Outcome::forward(request)
    }

    /// Destination leading back to the current page.
    #[must_use]
    pub fn backlink(&self) -> String {
        self.state().action_name(true)
    }

    /// Ends the dispatch without output.
    #[must_use]
    pub fn terminate(&self) -> Outcome {
        Outcome::Terminate
    }

    #[must_use]
    pub fn last_created_request(&self) -> Option<&Request> {
        self.state().last_created_request()
    }

    #[must_use]
    pub fn last_created_request_flag(&self, flag: &str) -> bool {
        self.state().last_created_request_flag(flag)
    }

    #[must_use]
    pub fn is_ajax(&self) -> bool {
        self.services().is_ajax()
    }

    /// Data for the AJAX response.
    pub fn payload(&mut self) -> &mut Params {
        &mut self.state_mut().payload
    }

    #[must_use]
    pub fn has_flash_session(&self) -> bool {
        self.state().has_flash_session(self.services())
    }

    /// Flash session of this request; the flash id is created on first
    /// use and carried by redirects.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidState`] if no session store is configured.
    pub fn flash_session(&mut self) -> Result<FlashSession, DispatchError> {
        let services = self.services();
        self.state_mut().flash_session(services)
    }

    /// Conditional GET support.
    ///
    /// Outside production mode nothing happens. Otherwise sets the
    /// expiration, `Last-Modified` and `ETag` headers, and answers 304 when
    /// the client's copy is fresh; return
    /// [`CacheDecision::outcome`] from the handler to stop there.
    pub fn last_modified(
        &mut self,
        last_modified: Option<DateTime<Utc>>,
        etag: Option<&str>,
        expire_secs: Option<u64>,
    ) -> CacheDecision {
        let services = self.services();
        if !services.config().production {
            return CacheDecision::Disabled;
        }

        let response = services.response();
        if let Some(seconds) = expire_secs {
            response.set_expiration(seconds);
        }

        let last_modified = last_modified.filter(|lm| lm.timestamp() > 0);
        if let Some(lm) = last_modified {
            response.set_header("Last-Modified", &http_date(lm));
        }
        let etag = etag.filter(|e| !e.is_empty()).map(format_etag);
        if let Some(tag) = &etag {
            response.set_header("ETag", tag);
        }

        let http = services.http();
        let decision = caching::evaluate(
            true,
            last_modified,
            etag.as_deref(),
            http.header("If-None-Match"),
            http.header("If-Modified-Since"),
        );
        if decision.is_not_modified() {
            tracing::debug!(presenter = self.name(), "client copy is fresh");
            response.set_code(Outcome::NOT_MODIFIED);
            response.set_header("Content-Length", "0");
        }
        decision
    }
}

impl ComponentContext for PresenterContext<'_> {
    fn path(&self) -> &ComponentPath {
        self.scope.path()
    }

    fn params(&self) -> &Params {
        self.scope.params()
    }

    fn set_param(&mut self, name: &str, value: Value) {
        self.scope.set_param(name, value);
    }

    fn link(&mut self, destination: &str, args: Args) -> Result<String, ComponentError> {
        self.scope.link(destination, args)
    }

    fn redirect(&mut self, destination: &str, args: Args) -> HandlerResult {
        self.scope.redirect(destination, args)
    }

    fn is_signal_receiver(&self, signal: Option<&str>) -> bool {
        self.scope.is_signal_receiver(signal)
    }

    fn attach(&mut self, name: &str, component: Box<dyn Component>) -> Result<(), ComponentError> {
        self.scope.attach(name, component)
    }

    fn invalidate(&mut self) {
        self.scope.invalidate();
    }

    fn is_invalid(&self) -> bool {
        self.scope.is_invalid()
    }
}
