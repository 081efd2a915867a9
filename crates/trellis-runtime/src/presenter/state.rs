//! Request-scoped presenter state.

use super::{fire_hook, Phase};
use crate::link::{handle_invalid_link, LinkMode, LinkResolver, ResolvedLink};
use crate::session::{flash_namespace, generate_flash_id, FlashSession};
use crate::state::{PersistentStateManager, StateSource};
use crate::{DispatchError, Services};
use serde_json::{json, Value};
use std::sync::Arc;
use trellis_component::{Component, ComponentTree, ResolvedClass};
use trellis_event::{Args, Outcome, Request, Signal};
use trellis_hook::HookPoint;
use trellis_types::{is_valid_action_name, param_to_string, ComponentPath, Params, FLASH_KEY};

/// Everything a presenter knows about the request it serves.
///
/// Handlers reach it through their context; the host exposes it read-only
/// for inspection.
#[derive(Debug)]
pub struct PresenterState {
    pub(crate) request: Request,
    pub(crate) class: Arc<ResolvedClass>,
    pub(crate) phase: Option<Phase>,
    pub(crate) phases: Vec<Phase>,
    pub(crate) action: String,
    pub(crate) view: String,
    pub(crate) layout: Option<String>,
    pub(crate) params: Params,
    pub(crate) invalidated: bool,
    pub(crate) tree: ComponentTree,
    pub(crate) signal: Option<Signal>,
    pub(crate) persistent: PersistentStateManager,
    pub(crate) last_created: Option<Request>,
    pub(crate) payload: Params,
}

impl PresenterState {
    pub(crate) fn new(request: Request, class: Arc<ResolvedClass>, layout: &str) -> Self {
        Self {
            request,
            class,
            phase: None,
            phases: Vec::new(),
            action: String::new(),
            view: String::new(),
            layout: Some(layout.to_string()).filter(|l| !l.is_empty()),
            params: Params::new(),
            invalidated: false,
            tree: ComponentTree::new(),
            signal: None,
            persistent: PersistentStateManager::new(),
            last_created: None,
            payload: Params::new(),
        }
    }

    /// Module-qualified presenter name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.request.presenter_name()
    }

    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    #[must_use]
    pub fn class(&self) -> &Arc<ResolvedClass> {
        &self.class
    }

    /// Current phase; `None` before the dispatch starts.
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    /// Phases entered so far, in order.
    #[must_use]
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    #[must_use]
    pub fn view(&self) -> &str {
        &self.view
    }

    /// Layout name; `None` when layouts are disabled.
    #[must_use]
    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    /// The presenter's own parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    #[must_use]
    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    #[must_use]
    pub fn tree(&self) -> &ComponentTree {
        &self.tree
    }

    /// The signal waiting for delivery.
    #[must_use]
    pub fn signal(&self) -> Option<&Signal> {
        self.signal.as_ref()
    }

    /// Data collected for the AJAX response.
    #[must_use]
    pub fn payload(&self) -> &Params {
        &self.payload
    }

    #[must_use]
    pub fn last_created_request(&self) -> Option<&Request> {
        self.last_created.as_ref()
    }

    /// Flag of the last created request; `false` without one.
    #[must_use]
    pub fn last_created_request_flag(&self, flag: &str) -> bool {
        self.last_created
            .as_ref()
            .is_some_and(|request| request.has_flag(flag))
    }

    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.phase >= Some(Phase::Shutdown)
    }

    pub(crate) fn enter(&mut self, phase: Phase) {
        debug_assert!(self.phase < Some(phase), "phase {phase} entered out of order");
        self.phase = Some(phase);
        self.phases.push(phase);
    }

    fn source(&self) -> StateSource<'_> {
        StateSource {
            class: &self.class,
            params: &self.params,
            tree: &self.tree,
            shutting_down: self.is_shutting_down(),
        }
    }

    /// Persistent state carried by links, filtered for `for_class`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidState`] during shutdown unless the state was
    /// frozen before.
    pub fn global_state(&self, for_class: Option<&ResolvedClass>) -> Result<Params, DispatchError> {
        self.persistent.snapshot(self.source(), for_class)
    }

    /// Freezes the global state and returns it.
    ///
    /// # Errors
    ///
    /// As [`global_state`](Self::global_state).
    pub(crate) fn save_global_state(&mut self) -> Result<Params, DispatchError> {
        let source = StateSource {
            class: &self.class,
            params: &self.params,
            tree: &self.tree,
            shutting_down: self.phase >= Some(Phase::Shutdown),
        };
        Ok(self.persistent.freeze(source)?.values().clone())
    }

    /// Switches to `action`; the view follows the action.
    ///
    /// # Errors
    ///
    /// [`DispatchError::BadRequest`] if the name is not alphanumeric.
    pub fn change_action(&mut self, action: &str) -> Result<(), DispatchError> {
        if !is_valid_action_name(action) {
            return Err(DispatchError::BadRequest(format!(
                "Action name '{action}' is not alphanumeric string."
            )));
        }
        tracing::debug!(presenter = self.name(), action, "action changed");
        self.action = action.to_string();
        self.view = action.to_string();
        Ok(())
    }

    /// Current action, prefixed with `:<presenter>:` when
    /// `fully_qualified`.
    #[must_use]
    pub fn action_name(&self, fully_qualified: bool) -> String {
        if fully_qualified {
            format!(":{}:{}", self.name(), self.action)
        } else {
            self.action.clone()
        }
    }

    /// Returns `true` if the request carries a flash id whose session
    /// namespace exists.
    #[must_use]
    pub fn has_flash_session(&self, services: &Services) -> bool {
        let Some(store) = services.session() else {
            return false;
        };
        self.flash_id()
            .is_some_and(|id| store.has_namespace(&flash_namespace(&id)))
    }

    pub(crate) fn flash_id(&self) -> Option<String> {
        self.params
            .get(FLASH_KEY)
            .map(param_to_string)
            .filter(|id| !id.is_empty())
    }

    /// Flash session of this request, generating a flash id on first use.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidState`] if no session store is configured.
    pub(crate) fn flash_session(&mut self, services: &Services) -> Result<FlashSession, DispatchError> {
        let store = services
            .session()
            .ok_or_else(|| DispatchError::InvalidState("no session store is configured".into()))?;
        let id = match self.flash_id() {
            Some(id) => id,
            None => {
                let id = generate_flash_id();
                self.params.insert(FLASH_KEY.to_string(), Value::String(id.clone()));
                id
            }
        };
        Ok(FlashSession::open(id, Arc::clone(store)))
    }

    /// Resolves a link and records it as the last created request.
    ///
    /// The previous request is forgotten first, so a failed resolution
    /// leaves none.
    ///
    /// # Errors
    ///
    /// See [`LinkResolver::resolve`].
    pub(crate) fn resolve_link(
        &mut self,
        services: &Services,
        origin: &ComponentPath,
        destination: &str,
        args: Args,
        mode: LinkMode,
    ) -> Result<ResolvedLink, DispatchError> {
        self.last_created = None;
        let link = LinkResolver::new(services, self).resolve(origin, destination, args, mode)?;
        self.last_created = Some(link.request.clone());

        if let Some(url) = &link.url {
            let payload = json!({
                "destination": destination,
                "url": url,
                "current": link.is_current(),
            });
            fire_hook(services, self.name(), HookPoint::LinkPostResolve, Some(origin), payload)?;
        }
        Ok(link)
    }

    /// A link for output, with the invalid-link policy applied.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidLink`] in exception mode; state errors always.
    pub(crate) fn link(
        &mut self,
        services: &Services,
        origin: &ComponentPath,
        destination: &str,
        args: Args,
    ) -> Result<String, DispatchError> {
        let result = self
            .resolve_link(services, origin, destination, args, LinkMode::Link)
            .map(|link| link.url.unwrap_or_default());
        handle_invalid_link(services.invalid_link_mode(), result)
    }

    /// Redirect to a resolved destination.
    ///
    /// # Errors
    ///
    /// Any resolution error, invalid links included.
    pub(crate) fn redirect(
        &mut self,
        services: &Services,
        origin: &ComponentPath,
        code: u16,
        destination: &str,
        args: Args,
    ) -> Result<Outcome, DispatchError> {
        let link = self.resolve_link(services, origin, destination, args, LinkMode::Redirect)?;
        let uri = link.url.unwrap_or_default();
        Ok(self.redirect_uri(services, &uri, code))
    }

    /// Redirect to `uri`. AJAX requests get the target in the payload and
    /// terminate instead.
    pub(crate) fn redirect_uri(&mut self, services: &Services, uri: &str, code: u16) -> Outcome {
        if services.is_ajax() {
            self.payload.insert("redirect".to_string(), Value::String(uri.to_string()));
            return Outcome::Terminate;
        }
        Outcome::redirect(uri, code)
    }

    /// Attaches `component` below `parent` and loads its pending state.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Component`] for an unknown class, an invalid or
    /// duplicate name, or a missing parent.
    pub(crate) fn attach(
        &mut self,
        services: &Services,
        parent: &ComponentPath,
        name: &str,
        component: Box<dyn Component>,
    ) -> Result<(), DispatchError> {
        let class = services.classes().resolve(component.class())?;
        let node = self.tree.add(parent, name, class, component)?;
        self.persistent.load_into(node);
        Ok(())
    }

    /// Parameters of the node at `path` (root: the presenter).
    pub(crate) fn node_params(&self, path: &ComponentPath) -> Option<&Params> {
        if path.is_root() {
            Some(&self.params)
        } else {
            self.tree.get(path).map(|node| node.params())
        }
    }

    pub(crate) fn set_node_param(&mut self, path: &ComponentPath, name: &str, value: Value) {
        if path.is_root() {
            self.params.insert(name.to_string(), value);
        } else if let Some(node) = self.tree.get_mut(path) {
            node.set_param(name, value);
        }
    }
}
