//! Collaborators of one dispatch.
//!
//! [`Services`] bundles every handle the engine needs: the class registry,
//! the router, the presenter loader, the HTTP boundary, the optional
//! session store, template renderer and AJAX channel, the hook registry and
//! the configuration. It is built once per request and passed explicitly to
//! the presenter host and the link resolver; nothing is looked up
//! globally.
//!
//! ```text
//! Services
//!   ├── classes   : Arc<ClassRegistry>        (process-wide, read-mostly)
//!   ├── router    : Arc<dyn Router>           Request ──► URL
//!   ├── loader    : Arc<dyn PresenterLoader>  "Shop:Products" ──► ClassId
//!   ├── http      : Arc<dyn HttpContext>      method, headers, URI
//!   ├── response  : Arc<dyn HttpResponse>     status, headers
//!   ├── session   : Option<Arc<dyn SessionStore>>
//!   ├── renderer  : Option<Arc<dyn TemplateRenderer>>
//!   ├── ajax      : Option<Arc<dyn AjaxDriver>>
//!   ├── hooks     : SharedHookRegistry
//!   └── config    : Arc<TrellisConfig>  (+ invalid-link mode, resolved once)
//! ```

use crate::config::{InvalidLinkMode, TrellisConfig};
use crate::http::{HttpContext, HttpResponse};
use crate::session::SessionStore;
use crate::templates::TemplateRenderer;
use std::fmt;
use std::sync::Arc;
use trellis_component::ClassRegistry;
use trellis_event::Request;
use trellis_hook::{HookRegistry, SharedHookRegistry};
use trellis_types::{ClassId, Params};

/// Turns presenter requests into URLs.
///
/// Must be a pure function of the request and the host context.
pub trait Router: Send + Sync {
    /// Returns the URL for `request`, or `None` if no route matches.
    fn construct_url(&self, request: &Request, http: &dyn HttpContext) -> Option<String>;
}

/// Maps presenter names to presenter classes.
pub trait PresenterLoader: Send + Sync {
    /// Returns the class of presenter `name` (`"Shop:Products"`).
    fn presenter_class(&self, name: &str) -> Option<ClassId>;
}

/// Response channel of AJAX requests.
pub trait AjaxDriver: Send + Sync {
    fn open(&self);

    /// Closes the channel, sending the collected payload.
    fn close(&self, payload: &Params);
}

/// Collaborators and configuration of one dispatch.
#[derive(Clone)]
pub struct Services {
    classes: Arc<ClassRegistry>,
    router: Arc<dyn Router>,
    loader: Arc<dyn PresenterLoader>,
    http: Arc<dyn HttpContext>,
    response: Arc<dyn HttpResponse>,
    session: Option<Arc<dyn SessionStore>>,
    renderer: Option<Arc<dyn TemplateRenderer>>,
    ajax: Option<Arc<dyn AjaxDriver>>,
    hooks: SharedHookRegistry,
    config: Arc<TrellisConfig>,
    invalid_link_mode: InvalidLinkMode,
}

impl Services {
    /// Creates services with default configuration and no optional
    /// collaborators.
    #[must_use]
    pub fn new(
        classes: Arc<ClassRegistry>,
        router: Arc<dyn Router>,
        loader: Arc<dyn PresenterLoader>,
        http: Arc<dyn HttpContext>,
        response: Arc<dyn HttpResponse>,
    ) -> Self {
        let config = Arc::new(TrellisConfig::default());
        Self {
            classes,
            router,
            loader,
            http,
            response,
            session: None,
            renderer: None,
            ajax: None,
            hooks: HookRegistry::new().shared(),
            invalid_link_mode: config.invalid_link_mode(),
            config,
        }
    }

    /// Sets the configuration and resolves the invalid-link mode from it.
    #[must_use]
    pub fn with_config(mut self, config: TrellisConfig) -> Self {
        self.invalid_link_mode = config.invalid_link_mode();
        self.config = Arc::new(config);
        self
    }

    #[must_use]
    pub fn with_session(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    #[must_use]
    pub fn with_ajax(mut self, ajax: Arc<dyn AjaxDriver>) -> Self {
        self.ajax = Some(ajax);
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: SharedHookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    #[must_use]
    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    #[must_use]
    pub fn router(&self) -> &dyn Router {
        self.router.as_ref()
    }

    #[must_use]
    pub fn loader(&self) -> &dyn PresenterLoader {
        self.loader.as_ref()
    }

    #[must_use]
    pub fn http(&self) -> &dyn HttpContext {
        self.http.as_ref()
    }

    #[must_use]
    pub fn response(&self) -> &dyn HttpResponse {
        self.response.as_ref()
    }

    #[must_use]
    pub fn session(&self) -> Option<&Arc<dyn SessionStore>> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn renderer(&self) -> Option<&dyn TemplateRenderer> {
        self.renderer.as_deref()
    }

    #[must_use]
    pub fn ajax(&self) -> Option<&dyn AjaxDriver> {
        self.ajax.as_deref()
    }

    #[must_use]
    pub fn hooks(&self) -> &SharedHookRegistry {
        &self.hooks
    }

    #[must_use]
    pub fn config(&self) -> &TrellisConfig {
        &self.config
    }

    /// Invalid-link mode resolved when the configuration was set.
    #[must_use]
    pub fn invalid_link_mode(&self) -> InvalidLinkMode {
        self.invalid_link_mode
    }

    /// Returns `true` if the request came over the AJAX channel.
    #[must_use]
    pub fn is_ajax(&self) -> bool {
        self.http.is_ajax()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("classes", &self.classes)
            .field("session", &self.session.is_some())
            .field("renderer", &self.renderer.is_some())
            .field("ajax", &self.ajax.is_some())
            .field("config", &self.config)
            .field("invalid_link_mode", &self.invalid_link_mode)
            .finish_non_exhaustive()
    }
}
