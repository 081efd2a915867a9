//! Test doubles for driving a presenter without a web server.
//!
//! | Double | Stands in for |
//! |--------|---------------|
//! | [`SimpleRouter`] | [`Router`](crate::Router) |
//! | [`MapPresenterLoader`] | [`PresenterLoader`](crate::PresenterLoader) |
//! | [`TestHttp`] | [`HttpContext`](crate::HttpContext) |
//! | [`RecordingResponse`] | [`HttpResponse`](crate::HttpResponse) |
//! | [`RecordingRenderer`] | [`TemplateRenderer`](crate::TemplateRenderer) |
//! | [`RecordingAjax`] | [`AjaxDriver`](crate::AjaxDriver) |
//! | [`TestPresenter`] | an application presenter |
//!
//! [`TestEnv`] wires all of them into [`Services`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis_component::{ClassDecl, ClassRegistry};
//! use trellis_event::{Outcome, Request, RequestMethod};
//! use trellis_runtime::testing::{TestEnv, TestHttp, TestPresenter};
//! use trellis_runtime::PresenterHost;
//! use trellis_types::Params;
//!
//! let classes = Arc::new(ClassRegistry::new());
//! classes.register(ClassDecl::presenter("HomePresenter")).expect("class");
//!
//! let env = TestEnv::new(classes)
//!     .with_presenter("Home", "HomePresenter")
//!     .with_http(TestHttp::get("http://example.com/home/default"));
//! let presenter = TestPresenter::new("HomePresenter");
//! let log = presenter.log();
//!
//! let request = Request::new("Home", RequestMethod::Get, Params::new());
//! let mut host = PresenterHost::new(Box::new(presenter), request, env.services()).expect("host");
//! assert_eq!(host.run().expect("run"), Outcome::Continue);
//! assert_eq!(log.methods().last().map(String::as_str), Some("shutdown"));
//! ```

use crate::config::TrellisConfig;
use crate::presenter::{Presenter, PresenterContext, ShutdownCause};
use crate::session::MemorySessionStore;
use crate::services::{AjaxDriver, PresenterLoader, Router};
use crate::templates::TemplateRenderer;
use crate::{DispatchError, DispatchResult, HttpContext, HttpResponse, Services};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trellis_component::testing::{CallLog, CallRecord, MockComponent};
use trellis_component::{ClassRegistry, Component};
use trellis_event::{Outcome, Request};
use trellis_hook::{HookRegistry, SharedHookRegistry};
use trellis_types::{param_to_string, ClassId, ComponentPath, Params, ACTION_KEY};
use url::{form_urlencoded, Url};

// =============================================================================
// Router
// =============================================================================

/// Router producing `{host}/{module}/{presenter}/{action}?{sorted query}`.
///
/// Names are lower-cased; `null` parameters are left out, `true`/`false`
/// become `1`/`0` and arrays `key[]=v`. The query is form-encoded.
#[derive(Debug, Default)]
pub struct SimpleRouter {
    unroutable: HashSet<String>,
}

impl SimpleRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuses to build URLs for `presenter`.
    #[must_use]
    pub fn without(mut self, presenter: &str) -> Self {
        self.unroutable.insert(presenter.to_string());
        self
    }
}

impl Router for SimpleRouter {
    fn construct_url(&self, request: &Request, http: &dyn HttpContext) -> Option<String> {
        let presenter = request.presenter_name();
        if self.unroutable.contains(presenter) {
            return None;
        }

        let action = request
            .param(ACTION_KEY)
            .map(param_to_string)
            .unwrap_or_default();
        let path = presenter.replace(':', "/").to_ascii_lowercase();

        let mut query: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in request.params() {
            if key == ACTION_KEY {
                continue;
            }
            match value {
                Value::Null => {}
                Value::Bool(b) => {
                    let flag = if *b { "1" } else { "0" };
                    query.entry(key.clone()).or_default().push(flag.to_string());
                }
                Value::Array(items) => {
                    let entry = query.entry(format!("{key}[]")).or_default();
                    entry.extend(items.iter().map(param_to_string));
                }
                other => query.entry(key.clone()).or_default().push(param_to_string(other)),
            }
        }

        let mut url = format!("{}/{}/{}", http.host_uri(), path, action.to_ascii_lowercase());
        let mut pairs = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &query {
            for value in values {
                pairs.append_pair(key, value);
            }
        }
        let query = pairs.finish();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        Some(url)
    }
}

// =============================================================================
// Presenter loader
// =============================================================================

/// Presenter name → class lookup backed by a map.
#[derive(Debug, Default)]
pub struct MapPresenterLoader {
    classes: HashMap<String, ClassId>,
}

impl MapPresenterLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, presenter: &str, class: impl Into<ClassId>) -> Self {
        self.classes.insert(presenter.to_string(), class.into());
        self
    }
}

impl PresenterLoader for MapPresenterLoader {
    fn presenter_class(&self, name: &str) -> Option<ClassId> {
        self.classes.get(name).cloned()
    }
}

// =============================================================================
// HTTP
// =============================================================================

/// Fixed HTTP request.
#[derive(Debug, Clone)]
pub struct TestHttp {
    method: String,
    uri: String,
    host: String,
    headers: HashMap<String, String>,
    ajax: bool,
}

impl TestHttp {
    /// Request with `method` for absolute `uri`.
    #[must_use]
    pub fn new(method: &str, uri: &str) -> Self {
        let host = Url::parse(uri)
            .map(|url| url.origin().ascii_serialization())
            .unwrap_or_default();
        Self {
            method: method.to_ascii_uppercase(),
            uri: uri.to_string(),
            host,
            headers: HashMap::new(),
            ajax: false,
        }
    }

    #[must_use]
    pub fn get(uri: &str) -> Self {
        Self::new("GET", uri)
    }

    #[must_use]
    pub fn head(uri: &str) -> Self {
        Self::new("HEAD", uri)
    }

    #[must_use]
    pub fn post(uri: &str) -> Self {
        Self::new("POST", uri)
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Marks the request as sent by the AJAX channel.
    #[must_use]
    pub fn ajax(mut self) -> Self {
        self.ajax = true;
        self
    }
}

impl HttpContext for TestHttp {
    fn method(&self) -> &str {
        &self.method
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    fn is_ajax(&self) -> bool {
        self.ajax
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn host_uri(&self) -> &str {
        &self.host
    }
}

/// Records everything written to the response.
#[derive(Debug, Default)]
pub struct RecordingResponse {
    code: Mutex<Option<u16>>,
    headers: Mutex<HashMap<String, String>>,
    expiration: Mutex<Option<u64>>,
}

impl RecordingResponse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last status code set, if any.
    #[must_use]
    pub fn code(&self) -> Option<u16> {
        *self.code.lock()
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.lock().get(&name.to_ascii_lowercase()).cloned()
    }

    #[must_use]
    pub fn expiration(&self) -> Option<u64> {
        *self.expiration.lock()
    }
}

impl HttpResponse for RecordingResponse {
    fn set_code(&self, code: u16) {
        *self.code.lock() = Some(code);
    }

    fn set_header(&self, name: &str, value: &str) {
        self.headers
            .lock()
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    fn set_expiration(&self, seconds: u64) {
        *self.expiration.lock() = Some(seconds);
    }
}

// =============================================================================
// Rendering and AJAX
// =============================================================================

/// A rendered template.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRecord {
    pub template: PathBuf,
    pub layout: Option<PathBuf>,
    pub params: Params,
}

/// Renderer over a fixed set of existing template files.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    files: HashSet<PathBuf>,
    renders: Mutex<Vec<RenderRecord>>,
}

impl RecordingRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `path` as an existing template file.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.insert(path.into());
        self
    }

    #[must_use]
    pub fn renders(&self) -> Vec<RenderRecord> {
        self.renders.lock().clone()
    }
}

impl TemplateRenderer for RecordingRenderer {
    fn template_exists(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    fn render(&self, template: &Path, layout: Option<&Path>, params: &Params) -> Result<(), String> {
        self.renders.lock().push(RenderRecord {
            template: template.to_path_buf(),
            layout: layout.map(Path::to_path_buf),
            params: params.clone(),
        });
        Ok(())
    }
}

/// Counts opens and keeps the payloads sent on close.
#[derive(Debug, Default)]
pub struct RecordingAjax {
    opened: Mutex<usize>,
    closed: Mutex<Vec<Params>>,
}

impl RecordingAjax {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn opened(&self) -> usize {
        *self.opened.lock()
    }

    #[must_use]
    pub fn closed(&self) -> Vec<Params> {
        self.closed.lock().clone()
    }
}

impl AjaxDriver for RecordingAjax {
    fn open(&self) {
        *self.opened.lock() += 1;
    }

    fn close(&self, payload: &Params) {
        self.closed.lock().push(payload.clone());
    }
}

// =============================================================================
// Presenter
// =============================================================================

type Script = Box<dyn FnMut(&Params, &mut PresenterContext<'_>) -> DispatchResult + Send>;

/// Scriptable presenter.
///
/// Every handler and lifecycle callback is recorded in the log under its
/// name (`startup`, `beforePrepare`, `beforeRender`, `afterRender`,
/// `shutdown`, or the declared handler name). Unscripted handlers return
/// [`Outcome::Continue`].
pub struct TestPresenter {
    class: ClassId,
    log: CallLog,
    scripts: HashMap<String, Script>,
    children: HashMap<String, ClassId>,
    shutdown_cause: Arc<Mutex<Option<String>>>,
}

impl TestPresenter {
    #[must_use]
    pub fn new(class: impl Into<ClassId>) -> Self {
        Self {
            class: class.into(),
            log: CallLog::new(),
            scripts: HashMap::new(),
            children: HashMap::new(),
            shutdown_cause: Arc::new(Mutex::new(None)),
        }
    }

    /// Runs `script` when `method` is called.
    #[must_use]
    pub fn on<F>(mut self, method: &str, script: F) -> Self
    where
        F: FnMut(&Params, &mut PresenterContext<'_>) -> DispatchResult + Send + 'static,
    {
        self.scripts
            .insert(method.to_ascii_lowercase(), Box::new(script));
        self
    }

    /// Makes `method` return `outcome`.
    #[must_use]
    pub fn responding(self, method: &str, outcome: Outcome) -> Self {
        self.on(method, move |_, _| Ok(outcome.clone()))
    }

    /// Makes `method` fail with [`DispatchError::Handler`].
    #[must_use]
    pub fn failing(self, method: &str, message: &str) -> Self {
        let message = message.to_string();
        self.on(method, move |_, _| Err(DispatchError::Handler(message.clone())))
    }

    /// Creates top-level component `name` of `class` on demand. The
    /// component shares the presenter's log.
    #[must_use]
    pub fn spawning(mut self, name: &str, class: impl Into<ClassId>) -> Self {
        self.children.insert(name.to_string(), class.into());
        self
    }

    #[must_use]
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    /// Description of the shutdown cause (`outcome:<kind>`, `error:<msg>`,
    /// or `none`), once shut down.
    #[must_use]
    pub fn shutdown_cause(&self) -> Arc<Mutex<Option<String>>> {
        Arc::clone(&self.shutdown_cause)
    }

    fn dispatch(&mut self, method: &str, args: &Params, ctx: &mut PresenterContext<'_>) -> DispatchResult {
        self.log.push(CallRecord {
            path: ComponentPath::root(),
            method: method.to_string(),
            args: args.clone(),
        });
        match self.scripts.get_mut(&method.to_ascii_lowercase()) {
            Some(script) => script(args, ctx),
            None => Ok(Outcome::Continue),
        }
    }
}

impl Presenter for TestPresenter {
    fn class(&self) -> &ClassId {
        &self.class
    }

    fn call(&mut self, method: &str, args: &Params, ctx: &mut PresenterContext<'_>) -> DispatchResult {
        self.dispatch(method, args, ctx)
    }

    fn startup(&mut self, ctx: &mut PresenterContext<'_>) -> DispatchResult {
        self.dispatch("startup", &Params::new(), ctx)
    }

    fn before_prepare(&mut self, ctx: &mut PresenterContext<'_>) -> DispatchResult {
        self.dispatch("beforePrepare", &Params::new(), ctx)
    }

    fn before_render(&mut self, ctx: &mut PresenterContext<'_>) -> DispatchResult {
        self.dispatch("beforeRender", &Params::new(), ctx)
    }

    fn after_render(&mut self, ctx: &mut PresenterContext<'_>) -> DispatchResult {
        self.dispatch("afterRender", &Params::new(), ctx)
    }

    fn shutdown(&mut self, cause: Option<ShutdownCause<'_>>) {
        self.log.push(CallRecord {
            path: ComponentPath::root(),
            method: "shutdown".to_string(),
            args: Params::new(),
        });
        let description = match cause {
            None => "none".to_string(),
            Some(ShutdownCause::Outcome(outcome)) => format!("outcome:{}", outcome.kind()),
            Some(ShutdownCause::Error(err)) => format!("error:{err}"),
        };
        *self.shutdown_cause.lock() = Some(description);
    }

    fn create_component(&mut self, name: &str) -> Option<Box<dyn Component>> {
        let class = self.children.get(name)?.clone();
        Some(Box::new(MockComponent::new(class).with_log(self.log.clone())))
    }
}

impl fmt::Debug for TestPresenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestPresenter")
            .field("class", &self.class)
            .field("scripts", &self.scripts.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Environment
// =============================================================================

/// All doubles, wired together.
///
/// Defaults: `GET http://example.com/`, no renderer, an empty session
/// store, default configuration.
#[derive(Debug)]
pub struct TestEnv {
    pub classes: Arc<ClassRegistry>,
    pub router: Arc<SimpleRouter>,
    pub loader: MapPresenterLoader,
    pub http: Arc<TestHttp>,
    pub response: Arc<RecordingResponse>,
    pub session: Arc<MemorySessionStore>,
    pub renderer: Option<Arc<RecordingRenderer>>,
    pub ajax: Arc<RecordingAjax>,
    pub hooks: SharedHookRegistry,
    pub config: TrellisConfig,
}

impl TestEnv {
    #[must_use]
    pub fn new(classes: Arc<ClassRegistry>) -> Self {
        Self {
            classes,
            router: Arc::new(SimpleRouter::new()),
            loader: MapPresenterLoader::new(),
            http: Arc::new(TestHttp::get("http://example.com/")),
            response: Arc::new(RecordingResponse::new()),
            session: Arc::new(MemorySessionStore::new()),
            renderer: None,
            ajax: Arc::new(RecordingAjax::new()),
            hooks: HookRegistry::new().shared(),
            config: TrellisConfig::default(),
        }
    }

    /// Makes presenter `name` loadable as `class`.
    #[must_use]
    pub fn with_presenter(mut self, name: &str, class: impl Into<ClassId>) -> Self {
        self.loader = self.loader.with(name, class);
        self
    }

    #[must_use]
    pub fn with_http(mut self, http: TestHttp) -> Self {
        self.http = Arc::new(http);
        self
    }

    #[must_use]
    pub fn with_router(mut self, router: SimpleRouter) -> Self {
        self.router = Arc::new(router);
        self
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: RecordingRenderer) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: TrellisConfig) -> Self {
        self.config = config;
        self
    }

    /// Services for one dispatch. Each call snapshots the current loader.
    #[must_use]
    pub fn services(&self) -> Services {
        let loader = MapPresenterLoader {
            classes: self.loader.classes.clone(),
        };
        let mut services = Services::new(
            Arc::clone(&self.classes),
            Arc::clone(&self.router) as Arc<dyn Router>,
            Arc::new(loader),
            Arc::clone(&self.http) as Arc<dyn HttpContext>,
            Arc::clone(&self.response) as Arc<dyn HttpResponse>,
        )
        .with_config(self.config.clone())
        .with_session(Arc::clone(&self.session) as _)
        .with_ajax(Arc::clone(&self.ajax) as _)
        .with_hooks(Arc::clone(&self.hooks));
        if let Some(renderer) = &self.renderer {
            services = services.with_renderer(Arc::clone(renderer) as _);
        }
        services
    }
}
