//! Link resolution.
//!
//! Turns a destination plus arguments into a presenter request and, unless
//! forwarding, a URL:
//!
//! ```text
//! "grid:sort!" + args
//!   │ parse ─────────────► target, signal, query, scheme, fragment
//!   │ signal arguments ──► handle<Signal> binding, component state, prefixing
//!   │ action arguments ──► action<A>/render<A> binding, presenter state
//!   │ global state ──────► persistent params visible to the target class
//!   │ action, do, _fid
//!   ▼
//! Request(presenter, FORWARD, params) {current}
//!   │ router
//!   ▼
//! URL (relative to the host in link mode) + fragment
//! ```
//!
//! A link is *current* when it points at the presenter class and action
//! being served, its arguments equal the current state, and its signal
//! equals the pending one.

use super::{Destination, LinkMode, ResolvedLink, Target};
use crate::presenter::{action_method, render_method, PresenterState};
use crate::{DispatchError, Services};
use serde_json::Value;
use std::sync::Arc;
use trellis_component::{args_to_params, save_state, signal_method, ResolvedClass};
use trellis_event::{Args, Request, RequestMethod};
use trellis_types::{param_to_string, ComponentPath, Params, ACTION_KEY, FLASH_KEY, NAME_SEPARATOR, SIGNAL_KEY};

/// Builds links for one presenter.
#[derive(Debug)]
pub struct LinkResolver<'a> {
    services: &'a Services,
    state: &'a PresenterState,
}

impl<'a> LinkResolver<'a> {
    #[must_use]
    pub fn new(services: &'a Services, state: &'a PresenterState) -> Self {
        Self { services, state }
    }

    /// Resolves `destination` as seen from the component at `origin`.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::InvalidLink`] if the destination, its arguments
    ///   or the route cannot be resolved
    /// - [`DispatchError::InvalidState`] if the global state is needed
    ///   during shutdown
    pub fn resolve(
        &self,
        origin: &ComponentPath,
        destination: &str,
        args: Args,
        mode: LinkMode,
    ) -> Result<ResolvedLink, DispatchError> {
        let parsed = Destination::parse(destination, origin.is_root())?;
        let mut args = match &parsed.query {
            Some(query) => Args::from_params(query.clone()),
            None => args,
        };

        let origin = self.signal_origin(origin, parsed.signal_receiver.as_deref())?;
        let target = Target::split(&parsed.target, self.state.name(), self.state.action())?;
        let class = self.target_class(&target)?;

        let mut signal = String::new();
        if let Some(name) = &parsed.signal {
            let (own_class, own_params) = self.component(&origin)?;
            if name == "this" {
                if args.has_positional() {
                    return Err(DispatchError::InvalidLink(format!(
                        "Extra parameter for signal '{}:this!'.",
                        own_class.id()
                    )));
                }
            } else {
                signal.clone_from(name);
            }
            args = Args::from_params(self.signal_params(&origin, own_class, own_params, &signal, args)?);
        }

        let mut current = false;
        let mut action = target.action;
        let mut params = if class.is_presenter() {
            if action.is_empty() {
                action.clone_from(&self.services.config().presenter.default_action);
            }
            current = (action == "*" || action == self.state.action()) && class.id() == self.state.class().id();
            self.action_params(&parsed, &target.presenter, &action, &class, args, &mut current)?
        } else {
            let (positional, named) = args.into_parts();
            positional_into(named, positional)
        };

        params.insert(ACTION_KEY.to_string(), Value::String(action.clone()));
        if !signal.is_empty() {
            let id = origin.param_id(&signal);
            current = current && self.state.params().get(SIGNAL_KEY) == Some(&Value::String(id.clone()));
            params.insert(SIGNAL_KEY.to_string(), Value::String(id));
        }
        if mode == LinkMode::Redirect && self.state.has_flash_session(self.services) {
            if let Some(fid) = self.state.params().get(FLASH_KEY) {
                params.insert(FLASH_KEY.to_string(), fid.clone());
            }
        }

        let request = Request::new(target.presenter.clone(), RequestMethod::Forward, params)
            .with_flag_value(Request::FLAG_CURRENT, current);

        if mode == LinkMode::Forward {
            return Ok(ResolvedLink { request, url: None });
        }

        let Some(url) = self
            .services
            .router()
            .construct_url(&request, self.services.http())
        else {
            return Err(DispatchError::InvalidLink(format!(
                "No route for {}:{}({})",
                target.presenter,
                action,
                describe_params(request.params())
            )));
        };

        let url = self.finish_url(url, parsed.scheme.as_deref(), mode);
        tracing::debug!(
            destination,
            presenter = %target.presenter,
            action = %action,
            current,
            url = %url,
            "link resolved"
        );
        Ok(ResolvedLink {
            request,
            url: Some(url + &parsed.fragment),
        })
    }

    fn signal_origin(&self, origin: &ComponentPath, relative: Option<&str>) -> Result<ComponentPath, DispatchError> {
        let Some(relative) = relative.filter(|r| !r.is_empty()) else {
            return Ok(origin.clone());
        };
        let path = if origin.is_root() {
            ComponentPath::from_joined(relative)
        } else {
            ComponentPath::from_joined(format!("{origin}{NAME_SEPARATOR}{relative}"))
        };
        if !self.state.tree().contains(&path) {
            return Err(DispatchError::InvalidLink(format!(
                "Component with name '{relative}' does not exist."
            )));
        }
        Ok(path)
    }

    fn target_class(&self, target: &Target) -> Result<Arc<ResolvedClass>, DispatchError> {
        if !target.named {
            return Ok(Arc::clone(self.state.class()));
        }
        let id = self
            .services
            .loader()
            .presenter_class(&target.presenter)
            .ok_or_else(|| {
                DispatchError::InvalidLink(format!("Cannot load presenter '{}'.", target.presenter))
            })?;
        self.services.classes().resolve(&id).map_err(|e| {
            DispatchError::InvalidLink(format!("Cannot load presenter '{}': {e}", target.presenter))
        })
    }

    fn component(&self, path: &ComponentPath) -> Result<(&'a Arc<ResolvedClass>, &'a Params), DispatchError> {
        if path.is_root() {
            return Ok((self.state.class(), self.state.params()));
        }
        let node = self.state.tree().get(path).ok_or_else(|| {
            DispatchError::InvalidState(format!("component '{path}' is not attached"))
        })?;
        Ok((node.class(), node.params()))
    }

    /// Named, persisted and prefixed arguments of a signal link.
    fn signal_params(
        &self,
        origin: &ComponentPath,
        class: &ResolvedClass,
        values: &Params,
        signal: &str,
        args: Args,
    ) -> Result<Params, DispatchError> {
        let mut params = if !signal.is_empty() && !signal.contains(NAME_SEPARATOR) {
            let method = class.method(&signal_method(signal)).ok_or_else(|| {
                DispatchError::InvalidLink(format!("Unknown signal '{}:{signal}!'.", class.id()))
            })?;
            if args.is_empty() {
                Params::new()
            } else {
                args_to_params(class, method, args, None)?
            }
        } else {
            let (positional, named) = args.into_parts();
            positional_into(named, positional)
        };

        if params.keys().any(|k| class.is_persistent(k)) {
            save_state(class, values, class, &mut params)?;
        }

        if origin.is_root() || params.is_empty() {
            return Ok(params);
        }
        Ok(params
            .into_iter()
            .map(|(key, value)| (origin.param_id(&key), value))
            .collect())
    }

    /// Arguments of a link to a presenter, merged with the global state.
    fn action_params(
        &self,
        parsed: &Destination,
        presenter: &str,
        action: &str,
        class: &ResolvedClass,
        args: Args,
        current: &mut bool,
    ) -> Result<Params, DispatchError> {
        let mut params = if !args.is_empty() || parsed.is_this() {
            let method = class
                .method(&action_method(action))
                .or_else(|| class.method(&render_method(action)));
            match method {
                None if args.has_positional() => {
                    return Err(DispatchError::InvalidLink(format!(
                        "Extra parameter for '{presenter}:{action}'."
                    )));
                }
                None => args.into_parts().1,
                Some(method) => {
                    let supplemental = parsed.is_this().then(|| self.state.params());
                    args_to_params(class, method, args, supplemental)?
                }
            }
        } else {
            Params::new()
        };

        if params.keys().any(|k| class.is_persistent(k)) {
            save_state(self.state.class(), self.state.params(), class, &mut params)?;
        }

        let global = self
            .state
            .global_state((!parsed.is_this()).then_some(class))?;

        if *current && !params.is_empty() {
            for (key, value) in &params {
                let existing = global
                    .get(key)
                    .or_else(|| self.state.params().get(key))
                    .map(param_to_string)
                    .unwrap_or_default();
                if param_to_string(value) != existing {
                    *current = false;
                    break;
                }
            }
        }

        for (key, value) in global {
            params.entry(key).or_insert(value);
        }
        Ok(params)
    }

    fn finish_url(&self, url: String, scheme: Option<&str>, mode: LinkMode) -> String {
        match scheme {
            Some(scheme) if !scheme.is_empty() => match url.split_once("//") {
                Some((_, rest)) => format!("{scheme}//{rest}"),
                None => url,
            },
            Some(_) => url,
            None if mode == LinkMode::Link && !self.services.config().presenter.absolute_urls => {
                let host = self.services.http().host_uri();
                match url.strip_prefix(host) {
                    Some(relative) if !host.is_empty() => relative.to_string(),
                    _ => url,
                }
            }
            None => url,
        }
    }
}

/// Positional arguments that no declared handler consumed keep their index
/// as key.
fn positional_into(mut named: Params, positional: Vec<Value>) -> Params {
    for (index, value) in positional.into_iter().enumerate() {
        named.insert(index.to_string(), value);
    }
    named
}

/// `k=v, …` for error messages: nulls are left out, `false` prints as `0`,
/// arrays as `k[i]=v`.
fn describe_params(params: &Params) -> String {
    let mut parts = Vec::new();
    for (key, value) in params {
        if key == ACTION_KEY {
            continue;
        }
        match value {
            Value::Null => {}
            Value::Bool(false) => parts.push(format!("{key}=0")),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    parts.push(format!("{key}[{i}]={}", param_to_string(item)));
                }
            }
            other => parts.push(format!("{key}={}", param_to_string(other))),
        }
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn describe_params_formats_route_errors() {
        let params: Params = [
            ("id", json!(3)),
            ("action", json!("show")),
            ("q", json!(null)),
            ("all", json!(false)),
            ("tags", json!(["a", "b"])),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        assert_eq!(describe_params(&params), "id=3, all=0, tags[0]=a, tags[1]=b");
    }

    #[test]
    fn unconsumed_positional_args_are_indexed() {
        let named: Params = [("a".to_string(), json!(1))].into_iter().collect();
        let params = positional_into(named, vec![json!("x")]);
        assert_eq!(params["0"], json!("x"));
        assert_eq!(params["a"], json!(1));
    }
}
