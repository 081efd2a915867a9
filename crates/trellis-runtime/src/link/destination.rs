//! Link destination syntax.
//!
//! ```text
//! [scheme//] [:] [Module:]Presenter:action [?query] [#fragment]
//! [scheme//] action | this                 [?query] [#fragment]
//! [scheme//] [child:]signal!               [?query] [#fragment]
//! ```
//!
//! | Destination | Meaning |
//! |-------------|---------|
//! | `show` | action of the current presenter |
//! | `this` | current action |
//! | `Products:show` | presenter relative to the current module |
//! | `:Admin:Dashboard:default` | absolute presenter name |
//! | `sort!` | signal of the origin component |
//! | `pager:next!` | signal of a child of the origin |
//! | `//show` | absolute URL |
//! | `show?id=3#top` | inline arguments and fragment |
//!
//! From a component that is not the presenter every destination is a
//! signal, with or without the trailing `!`.

use crate::DispatchError;
use serde_json::Value;
use trellis_types::{Params, NAME_SEPARATOR};
use url::form_urlencoded;

/// A parsed link destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Presenter/action part (`this` for signals).
    pub target: String,
    /// Signal name, when the destination is a signal.
    pub signal: Option<String>,
    /// Path of the signal's receiver relative to the origin (`pager`,
    /// `grid-pager`), from the `child:signal!` form.
    pub signal_receiver: Option<String>,
    /// Arguments given inline after `?`; they replace the link arguments.
    pub query: Option<Params>,
    /// Text before `//`; `Some("")` for a bare `//`.
    pub scheme: Option<String>,
    /// Fragment including the leading `#`, or empty.
    pub fragment: String,
}

impl Destination {
    /// Parses `destination` for a link created by a component.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidLink`] if the signal or destination name is
    /// empty.
    pub fn parse(destination: &str, from_presenter: bool) -> Result<Self, DispatchError> {
        let (rest, fragment) = match destination.find('#') {
            Some(pos) => (&destination[..pos], destination[pos..].to_string()),
            None => (destination, String::new()),
        };

        let (rest, query) = match rest.find('?') {
            Some(pos) => (&rest[..pos], Some(parse_query(&rest[pos + 1..]))),
            None => (rest, None),
        };

        let (rest, scheme) = match rest.find("//") {
            Some(pos) => (&rest[pos + 2..], Some(rest[..pos].to_string())),
            None => (rest, None),
        };

        let mut target = rest.to_string();
        let mut signal = None;
        let mut signal_receiver = None;

        if !from_presenter || rest.ends_with('!') {
            let name = rest.trim_end_matches('!');
            let name = match name.rfind(':') {
                Some(pos) => {
                    signal_receiver = Some(name[..pos].replace(':', &NAME_SEPARATOR.to_string()));
                    &name[pos + 1..]
                }
                None => name,
            };
            if name.is_empty() {
                return Err(DispatchError::InvalidLink("Signal must be non-empty string.".into()));
            }
            signal = Some(name.to_string());
            target = "this".to_string();
        }

        if target.is_empty() {
            return Err(DispatchError::InvalidLink(
                "Destination must be non-empty string.".into(),
            ));
        }

        Ok(Self {
            target,
            signal,
            signal_receiver,
            query,
            scheme,
            fragment,
        })
    }

    /// Returns `true` for the `this` destination.
    #[must_use]
    pub fn is_this(&self) -> bool {
        self.target == "this"
    }
}

/// Presenter and action a link points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Module-qualified presenter name.
    pub presenter: String,
    /// Action; empty means the default action.
    pub action: String,
    /// `false` when the link stays on the current presenter without naming
    /// it, so no presenter lookup is needed.
    pub named: bool,
}

impl Target {
    /// Splits `target` into presenter and action.
    ///
    /// Relative presenter names are resolved against the module of
    /// `current_presenter`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidLink`] for an absolute name without a
    /// presenter (`::show`).
    pub fn split(target: &str, current_presenter: &str, current_action: &str) -> Result<Self, DispatchError> {
        let Some(pos) = target.rfind(':') else {
            return Ok(Self {
                presenter: current_presenter.to_string(),
                action: if target == "this" {
                    current_action.to_string()
                } else {
                    target.to_string()
                },
                named: false,
            });
        };

        let action = target[pos + 1..].to_string();
        let presenter = if target.starts_with(':') {
            if pos < 2 {
                return Err(DispatchError::InvalidLink(format!(
                    "Missing presenter name in '{target}'."
                )));
            }
            target[1..pos].to_string()
        } else {
            match current_presenter.rfind(':') {
                Some(module) => format!("{}{}", &current_presenter[..=module], &target[..pos]),
                None => target[..pos].to_string(),
            }
        };

        Ok(Self {
            presenter,
            action,
            named: true,
        })
    }
}

/// Parses a URL query string into parameters.
///
/// `+` decodes to a space and `%XX` to its byte. Keys ending in `[]`
/// collect their values into an array.
#[must_use]
pub fn parse_query(query: &str) -> Params {
    let mut params = Params::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let value = Value::String(value.into_owned());
        if let Some(list) = key.strip_suffix("[]") {
            let entry = params
                .entry(list.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            match entry {
                Value::Array(items) => items.push(value),
                other => *other = Value::Array(vec![value]),
            }
        } else if !key.is_empty() {
            params.insert(key.into_owned(), value);
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_action() {
        let d = Destination::parse("show", true).expect("parse");
        assert_eq!(d.target, "show");
        assert_eq!(d.signal, None);
        assert_eq!(d.scheme, None);
        assert_eq!(d.fragment, "");
    }

    #[test]
    fn fragment_query_and_scheme() {
        let d = Destination::parse("https://Shop:Products:show?id=3&q=a+b%21#top", true).expect("parse");
        assert_eq!(d.target, "Shop:Products:show");
        assert_eq!(d.scheme.as_deref(), Some("https:"));
        assert_eq!(d.fragment, "#top");
        let query = d.query.expect("query");
        assert_eq!(query["id"], json!("3"));
        assert_eq!(query["q"], json!("a b!"));

        let d = Destination::parse("//show", true).expect("parse");
        assert_eq!(d.scheme.as_deref(), Some(""));
        assert_eq!(d.target, "show");
    }

    #[test]
    fn signals() {
        let d = Destination::parse("logout!", true).expect("parse");
        assert_eq!(d.signal.as_deref(), Some("logout"));
        assert!(d.is_this());

        let d = Destination::parse("sort", false).expect("parse");
        assert_eq!(d.signal.as_deref(), Some("sort"));

        let d = Destination::parse("grid:pager:next!", true).expect("parse");
        assert_eq!(d.signal.as_deref(), Some("next"));
        assert_eq!(d.signal_receiver.as_deref(), Some("grid-pager"));
    }

    #[test]
    fn empty_names_are_invalid() {
        let err = Destination::parse("!", true).unwrap_err();
        assert_eq!(err.to_string(), "Signal must be non-empty string.");

        let err = Destination::parse("#top", true).unwrap_err();
        assert_eq!(err.to_string(), "Destination must be non-empty string.");
    }

    #[test]
    fn split_targets() {
        let t = Target::split("this", "Shop:Products", "show").expect("split");
        assert_eq!(t.presenter, "Shop:Products");
        assert_eq!(t.action, "show");
        assert!(!t.named);

        let t = Target::split("Cart:default", "Shop:Products", "show").expect("split");
        assert_eq!(t.presenter, "Shop:Cart");
        assert_eq!(t.action, "default");
        assert!(t.named);

        let t = Target::split(":Admin:Dashboard:", "Shop:Products", "show").expect("split");
        assert_eq!(t.presenter, "Admin:Dashboard");
        assert_eq!(t.action, "");

        let t = Target::split("Cart:view", "Homepage", "default").expect("split");
        assert_eq!(t.presenter, "Cart");

        let err = Target::split(":show", "Shop:Products", "show").unwrap_err();
        assert_eq!(err.to_string(), "Missing presenter name in ':show'.");
    }

    #[test]
    fn query_decoding() {
        let params = parse_query("a=1&tags[]=x&tags[]=y&flag&bad=%zz&=skip");
        assert_eq!(params["a"], json!("1"));
        assert_eq!(params["tags"], json!(["x", "y"]));
        assert_eq!(params["flag"], json!(""));
        assert_eq!(params["bad"], json!("%zz"));
        assert_eq!(params.len(), 4);

        let params = parse_query("q=%7Euser&sp=a%20b");
        assert_eq!(params["q"], json!("~user"));
        assert_eq!(params["sp"], json!("a b"));
    }
}
