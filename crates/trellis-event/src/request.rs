//! Presenter requests.
//!
//! A [`Request`] names the presenter that should handle it and carries the
//! parameters it is dispatched with. It is an immutable value: the router
//! produces one per HTTP request, and the link resolver produces one for
//! every link, redirect and forward. Only the dispatch engine edits a request
//! in place, through [`Request::modify`].
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use trellis_event::{Request, RequestMethod};
//! use trellis_types::Params;
//!
//! let mut params = Params::new();
//! params.insert("action".into(), json!("show"));
//! params.insert("id".into(), json!(42));
//!
//! let request = Request::new("Shop:Products", RequestMethod::Get, params)
//!     .with_flag(Request::FLAG_SECURED);
//!
//! assert_eq!(request.presenter_name(), "Shop:Products");
//! assert!(request.is_method("get"));
//! assert!(request.has_flag(Request::FLAG_SECURED));
//! assert_eq!(request.param("id"), Some(&json!(42)));
//! ```

use crate::EventError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use trellis_types::Params;

/// Method token of a request.
///
/// HTTP methods come from the transport; [`Forward`](Self::Forward) marks a
/// request created internally by the link resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    /// Internal request produced by link resolution.
    Forward,
}

impl RequestMethod {
    /// Returns the upper-case method token.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Forward => "FORWARD",
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestMethod {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            "FORWARD" => Ok(Self::Forward),
            _ => Err(EventError::UnknownMethod(s.to_string())),
        }
    }
}

/// Part of a request that [`Request::modify`] writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPart {
    Params,
    Post,
    Files,
}

/// Immutable presenter request.
///
/// # Fields
///
/// | Field | Meaning |
/// |-------|---------|
/// | `name` | Module-qualified presenter name (`"Admin:Shop:Products"`) |
/// | `method` | [`RequestMethod`] token |
/// | `params` | Parameters, usually from the URL |
/// | `post` | POST body parameters |
/// | `files` | Uploaded file descriptors |
/// | `flags` | Named boolean flags (`"secured"`, `"current"`, …) |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    name: String,
    method: RequestMethod,
    params: Params,
    #[serde(default)]
    post: Params,
    #[serde(default)]
    files: Params,
    #[serde(default)]
    flags: BTreeMap<String, bool>,
}

impl Request {
    /// The request arrived over a secured connection.
    pub const FLAG_SECURED: &'static str = "secured";

    /// The request was restored from a stored backlink.
    pub const FLAG_RESTORED: &'static str = "restored";

    /// A link-created request that targets the page being rendered.
    pub const FLAG_CURRENT: &'static str = "current";

    /// Creates a request with empty POST, files and flags.
    #[must_use]
    pub fn new(name: impl Into<String>, method: RequestMethod, params: Params) -> Self {
        Self {
            name: name.into(),
            method,
            params,
            post: Params::new(),
            files: Params::new(),
            flags: BTreeMap::new(),
        }
    }

    /// Creates a request, rejecting an empty presenter name.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidRequest`] if `name` is empty.
    pub fn try_new(
        name: impl Into<String>,
        method: RequestMethod,
        params: Params,
    ) -> Result<Self, EventError> {
        let name = name.into();
        if name.is_empty() {
            return Err(EventError::InvalidRequest(
                "presenter name cannot be empty".into(),
            ));
        }
        Ok(Self::new(name, method, params))
    }

    /// Sets the POST parameters.
    #[must_use]
    pub fn with_post(mut self, post: Params) -> Self {
        self.post = post;
        self
    }

    /// Sets the uploaded files.
    #[must_use]
    pub fn with_files(mut self, files: Params) -> Self {
        self.files = files;
        self
    }

    /// Raises a flag.
    #[must_use]
    pub fn with_flag(self, flag: &str) -> Self {
        self.with_flag_value(flag, true)
    }

    /// Sets a flag to an explicit value.
    #[must_use]
    pub fn with_flag_value(mut self, flag: &str, value: bool) -> Self {
        self.flags.insert(flag.to_string(), value);
        self
    }

    /// Module-qualified presenter name.
    #[must_use]
    pub fn presenter_name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn method(&self) -> RequestMethod {
        self.method
    }

    /// Case-insensitive method check (`is_method("post")`).
    #[must_use]
    pub fn is_method(&self, method: &str) -> bool {
        self.method.as_str().eq_ignore_ascii_case(method)
    }

    #[must_use]
    pub fn is_post(&self) -> bool {
        self.method == RequestMethod::Post
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    #[must_use]
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    #[must_use]
    pub fn post(&self) -> &Params {
        &self.post
    }

    #[must_use]
    pub fn files(&self) -> &Params {
        &self.files
    }

    /// Returns `true` if the flag is present and raised.
    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.get(flag).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn flags(&self) -> &BTreeMap<String, bool> {
        &self.flags
    }

    /// Consumes the request and returns its parameters.
    #[must_use]
    pub fn into_params(self) -> Params {
        self.params
    }

    /// Writes a single entry of the request in place.
    ///
    /// Reserved for the dispatch engine. Application code treats requests as
    /// immutable values.
    pub fn modify(&mut self, part: RequestPart, key: &str, value: Value) {
        let target = match part {
            RequestPart::Params => &mut self.params,
            RequestPart::Post => &mut self.post,
            RequestPart::Files => &mut self.files,
        };
        target.insert(key.to_string(), value);
    }
}
