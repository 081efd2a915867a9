//! Link arguments.
//!
//! Links accept arguments either by position (bound to a handler's declared
//! parameters in order) or by name. [`Args`] keeps both kinds until the link
//! resolver binds them.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use trellis_event::Args;
//!
//! let args = Args::new().arg(json!(42)).named("lang", json!("en"));
//!
//! assert_eq!(args.positional(), &[json!(42)]);
//! assert_eq!(args.named_params().get("lang"), Some(&json!("en")));
//! assert!(!args.is_empty());
//! ```

use serde_json::Value;
use trellis_types::Params;

/// Positional and named link arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    named: Params,
}

impl Args {
    /// Creates an empty argument bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn arg(mut self, value: Value) -> Self {
        self.positional.push(value);
        self
    }

    /// Adds (or replaces) a named argument.
    #[must_use]
    pub fn named(mut self, key: impl Into<String>, value: Value) -> Self {
        self.named.insert(key.into(), value);
        self
    }

    /// Builds an argument bag of named arguments only.
    #[must_use]
    pub fn from_params(named: Params) -> Self {
        Self {
            positional: Vec::new(),
            named,
        }
    }

    #[must_use]
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    #[must_use]
    pub fn named_params(&self) -> &Params {
        &self.named
    }

    /// Returns `true` when there are no arguments of either kind.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    #[must_use]
    pub fn has_positional(&self) -> bool {
        !self.positional.is_empty()
    }

    /// Splits the bag into its positional and named parts.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Value>, Params) {
        (self.positional, self.named)
    }
}

impl From<Params> for Args {
    fn from(named: Params) -> Self {
        Self::from_params(named)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_by_default() {
        let args = Args::new();
        assert!(args.is_empty());
        assert!(!args.has_positional());
    }

    #[test]
    fn named_replaces_same_key() {
        let args = Args::new().named("id", json!(1)).named("id", json!(2));
        assert_eq!(args.named_params().len(), 1);
        assert_eq!(args.named_params()["id"], json!(2));
    }

    #[test]
    fn into_parts_preserves_order() {
        let (positional, named) = Args::new()
            .arg(json!("a"))
            .arg(json!("b"))
            .named("x", json!(1))
            .into_parts();
        assert_eq!(positional, vec![json!("a"), json!("b")]);
        assert_eq!(named.len(), 1);
    }
}
