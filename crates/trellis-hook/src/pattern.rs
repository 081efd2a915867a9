//! Presenter pattern matching.
//!
//! Hooks select the presenters (and optionally components) they apply to:
//!
//! ```text
//! PATTERN := <presenter> [ "#" <component> ]
//! presenter := segment { ":" segment }
//! segment := name | "*"
//! ```
//!
//! A lone `*` matches every presenter, however deeply nested in modules.
//! Otherwise the number of segments must match, each `*` standing for one
//! module or presenter name. A leading `:` is ignored.

use crate::HookError;
use serde::{Deserialize, Serialize};
use std::fmt;
use trellis_types::ComponentPath;

/// A single segment in a presenter pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternSegment {
    /// Matches exactly the given string.
    Exact(String),
    /// Matches any string.
    Wildcard,
}

impl PatternSegment {
    /// Returns `true` if this segment matches the given value.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Exact(s) => s == value,
            Self::Wildcard => true,
        }
    }
}

impl fmt::Display for PatternSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(s) => f.write_str(s),
            Self::Wildcard => f.write_str("*"),
        }
    }
}

/// A parsed presenter pattern.
///
/// # Examples
///
/// ```text
/// "*"                   → any presenter
/// "Shop:Products"       → exactly Shop:Products
/// "Shop:*"              → every presenter directly in module Shop
/// "*:Sign"              → Sign in any top-level module
/// "Front:Homepage#menu" → component "menu" of Front:Homepage
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenterPattern {
    /// Module and presenter segments.
    pub segments: Vec<PatternSegment>,
    /// Optional component path.
    pub component: Option<PatternSegment>,
}

impl PresenterPattern {
    /// Pattern matching every presenter.
    #[must_use]
    pub fn any() -> Self {
        Self {
            segments: vec![PatternSegment::Wildcard],
            component: None,
        }
    }

    /// Parses a presenter pattern string.
    ///
    /// # Errors
    ///
    /// Returns `HookError::InvalidPattern` if the string cannot be parsed.
    pub fn parse(pattern: &str) -> Result<Self, HookError> {
        if pattern.is_empty() {
            return Err(HookError::InvalidPattern("empty pattern".into()));
        }

        let (presenter, component) = match pattern.split_once('#') {
            Some((_, "")) => {
                return Err(HookError::InvalidPattern(format!(
                    "empty component in '{pattern}'"
                )))
            }
            Some((presenter, component)) => (presenter, Some(parse_segment(component))),
            None => (pattern, None),
        };

        let presenter = presenter.strip_prefix(':').unwrap_or(presenter);
        if presenter.is_empty() {
            return Err(HookError::InvalidPattern(format!(
                "missing presenter in '{pattern}'"
            )));
        }

        let segments = presenter
            .split(':')
            .map(|s| {
                if s.is_empty() {
                    Err(HookError::InvalidPattern(format!(
                        "empty segment in '{pattern}'"
                    )))
                } else {
                    Ok(parse_segment(s))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            segments,
            component,
        })
    }

    /// Returns `true` if this pattern matches the presenter and optional
    /// component.
    #[must_use]
    pub fn matches(&self, presenter: &str, component: Option<&ComponentPath>) -> bool {
        let presenter = presenter.strip_prefix(':').unwrap_or(presenter);
        let presenter_ok = match self.segments.as_slice() {
            [PatternSegment::Wildcard] => true,
            segments => {
                let names: Vec<&str> = presenter.split(':').collect();
                names.len() == segments.len()
                    && segments.iter().zip(&names).all(|(s, n)| s.matches(n))
            }
        };
        if !presenter_ok {
            return false;
        }

        match (&self.component, component) {
            (Some(pattern), Some(path)) => pattern.matches(path.as_str()),
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

impl Default for PresenterPattern {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Display for PresenterPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{segment}")?;
        }
        if let Some(ref component) = self.component {
            write!(f, "#{component}")?;
        }
        Ok(())
    }
}

/// Parses a single pattern segment: `"*"` → Wildcard, anything else → Exact.
fn parse_segment(s: &str) -> PatternSegment {
    if s == "*" {
        PatternSegment::Wildcard
    } else {
        PatternSegment::Exact(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> ComponentPath {
        ComponentPath::from_joined(s)
    }

    #[test]
    fn lone_wildcard_matches_any_depth() {
        let p = PresenterPattern::parse("*").expect("parse");
        assert!(p.matches("Homepage", None));
        assert!(p.matches("Admin:Shop:Products", None));
        assert!(p.matches("Homepage", Some(&path("menu"))));
    }

    #[test]
    fn exact_presenter() {
        let p = PresenterPattern::parse("Shop:Products").expect("parse");
        assert!(p.matches("Shop:Products", None));
        assert!(p.matches(":Shop:Products", None));
        assert!(!p.matches("Shop:Basket", None));
        assert!(!p.matches("Products", None));
    }

    #[test]
    fn module_wildcard_counts_segments() {
        let p = PresenterPattern::parse("Shop:*").expect("parse");
        assert!(p.matches("Shop:Basket", None));
        assert!(!p.matches("Shop:Admin:Basket", None));
        assert!(!p.matches("Front:Basket", None));
    }

    #[test]
    fn component_qualifier() {
        let p = PresenterPattern::parse("Front:Homepage#menu").expect("parse");
        assert!(p.matches("Front:Homepage", Some(&path("menu"))));
        assert!(!p.matches("Front:Homepage", Some(&path("menu-item"))));
        assert!(!p.matches("Front:Homepage", None));

        let any = PresenterPattern::parse("*#*").expect("parse");
        assert!(any.matches("Sign", Some(&ComponentPath::root())));
    }

    #[test]
    fn parse_errors() {
        for bad in ["", ":", "Shop::Products", "Shop#", "#menu"] {
            assert!(
                matches!(PresenterPattern::parse(bad), Err(HookError::InvalidPattern(_))),
                "'{bad}' should not parse"
            );
        }
    }

    #[test]
    fn display_roundtrip() {
        for s in ["*", "Shop:*", "Front:Homepage#menu"] {
            let p = PresenterPattern::parse(s).expect("parse");
            assert_eq!(p.to_string(), s);
        }
    }
}
