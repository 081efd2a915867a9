//! Parameter maps and scalar conversions.
//!
//! Request parameters are scalars or arrays carried as [`serde_json::Value`].
//! Maps keep insertion order: the persistent-state filter groups entries by
//! contiguous runs, so order is observable.

use serde_json::Value;

/// Ordered parameter map (`key → scalar | array`).
pub type Params = serde_json::Map<String, Value>;

/// Reserved parameter carrying the action name.
pub const ACTION_KEY: &str = "action";

/// Reserved parameter carrying the signal (`receiver-signal`).
pub const SIGNAL_KEY: &str = "do";

/// Reserved parameter carrying the flash session id.
pub const FLASH_KEY: &str = "_fid";

/// Converts a parameter to the string form used for equality checks.
///
/// `null` and `false` become `""`, `true` becomes `"1"`, numbers use their
/// decimal form and arrays/objects become `"Array"`.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use trellis_types::param_to_string;
///
/// assert_eq!(param_to_string(&json!(42)), "42");
/// assert_eq!(param_to_string(&json!(true)), "1");
/// assert_eq!(param_to_string(&json!(null)), "");
/// assert_eq!(param_to_string(&json!("en")), "en");
/// ```
#[must_use]
pub fn param_to_string(value: &Value) -> String {
    match value {
        Value::Null | Value::Bool(false) => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => "Array".to_string(),
    }
}

/// Returns `true` for values allowed as a single URL parameter.
#[must_use]
pub fn is_scalar(value: &Value) -> bool {
    matches!(
        value,
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
    )
}

/// Converts `value` to the JSON type of `template`.
///
/// Returns `None` when the conversion is not meaningful (e.g. `"abc"` to an
/// integer). A `null` template accepts any scalar unchanged.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use trellis_types::coerce_like;
///
/// assert_eq!(coerce_like(&json!("7"), &json!(1)), Some(json!(7)));
/// assert_eq!(coerce_like(&json!("1"), &json!(false)), Some(json!(true)));
/// assert_eq!(coerce_like(&json!(3), &json!("")), Some(json!("3")));
/// assert_eq!(coerce_like(&json!("x"), &json!(0)), None);
/// ```
#[must_use]
pub fn coerce_like(value: &Value, template: &Value) -> Option<Value> {
    match template {
        Value::Null => is_scalar(value).then(|| value.clone()),
        Value::Bool(_) => to_bool(value).map(Value::Bool),
        Value::Number(n) if n.is_f64() => to_f64(value)
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        Value::Number(_) => to_i64(value).map(Value::from),
        Value::String(_) => is_scalar(value).then(|| Value::String(param_to_string(value))),
        Value::Array(_) => match value {
            Value::Array(_) => Some(value.clone()),
            _ => None,
        },
        Value::Object(_) => match value {
            Value::Object(_) => Some(value.clone()),
            _ => None,
        },
    }
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Null => Some(false),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.as_str() {
            "" | "0" | "false" => Some(false),
            "1" | "true" => Some(true),
            _ => None,
        },
        _ => None,
    }
}

fn to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Returns `true` if `name` is a valid component name (`[A-Za-z0-9_]+`).
#[must_use]
pub fn is_valid_component_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Returns `true` if `name` is a valid action name.
///
/// The first character must be an ASCII letter or digit; the rest may also
/// contain `_` and any non-ASCII character.
#[must_use]
pub fn is_valid_action_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c as u32 >= 0x7f)
        }
        _ => false,
    }
}

/// Capitalizes the first character of a handler suffix.
///
/// Handler names are matched case-insensitively, so this only affects how
/// they read in logs and error messages.
#[must_use]
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_rejects_arrays_for_scalars() {
        assert_eq!(coerce_like(&json!([1, 2]), &json!(0)), None);
        assert_eq!(coerce_like(&json!([1, 2]), &json!("")), None);
        assert_eq!(coerce_like(&json!([1]), &json!([])), Some(json!([1])));
    }

    #[test]
    fn coerce_float_template() {
        assert_eq!(coerce_like(&json!("1.5"), &json!(0.5)), Some(json!(1.5)));
    }

    #[test]
    fn coerce_integral_float_to_int() {
        assert_eq!(coerce_like(&json!(4.0), &json!(1)), Some(json!(4)));
        assert_eq!(coerce_like(&json!(4.5), &json!(1)), None);
    }

    #[test]
    fn component_names() {
        assert!(is_valid_component_name("menu_1"));
        assert!(!is_valid_component_name(""));
        assert!(!is_valid_component_name("menu-item"));
        assert!(!is_valid_component_name("menu item"));
    }

    #[test]
    fn action_names() {
        assert!(is_valid_action_name("default"));
        assert!(is_valid_action_name("show_2"));
        assert!(is_valid_action_name("8ball"));
        assert!(is_valid_action_name("přehled"));
        assert!(!is_valid_action_name(""));
        assert!(!is_valid_action_name("_hidden"));
        assert!(!is_valid_action_name("show-all"));
        assert!(!is_valid_action_name("../etc"));
    }

    #[test]
    fn array_string_form() {
        assert_eq!(param_to_string(&json!([1])), "Array");
        assert_eq!(param_to_string(&json!(false)), "");
    }

    #[test]
    fn capitalize_suffix() {
        assert_eq!(capitalize("show"), "Show");
        assert_eq!(capitalize(""), "");
    }
}
