//! Loading and saving persistent component state.
//!
//! Component state is a parameter map owned by the tree node. Loading
//! coerces the persistent entries of an incoming bag to the types of their
//! declared defaults. Saving goes the other way: it collects the persistent
//! values a component should contribute to links, replacing values equal to
//! their default with `null` so they are left out of URLs.
//!
//! # Save Rules
//!
//! For every persistent parameter of the target class:
//!
//! | Entry already in the output | Owner descends from `since` | Result |
//! |-----------------------------|-----------------------------|--------|
//! | non-null value | any | injected value is normalized |
//! | `null` | any | skipped, stays `null` |
//! | absent | yes | current value is normalized |
//! | absent | no | skipped |

use crate::{ComponentError, ResolvedClass};
use serde_json::Value;
use trellis_types::{coerce_like, param_to_string, Params};

/// Coerces the persistent entries of `params` for a component of `class`.
///
/// `null` entries are kept as they are. An array sent for a scalar
/// parameter, or a value that cannot be converted, falls back to the
/// declared default.
#[must_use]
pub fn load_state(class: &ResolvedClass, mut params: Params) -> Params {
    for (name, meta) in class.persistent_params() {
        let Some(value) = params.get(name) else {
            continue;
        };
        if value.is_null() || meta.default.is_null() {
            continue;
        }
        let coerced = if value.is_array() && !meta.default.is_array() {
            meta.default.clone()
        } else {
            match coerce_like(value, &meta.default) {
                Some(v) => v,
                None => {
                    tracing::debug!(
                        class = %class.id(),
                        param = name,
                        "persistent value has wrong type, using default"
                    );
                    meta.default.clone()
                }
            }
        };
        params.insert(name.to_string(), coerced);
    }
    params
}

/// Writes the persistent parameters of `for_class` into `out`.
///
/// `own` is the class of the component whose `values` are saved. Keys in
/// `out` are unprefixed parameter names.
///
/// # Errors
///
/// - [`ComponentError::InvalidState`] if a value is an object
/// - [`ComponentError::InvalidParam`] if a value cannot be converted to the
///   type of its default
pub fn save_state(
    own: &ResolvedClass,
    values: &Params,
    for_class: &ResolvedClass,
    out: &mut Params,
) -> Result<(), ComponentError> {
    for (name, meta) in for_class.persistent_params() {
        let value = match out.get(name) {
            Some(Value::Null) => continue,
            Some(injected) => injected.clone(),
            None if own.is_a(&meta.since) => values
                .get(name)
                .cloned()
                .unwrap_or_else(|| meta.default.clone()),
            None => continue,
        };

        if value.is_object() {
            return Err(ComponentError::InvalidState(format!(
                "Persistent parameter must be scalar or array, '{}::${}' is object",
                own.id(),
                name
            )));
        }

        let value = strip_default(value, Some(&meta.default)).map_err(|ty| {
            ComponentError::InvalidParam(format!(
                "persistent parameter '{}::${}' cannot be converted to {ty}",
                own.id(),
                name
            ))
        })?;
        out.insert(name.to_string(), value);
    }
    Ok(())
}

/// Normalizes a value against a declared default.
///
/// With a non-null default the value is coerced to its type and becomes
/// `null` when equal to it. Without one, values whose string form is empty
/// become `null`. On failure the name of the expected type is returned.
pub(crate) fn strip_default(value: Value, default: Option<&Value>) -> Result<Value, &'static str> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match default {
        Some(def) if !def.is_null() => {
            let coerced = coerce_like(&value, def).ok_or_else(|| type_name(def))?;
            Ok(if &coerced == def { Value::Null } else { coerced })
        }
        _ => Ok(if param_to_string(&value).is_empty() {
            Value::Null
        } else {
            value
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
