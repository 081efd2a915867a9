//! Handler argument binding.
//!
//! Two directions:
//!
//! - [`bind_params`]: request parameters → handler arguments, used when a
//!   handler is invoked.
//! - [`args_to_params`]: link arguments → request parameters, used when a
//!   link to a handler is built. Positional arguments take the names of the
//!   handler's declared arguments, in order.

use crate::persistent::strip_default;
use crate::{ComponentError, MethodDecl, ResolvedClass};
use trellis_event::Args;
use trellis_types::{coerce_like, Params};

/// Binds `params` to the declared arguments of `method`.
///
/// Present values are coerced to the type of the argument's default.
/// Absent (or `null`) values take the default.
///
/// # Errors
///
/// Returns [`ComponentError::InvalidParam`] if a required argument is
/// missing or a value cannot be converted.
pub fn bind_params(
    class: &ResolvedClass,
    method: &MethodDecl,
    params: &Params,
) -> Result<Params, ComponentError> {
    let mut bound = Params::new();
    for arg in method.args() {
        let value = match (params.get(&arg.name).filter(|v| !v.is_null()), &arg.default) {
            (Some(value), Some(default)) if !default.is_null() => {
                coerce_like(value, default).ok_or_else(|| {
                    ComponentError::InvalidParam(format!(
                        "Invalid value for parameter '{}' of {}::{}()",
                        arg.name,
                        class.id(),
                        method.name()
                    ))
                })?
            }
            (Some(value), _) => value.clone(),
            (None, Some(default)) => default.clone(),
            (None, None) => {
                return Err(ComponentError::InvalidParam(format!(
                    "Missing parameter '{}' required by {}::{}()",
                    arg.name,
                    class.id(),
                    method.name()
                )));
            }
        };
        bound.insert(arg.name.clone(), value);
    }
    Ok(bound)
}

/// Converts link arguments for `method` into named parameters.
///
/// Each declared argument takes, in order of preference, the next
/// positional argument, the named argument of the same name, or the entry
/// of `supplemental`. Values are normalized against the declared default, so
/// a value equal to its default becomes `null`.
///
/// # Errors
///
/// - [`ComponentError::InvalidLink`] if positional arguments are left over
/// - [`ComponentError::InvalidParam`] if a value cannot be converted
pub fn args_to_params(
    class: &ResolvedClass,
    method: &MethodDecl,
    args: Args,
    supplemental: Option<&Params>,
) -> Result<Params, ComponentError> {
    let (positional, mut named) = args.into_parts();
    let mut positional = positional.into_iter().peekable();

    for arg in method.args() {
        let value = if let Some(value) = positional.next() {
            value
        } else if let Some(value) = named.get(&arg.name) {
            value.clone()
        } else if let Some(value) = supplemental.and_then(|s| s.get(&arg.name)) {
            value.clone()
        } else {
            continue;
        };

        let value = strip_default(value, arg.default.as_ref()).map_err(|ty| {
            ComponentError::InvalidParam(format!(
                "argument '{}' of {}::{}() must be {ty}",
                arg.name,
                class.id(),
                method.name()
            ))
        })?;
        named.insert(arg.name.clone(), value);
    }

    if positional.peek().is_some() {
        return Err(ComponentError::InvalidLink(format!(
            "Extra parameter for '{}:{}'.",
            class.id(),
            method.name()
        )));
    }
    Ok(named)
}
