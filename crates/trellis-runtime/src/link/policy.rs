//! What a link that cannot be resolved turns into.
//!
//! | Mode | Result |
//! |------|--------|
//! | `silent` | `#` |
//! | `warning` | `error: <escaped message>`, logged at warn |
//! | `exception` | the error is returned |
//!
//! Only links rendered into output go through the policy. Redirects and
//! forwards always fail with the error.

use crate::config::InvalidLinkMode;
use crate::DispatchError;

/// Applies `mode` to a link resolution result.
///
/// Errors other than [`DispatchError::InvalidLink`] pass through unchanged.
///
/// # Errors
///
/// The original error in exception mode, or when it is not an invalid-link
/// error.
pub fn handle_invalid_link(
    mode: InvalidLinkMode,
    result: Result<String, DispatchError>,
) -> Result<String, DispatchError> {
    match result {
        Err(DispatchError::InvalidLink(message)) => match mode {
            InvalidLinkMode::Silent => Ok("#".to_string()),
            InvalidLinkMode::Warning => {
                tracing::warn!(error = %message, "invalid link");
                Ok(format!("error: {}", escape_html(&message)))
            }
            InvalidLinkMode::Exception => Err(DispatchError::InvalidLink(message)),
        },
        other => other,
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid() -> Result<String, DispatchError> {
        Err(DispatchError::InvalidLink("No route for <Shop:Cart>".into()))
    }

    #[test]
    fn silent_returns_hash() {
        assert_eq!(
            handle_invalid_link(InvalidLinkMode::Silent, invalid()).expect("link"),
            "#"
        );
    }

    #[test]
    fn warning_returns_escaped_message() {
        assert_eq!(
            handle_invalid_link(InvalidLinkMode::Warning, invalid()).expect("link"),
            "error: No route for &lt;Shop:Cart&gt;"
        );
    }

    #[test]
    fn exception_reraises() {
        let err = handle_invalid_link(InvalidLinkMode::Exception, invalid()).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidLink(_)));
    }

    #[test]
    fn other_results_pass_through() {
        assert_eq!(
            handle_invalid_link(InvalidLinkMode::Silent, Ok("/shop".into())).expect("link"),
            "/shop"
        );
        let err = handle_invalid_link(
            InvalidLinkMode::Silent,
            Err(DispatchError::InvalidState("x".into())),
        )
        .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidState(_)));
    }
}
