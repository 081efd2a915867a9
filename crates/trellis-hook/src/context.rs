//! What a hook sees when it fires.

use crate::HookPoint;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use trellis_types::ComponentPath;

/// Context handed along a hook chain.
///
/// Pre-hooks may rewrite `payload` before the operation reads it back;
/// post-hooks see the operation's result there. The payload shape per point
/// is listed on [`HookPoint`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookContext {
    pub hook_point: HookPoint,

    /// Presenter handling the request (e.g. `Shop:Products`).
    pub presenter: String,

    /// Component concerned; the root path stands for the presenter itself.
    pub component: Option<ComponentPath>,

    pub payload: Value,
}

impl HookContext {
    #[must_use]
    pub fn new(hook_point: HookPoint, presenter: impl Into<String>, payload: Value) -> Self {
        Self {
            hook_point,
            presenter: presenter.into(),
            component: None,
            payload,
        }
    }

    #[must_use]
    pub fn with_component(mut self, component: ComponentPath) -> Self {
        self.component = Some(component);
        self
    }

    /// Payload field `key`, if the payload is an object holding it.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn signal_ctx() -> HookContext {
        HookContext::new(
            HookPoint::SignalPreDispatch,
            "Shop:Products",
            json!({"receiver": "grid", "signal": "sort"}),
        )
    }

    #[test]
    fn fresh_context_targets_the_presenter() {
        let ctx = signal_ctx();
        assert!(ctx.component.is_none());
        assert_eq!(ctx.field("signal"), Some(&json!("sort")));
        assert_eq!(ctx.field("outcome"), None);
    }

    #[test]
    fn survives_serialization() {
        let ctx = signal_ctx().with_component(ComponentPath::from_joined("grid"));
        let text = serde_json::to_string(&ctx).expect("serialize");
        let back: HookContext = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(back, ctx);
    }
}
