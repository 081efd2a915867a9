//! Hook registration and chain dispatch.
//!
//! ```text
//! chain(point, presenter, component)
//!   slots[point]                        priority ascending, FIFO on ties
//!     minus disabled hooks and pattern misses
//!
//! run_chain(point, chain, ctx)
//!   for hook in chain
//!     verdict = hook.execute(ctx)
//!       Continue(ctx')  → ctx = ctx'
//!       Skip / Abort    → returned at pre points, logged elsewhere
//!       Abort           → returned at guard points
//!       Replace(v)      → ctx.payload = v at post points, logged elsewhere
//!   Continue(ctx)
//! ```

use crate::{Hook, HookAction, HookContext, HookError, HookKind, HookPoint};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, warn};
use trellis_types::ComponentPath;

/// One registry per host, shared with every presenter it runs.
pub type SharedHookRegistry = Arc<RwLock<HookRegistry>>;

struct Slot {
    hook: Arc<dyn Hook>,
    enabled: bool,
}

/// Hooks grouped by [`HookPoint`], each group kept in priority order.
#[derive(Default)]
pub struct HookRegistry {
    slots: HashMap<HookPoint, Vec<Slot>>,
}

impl HookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared(self) -> SharedHookRegistry {
        Arc::new(RwLock::new(self))
    }

    /// Adds `hook` behind every hook of equal or lower priority at its
    /// point and returns its id.
    pub fn register(&mut self, hook: Box<dyn Hook>) -> String {
        let id = hook.id().to_string();
        let point = hook.hook_point();
        let priority = hook.priority();

        let slots = self.slots.entry(point).or_default();
        let at = slots.partition_point(|s| s.hook.priority() <= priority);
        slots.insert(
            at,
            Slot {
                hook: Arc::from(hook),
                enabled: true,
            },
        );

        debug!(hook_id = %id, point = %point, priority, "hook registered");
        id
    }

    /// Registers a shutdown listener.
    ///
    /// Listeners fire at [`HookPoint::PresenterOnShutdown`], before the
    /// presenter's own shutdown handler. A hook bound to another point is
    /// registered there anyway.
    pub fn on_shutdown(&mut self, hook: Box<dyn Hook>) -> String {
        if hook.hook_point() != HookPoint::PresenterOnShutdown {
            warn!(
                hook_id = hook.id(),
                point = %hook.hook_point(),
                "shutdown listener bound to another hook point"
            );
        }
        self.register(hook)
    }

    /// Removes every hook with `id`. Returns `false` if there was none.
    pub fn unregister(&mut self, id: &str) -> bool {
        let before = self.len();
        for slots in self.slots.values_mut() {
            slots.retain(|s| s.hook.id() != id);
        }
        self.len() < before
    }

    /// Turns the hook with `id` on or off without losing its position.
    ///
    /// # Errors
    ///
    /// [`HookError::NotFound`] when no hook carries `id`.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<(), HookError> {
        let slot = self
            .slots
            .values_mut()
            .flat_map(|slots| slots.iter_mut())
            .find(|s| s.hook.id() == id)
            .ok_or_else(|| HookError::NotFound(id.to_string()))?;
        slot.enabled = enabled;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` if an enabled hook listens at `point`.
    #[must_use]
    pub fn has_hooks(&self, point: HookPoint) -> bool {
        self.slots
            .get(&point)
            .is_some_and(|slots| slots.iter().any(|s| s.enabled))
    }

    /// Enabled hooks at `point` that select `presenter` (and `component`,
    /// when the hook fires for one), in run order.
    #[must_use]
    pub fn chain(
        &self,
        point: HookPoint,
        presenter: &str,
        component: Option<&ComponentPath>,
    ) -> Vec<Arc<dyn Hook>> {
        self.slots
            .get(&point)
            .into_iter()
            .flatten()
            .filter(|s| s.enabled && s.hook.pattern().matches(presenter, component))
            .map(|s| Arc::clone(&s.hook))
            .collect()
    }

    /// Runs the chain at `point` while borrowing the registry.
    ///
    /// Hooks that touch a [`SharedHookRegistry`] must be run through
    /// [`run_chain`] on a [`chain`](Self::chain) taken beforehand instead.
    pub fn dispatch(
        &self,
        point: HookPoint,
        presenter: &str,
        component: Option<&ComponentPath>,
        ctx: HookContext,
    ) -> HookAction {
        run_chain(point, &self.chain(point, presenter, component), ctx)
    }
}

/// Runs `chain` at `point`, folding each verdict into `ctx`.
pub fn run_chain(point: HookPoint, chain: &[Arc<dyn Hook>], ctx: HookContext) -> HookAction {
    let mut ctx = ctx;
    for hook in chain {
        match apply(point, hook.id(), hook.execute(ctx.clone()), &mut ctx) {
            ControlFlow::Continue(()) => {}
            ControlFlow::Break(verdict) => return verdict,
        }
    }
    HookAction::proceed(ctx)
}

/// Folds one verdict into the running context.
fn apply(
    point: HookPoint,
    hook_id: &str,
    verdict: HookAction,
    ctx: &mut HookContext,
) -> ControlFlow<HookAction> {
    match (verdict, point.kind()) {
        (HookAction::Continue(next), _) => *ctx = *next,
        (verdict @ (HookAction::Skip(_) | HookAction::Abort { .. }), HookKind::Pre)
        | (verdict @ HookAction::Abort { .. }, HookKind::Guard) => {
            return ControlFlow::Break(verdict);
        }
        (HookAction::Replace(value), HookKind::Post) => ctx.payload = value,
        (verdict, kind) => warn!(
            hook_id,
            point = %point,
            ?kind,
            skip = verdict.is_skip(),
            abort = verdict.is_abort(),
            replace = verdict.is_replace(),
            "verdict not allowed at this hook point, ignored"
        ),
    }
    ControlFlow::Continue(())
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::testing::MockHook;
    use serde_json::{json, Value};

    fn fire(reg: &HookRegistry, point: HookPoint, presenter: &str, payload: Value) -> HookAction {
        reg.dispatch(point, presenter, None, HookContext::new(point, presenter, payload))
    }

    fn payload_after(reg: &HookRegistry, point: HookPoint, payload: Value) -> Value {
        fire(reg, point, "Shop:Products", payload)
            .into_context()
            .expect("chain continues")
            .payload
    }

    fn tagging(id: &'static str, point: HookPoint, priority: i32) -> Box<MockHook> {
        Box::new(
            MockHook::modifier(id, "*", point, move |ctx| {
                if let Some(tags) = ctx.payload.as_array_mut() {
                    tags.push(json!(id));
                }
            })
            .with_priority(priority),
        )
    }

    #[test]
    fn empty_registry_passes_the_payload_through() {
        let reg = HookRegistry::new();
        let payload = json!({"method": "GET"});
        assert_eq!(
            payload_after(&reg, HookPoint::RequestPreDispatch, payload.clone()),
            payload
        );
        assert!(!reg.has_hooks(HookPoint::RequestPreDispatch));
    }

    #[test]
    fn hooks_run_by_priority_then_registration() {
        let mut reg = HookRegistry::new();
        let point = HookPoint::RequestPostDispatch;
        reg.register(tagging("late", point, 200));
        reg.register(tagging("first", point, 10));
        reg.register(tagging("second", point, 10));
        reg.register(tagging("middle", point, 100));

        assert_eq!(
            payload_after(&reg, point, json!([])),
            json!(["first", "second", "middle", "late"])
        );
    }

    #[test]
    fn pre_point_skip_stops_the_chain() {
        let mut reg = HookRegistry::new();
        let later = MockHook::pass_through("later", "*", HookPoint::TemplatePreRender);
        let later_calls = later.counter();
        reg.register(Box::new(
            MockHook::skipper("gate", "*", HookPoint::TemplatePreRender, json!(null)).with_priority(1),
        ));
        reg.register(Box::new(later));

        assert!(fire(&reg, HookPoint::TemplatePreRender, "Shop:Products", json!({})).is_skip());
        assert_eq!(later_calls.get(), 0);
    }

    #[test]
    fn guard_points_ignore_skip_but_honor_abort() {
        let mut reg = HookRegistry::new();
        let later = MockHook::pass_through("later", "*", HookPoint::SignalPreDispatch);
        let later_calls = later.counter();
        reg.register(Box::new(
            MockHook::skipper("drop", "*", HookPoint::SignalPreDispatch, json!(null)).with_priority(1),
        ));
        reg.register(Box::new(later));

        assert!(fire(&reg, HookPoint::SignalPreDispatch, "Shop:Products", json!({})).is_continue());
        assert_eq!(later_calls.get(), 1);

        reg.register(Box::new(MockHook::aborter("deny", "*", HookPoint::RequestPreDispatch, "maintenance")));
        assert!(fire(&reg, HookPoint::RequestPreDispatch, "Shop:Products", json!({})).is_abort());
    }

    #[test]
    fn abort_is_ignored_at_event_points() {
        let mut reg = HookRegistry::new();
        reg.on_shutdown(Box::new(MockHook::aborter(
            "veto",
            "*",
            HookPoint::PresenterOnShutdown,
            "too late",
        )));
        assert!(fire(&reg, HookPoint::PresenterOnShutdown, "Homepage", json!({"cause": null})).is_continue());
    }

    #[test]
    fn replace_counts_only_at_post_points() {
        let mut reg = HookRegistry::new();
        reg.register(Box::new(MockHook::replacer(
            "outcome",
            "*",
            HookPoint::SignalPostDispatch,
            json!({"outcome": "terminate"}),
        )));
        reg.register(Box::new(MockHook::replacer(
            "cdn",
            "*",
            HookPoint::LinkPostResolve,
            json!({"url": "https://cdn.example.com/"}),
        )));
        reg.register(Box::new(MockHook::replacer(
            "noop",
            "*",
            HookPoint::TemplatePreRender,
            json!("ignored"),
        )));

        assert_eq!(
            payload_after(&reg, HookPoint::SignalPostDispatch, json!({"outcome": "continue"})),
            json!({"outcome": "terminate"})
        );
        assert_eq!(
            payload_after(&reg, HookPoint::LinkPostResolve, json!({"url": "/"})),
            json!({"url": "/"})
        );
        assert_eq!(
            payload_after(&reg, HookPoint::TemplatePreRender, json!({"layout": null})),
            json!({"layout": null})
        );
    }

    #[test]
    fn patterns_select_presenters() {
        let mut reg = HookRegistry::new();
        let front = MockHook::pass_through("front", "Front:*", HookPoint::PhaseOnEnter);
        let calls = front.counter();
        reg.register(Box::new(front));

        fire(&reg, HookPoint::PhaseOnEnter, "Shop:Products", json!({}));
        assert_eq!(calls.get(), 0);
        fire(&reg, HookPoint::PhaseOnEnter, "Front:Homepage", json!({}));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn disabled_hooks_keep_their_place() {
        let mut reg = HookRegistry::new();
        let point = HookPoint::RequestPostDispatch;
        reg.register(tagging("a", point, 10));
        reg.register(tagging("b", point, 20));

        reg.set_enabled("a", false).expect("known hook");
        assert_eq!(payload_after(&reg, point, json!([])), json!(["b"]));

        reg.set_enabled("a", true).expect("known hook");
        assert_eq!(payload_after(&reg, point, json!([])), json!(["a", "b"]));

        assert_eq!(
            reg.set_enabled("ghost", false),
            Err(HookError::NotFound("ghost".into()))
        );
    }

    #[test]
    fn hooks_may_register_hooks_while_running() {
        let shared = HookRegistry::new().shared();
        let handle = Arc::clone(&shared);
        shared.write().register(Box::new(MockHook::modifier(
            "installer",
            "*",
            HookPoint::PresenterOnShutdown,
            move |_| {
                handle
                    .write()
                    .register(Box::new(MockHook::pass_through("late", "*", HookPoint::PresenterOnShutdown)));
            },
        )));

        let point = HookPoint::PresenterOnShutdown;
        let chain = shared.read().chain(point, "Homepage", None);
        assert_eq!(chain.len(), 1);
        assert!(run_chain(point, &chain, HookContext::new(point, "Homepage", json!({}))).is_continue());
        assert_eq!(shared.read().len(), 2);
    }

    #[test]
    fn unregister_removes_by_id() {
        let mut reg = HookRegistry::new();
        reg.register(tagging("a", HookPoint::RequestPostDispatch, 10));
        assert_eq!(reg.len(), 1);

        assert!(reg.unregister("a"));
        assert!(!reg.unregister("a"));
        assert!(reg.is_empty());
    }
}
