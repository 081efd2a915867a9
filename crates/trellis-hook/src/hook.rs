//! The [`Hook`] trait and its test doubles.

use crate::{HookAction, HookContext, HookPoint, PresenterPattern};

/// Priority given to hooks that do not choose one.
pub const DEFAULT_PRIORITY: i32 = 100;

/// A handler bound to one [`HookPoint`] for the presenters its pattern
/// selects.
///
/// One registry serves every presenter of a host, so hooks are
/// `Send + Sync`. Lower priorities run first.
pub trait Hook: Send + Sync {
    fn id(&self) -> &str;

    fn pattern(&self) -> &PresenterPattern;

    fn hook_point(&self) -> HookPoint;

    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// Runs the hook. See [`HookAction`] for which verdicts count where.
    fn execute(&self, ctx: HookContext) -> HookAction;
}

pub mod testing {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    type Respond = Box<dyn Fn(HookContext) -> HookAction + Send + Sync>;

    /// Shared execution counter, readable after the hook moved into a registry.
    #[derive(Debug, Clone, Default)]
    pub struct CallCount(Arc<AtomicUsize>);

    impl CallCount {
        #[must_use]
        pub fn get(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    /// Scripted hook returning the same kind of verdict on every call.
    pub struct MockHook {
        id: String,
        pattern: PresenterPattern,
        point: HookPoint,
        priority: i32,
        respond: Respond,
        calls: CallCount,
    }

    impl MockHook {
        fn scripted(id: &str, pattern: &str, point: HookPoint, respond: Respond) -> Self {
            Self {
                id: id.to_string(),
                pattern: PresenterPattern::parse(pattern).expect("MockHook pattern"),
                point,
                priority: DEFAULT_PRIORITY,
                respond,
                calls: CallCount::default(),
            }
        }

        pub fn pass_through(id: &str, pattern: &str, point: HookPoint) -> Self {
            Self::scripted(id, pattern, point, Box::new(HookAction::proceed))
        }

        /// Edits the context in place, then continues.
        pub fn modifier(
            id: &str,
            pattern: &str,
            point: HookPoint,
            edit: impl Fn(&mut HookContext) + Send + Sync + 'static,
        ) -> Self {
            Self::scripted(
                id,
                pattern,
                point,
                Box::new(move |mut ctx| {
                    edit(&mut ctx);
                    HookAction::proceed(ctx)
                }),
            )
        }

        pub fn aborter(id: &str, pattern: &str, point: HookPoint, reason: &str) -> Self {
            let reason = reason.to_string();
            Self::scripted(id, pattern, point, Box::new(move |_| HookAction::abort(reason.as_str())))
        }

        pub fn skipper(id: &str, pattern: &str, point: HookPoint, value: Value) -> Self {
            Self::scripted(id, pattern, point, Box::new(move |_| HookAction::Skip(value.clone())))
        }

        pub fn replacer(id: &str, pattern: &str, point: HookPoint, value: Value) -> Self {
            Self::scripted(id, pattern, point, Box::new(move |_| HookAction::Replace(value.clone())))
        }

        #[must_use]
        pub fn with_priority(mut self, priority: i32) -> Self {
            self.priority = priority;
            self
        }

        /// Counter shared with this hook.
        #[must_use]
        pub fn counter(&self) -> CallCount {
            self.calls.clone()
        }

        #[must_use]
        pub fn calls(&self) -> usize {
            self.calls.get()
        }
    }

    impl Hook for MockHook {
        fn id(&self) -> &str {
            &self.id
        }

        fn pattern(&self) -> &PresenterPattern {
            &self.pattern
        }

        fn hook_point(&self) -> HookPoint {
            self.point
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn execute(&self, ctx: HookContext) -> HookAction {
            self.calls.0.fetch_add(1, Ordering::SeqCst);
            (self.respond)(ctx)
        }
    }

    /// Contexts seen by one or more [`RecordingHook`]s.
    #[derive(Debug, Clone, Default)]
    pub struct HookLog(Arc<Mutex<Vec<HookContext>>>);

    impl HookLog {
        #[must_use]
        pub fn contexts(&self) -> Vec<HookContext> {
            self.0.lock().clone()
        }

        /// Points in firing order.
        #[must_use]
        pub fn points(&self) -> Vec<HookPoint> {
            self.0.lock().iter().map(|c| c.hook_point).collect()
        }

        #[must_use]
        pub fn payloads(&self, point: HookPoint) -> Vec<Value> {
            self.0
                .lock()
                .iter()
                .filter(|c| c.hook_point == point)
                .map(|c| c.payload.clone())
                .collect()
        }
    }

    /// Pass-through hook for every presenter that appends to a [`HookLog`].
    pub struct RecordingHook {
        id: String,
        pattern: PresenterPattern,
        point: HookPoint,
        log: HookLog,
    }

    impl RecordingHook {
        #[must_use]
        pub fn new(id: &str, point: HookPoint, log: &HookLog) -> Self {
            Self {
                id: id.to_string(),
                pattern: PresenterPattern::any(),
                point,
                log: log.clone(),
            }
        }
    }

    impl Hook for RecordingHook {
        fn id(&self) -> &str {
            &self.id
        }

        fn pattern(&self) -> &PresenterPattern {
            &self.pattern
        }

        fn hook_point(&self) -> HookPoint {
            self.point
        }

        fn execute(&self, ctx: HookContext) -> HookAction {
            self.log.0.lock().push(ctx.clone());
            HookAction::proceed(ctx)
        }
    }
}
