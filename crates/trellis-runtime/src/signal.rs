//! Signal routing.
//!
//! A signal is a user-initiated event (`do=grid-pager-next`) addressed to
//! one node of the component tree. The presenter delivers the pending
//! signal once, in the signal phase:
//!
//! ```text
//! pending signal ──resolve receiver──► capability checks ──► invalidate?
//!                                                               │
//!                       handle<Signal>(bound params) ◄──────────┘
//! ```
//!
//! | Failure | Message |
//! |---------|---------|
//! | no node at the receiver path | `The signal receiver component '…' is not found.` |
//! | node cannot receive signals | `The signal receiver component '…' is not a signal receiver.` |
//! | no `handle<Signal>` handler | `There is no handler for signal '…' in class ….` |

use crate::DispatchError;
use std::sync::Arc;
use trellis_component::{signal_method, Capabilities, ComponentTree, MethodDecl, ResolvedClass};
use trellis_event::Signal;
use trellis_types::ComponentPath;

/// What [`is_signal_receiver`] asks about a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalQuery<'a> {
    /// The signal targets exactly the component.
    Receiver,
    /// The signal targets the component or one of its descendants.
    Subtree,
    /// The signal targets exactly the component and has this name
    /// (ignoring case).
    Named(&'a str),
}

/// Answers whether the pending signal concerns the component at `path`.
///
/// Always `false` without a pending signal.
///
/// # Example
///
/// ```
/// use trellis_event::Signal;
/// use trellis_runtime::{is_signal_receiver, SignalQuery};
/// use trellis_types::ComponentPath;
///
/// let signal = Signal::decode("grid-pager-next");
/// let grid = ComponentPath::from_joined("grid");
///
/// assert!(is_signal_receiver(signal.as_ref(), &grid, SignalQuery::Subtree));
/// assert!(!is_signal_receiver(signal.as_ref(), &grid, SignalQuery::Receiver));
/// ```
#[must_use]
pub fn is_signal_receiver(pending: Option<&Signal>, path: &ComponentPath, query: SignalQuery<'_>) -> bool {
    let Some(signal) = pending else {
        return false;
    };
    match query {
        SignalQuery::Receiver => signal.receiver() == path,
        SignalQuery::Subtree => signal.targets_subtree(path),
        SignalQuery::Named(name) => signal.matches(path, name),
    }
}

/// A signal ready to be delivered.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Path of the receiving component (root for the presenter).
    pub receiver: ComponentPath,
    pub class: Arc<ResolvedClass>,
    /// Declared handler to call.
    pub method: MethodDecl,
}

/// Resolves the receiver and handler of a signal.
///
/// The presenter is the receiver for signals without a component path.
/// A renderable receiver is invalidated as soon as it is resolved, before
/// its handler runs.
#[derive(Debug)]
pub struct SignalDispatcher<'a> {
    presenter: &'a Arc<ResolvedClass>,
    presenter_invalidated: &'a mut bool,
    tree: &'a mut ComponentTree,
}

impl<'a> SignalDispatcher<'a> {
    #[must_use]
    pub fn new(
        presenter: &'a Arc<ResolvedClass>,
        presenter_invalidated: &'a mut bool,
        tree: &'a mut ComponentTree,
    ) -> Self {
        Self {
            presenter,
            presenter_invalidated,
            tree,
        }
    }

    /// Prepares delivery of `signal`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::BadSignal`] if the receiver does not exist, cannot
    /// receive signals, or has no handler for the signal.
    pub fn prepare(&mut self, signal: &Signal) -> Result<Delivery, DispatchError> {
        let receiver = signal.receiver().clone();

        let class = if receiver.is_root() {
            Arc::clone(self.presenter)
        } else {
            let node = self.tree.get(&receiver).ok_or_else(|| {
                DispatchError::BadSignal(format!(
                    "The signal receiver component '{receiver}' is not found."
                ))
            })?;
            Arc::clone(node.class())
        };

        if !class.has_capability(Capabilities::SIGNAL_RECEIVER) {
            return Err(DispatchError::BadSignal(format!(
                "The signal receiver component '{receiver}' is not a signal receiver."
            )));
        }

        if class.has_capability(Capabilities::RENDERABLE) {
            if receiver.is_root() {
                *self.presenter_invalidated = true;
            } else if let Some(node) = self.tree.get_mut(&receiver) {
                node.invalidate();
            }
        }

        let method = class
            .method(&signal_method(signal.name()))
            .cloned()
            .ok_or_else(|| {
                DispatchError::BadSignal(format!(
                    "There is no handler for signal '{}' in class {}.",
                    signal.name(),
                    class.id()
                ))
            })?;

        tracing::debug!(
            receiver = %receiver,
            signal = signal.name(),
            handler = method.name(),
            "signal resolved"
        );
        Ok(Delivery {
            receiver,
            class,
            method,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_component::testing::{MockComponent, TestClasses};
    use trellis_component::{ClassDecl, MethodDecl};
    use trellis_types::ClassId;

    fn setup() -> (TestClasses, Arc<ResolvedClass>, ComponentTree) {
        let classes = TestClasses::new();
        classes
            .registry()
            .register(ClassDecl::presenter("Home").method(MethodDecl::new("handleLogout")))
            .expect("presenter");
        let presenter = classes.resolve("Home");

        let mut tree = ComponentTree::new();
        let root = ComponentPath::root();
        tree.add(&root, "grid", classes.control(), MockComponent::boxed("Control"))
            .expect("grid");
        tree.add(&root, "form", classes.plain(), MockComponent::boxed("Plain"))
            .expect("form");
        (classes, presenter, tree)
    }

    fn signal(raw: &str) -> Signal {
        Signal::decode(raw).expect("signal")
    }

    #[test]
    fn presenter_signal_invalidates_presenter() {
        let (_classes, presenter, mut tree) = setup();
        let mut invalidated = false;
        let delivery = SignalDispatcher::new(&presenter, &mut invalidated, &mut tree)
            .prepare(&signal("logout"))
            .expect("delivery");

        assert!(delivery.receiver.is_root());
        assert_eq!(delivery.method.name(), "handleLogout");
        assert_eq!(delivery.class.id(), &ClassId::new("Home"));
        assert!(invalidated);
    }

    #[test]
    fn renderable_component_is_invalidated() {
        let (_classes, presenter, mut tree) = setup();
        let mut invalidated = false;
        let delivery = SignalDispatcher::new(&presenter, &mut invalidated, &mut tree)
            .prepare(&signal("grid-NEXT"))
            .expect("delivery");

        assert_eq!(delivery.method.name(), "handleNext");
        assert!(!invalidated);
        assert!(tree
            .get(&ComponentPath::from_joined("grid"))
            .expect("grid")
            .is_invalidated());
    }

    #[test]
    fn non_renderable_component_is_not_invalidated() {
        let (_classes, presenter, mut tree) = setup();
        let mut invalidated = false;
        SignalDispatcher::new(&presenter, &mut invalidated, &mut tree)
            .prepare(&signal("form-submit"))
            .expect("delivery");
        assert!(!tree
            .get(&ComponentPath::from_joined("form"))
            .expect("form")
            .is_invalidated());
    }

    #[test]
    fn missing_receiver_is_bad_signal() {
        let (_classes, presenter, mut tree) = setup();
        let mut invalidated = false;
        let err = SignalDispatcher::new(&presenter, &mut invalidated, &mut tree)
            .prepare(&signal("menu-open"))
            .unwrap_err();
        assert_eq!(err.to_string(), "The signal receiver component 'menu' is not found.");
    }

    #[test]
    fn missing_handler_is_bad_signal() {
        let (_classes, presenter, mut tree) = setup();
        let mut invalidated = false;
        let err = SignalDispatcher::new(&presenter, &mut invalidated, &mut tree)
            .prepare(&signal("grid-sort"))
            .unwrap_err();
        assert!(matches!(err, DispatchError::BadSignal(_)));
        assert_eq!(
            err.to_string(),
            "There is no handler for signal 'sort' in class Control."
        );
    }

    #[test]
    fn receiver_without_capability_is_rejected() {
        let classes = TestClasses::new();
        classes
            .registry()
            .register(ClassDecl::component("Label").capabilities(Capabilities::STATE_PERSISTENT))
            .expect("label");
        classes
            .registry()
            .register(ClassDecl::presenter("Home"))
            .expect("presenter");
        let presenter = classes.resolve("Home");
        let mut tree = ComponentTree::new();
        tree.add(
            &ComponentPath::root(),
            "label",
            classes.resolve("Label"),
            MockComponent::boxed("Label"),
        )
        .expect("label");

        let mut invalidated = false;
        let err = SignalDispatcher::new(&presenter, &mut invalidated, &mut tree)
            .prepare(&signal("label-click"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The signal receiver component 'label' is not a signal receiver."
        );
    }

    #[test]
    fn receiver_queries() {
        let pending = signal("grid-pager-next");
        let grid = ComponentPath::from_joined("grid");
        let pager = ComponentPath::from_joined("grid-pager");
        let griddle = ComponentPath::from_joined("griddle");

        assert!(is_signal_receiver(Some(&pending), &ComponentPath::root(), SignalQuery::Subtree));
        assert!(is_signal_receiver(Some(&pending), &grid, SignalQuery::Subtree));
        assert!(!is_signal_receiver(Some(&pending), &griddle, SignalQuery::Subtree));
        assert!(is_signal_receiver(Some(&pending), &pager, SignalQuery::Receiver));
        assert!(is_signal_receiver(Some(&pending), &pager, SignalQuery::Named("NEXT")));
        assert!(!is_signal_receiver(Some(&pending), &pager, SignalQuery::Named("prev")));
        assert!(!is_signal_receiver(None, &pager, SignalQuery::Receiver));
    }
}
