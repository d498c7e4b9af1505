//! The group orchestrator.

use crate::error::TransitionError;
use crate::group::mapping::{
    classify, compute_enter_keys, merge_child_mappings, Child, ChildMapping, ChildRecord,
    Directive, Lifecycle,
};
use crate::group::renderer::{ChildProps, RenderedChild, Renderer};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::rc::{Rc, Weak};
use tracing::{debug, trace, warn};

/// Collection-wide transition defaults. Per-child overrides win.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPolicy {
    pub appear: bool,
    pub enter: bool,
    pub exit: bool,
    pub unmount_on_exit: Option<bool>,
}

impl Default for GroupPolicy {
    fn default() -> Self {
        Self {
            appear: false,
            enter: true,
            exit: true,
            unmount_on_exit: None,
        }
    }
}

impl GroupPolicy {
    pub fn appear(mut self, appear: bool) -> Self {
        self.appear = appear;
        self
    }

    pub fn enter(mut self, enter: bool) -> Self {
        self.enter = enter;
        self
    }

    pub fn exit(mut self, exit: bool) -> Self {
        self.exit = exit;
        self
    }

    pub fn unmount_on_exit(mut self, unmount_on_exit: bool) -> Self {
        self.unmount_on_exit = Some(unmount_on_exit);
        self
    }
}

struct GroupState<K, T> {
    rendered: ChildMapping<K, T>,
    has_rendered_once: bool,
    policy: GroupPolicy,
}

pub(crate) struct GroupShared<K, T> {
    state: RefCell<GroupState<K, T>>,
    renderer: Box<dyn Renderer<K, T>>,
    emitting: Cell<bool>,
    dirty: Cell<bool>,
}

impl<K, T> GroupShared<K, T>
where
    K: Clone + Eq + Hash + Debug + 'static,
    T: 'static,
{
    fn snapshot(self: &Rc<Self>) -> Vec<RenderedChild<K, T>> {
        let state = self.state.borrow();
        state
            .rendered
            .iter()
            .map(|record| RenderedChild {
                key: record.key.clone(),
                element: Rc::clone(&record.element),
                props: ChildProps::resolve(record, &state.policy),
                on_exited: ExitNotifier {
                    group: Rc::downgrade(self),
                    key: record.key.clone(),
                },
            })
            .collect()
    }

    /// Hand the current mapping to the renderer.
    ///
    /// Emissions never nest: a change made while rendering (a child that
    /// finishes its exit synchronously) marks the group dirty and the
    /// mapping is rendered once more after the current pass returns, even
    /// when that pass failed. The first render error is returned.
    fn emit(self: &Rc<Self>) -> Result<(), TransitionError> {
        if self.emitting.get() {
            self.dirty.set(true);
            return Ok(());
        }
        self.emitting.set(true);
        let mut failure = None;
        loop {
            self.dirty.set(false);
            let children = self.snapshot();
            trace!(children = children.len(), "emitting rendered mapping");
            if let Err(error) = self.renderer.render(&children) {
                failure.get_or_insert(error);
            }
            if !self.dirty.get() {
                break;
            }
        }
        self.emitting.set(false);
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn child_exited(self: &Rc<Self>, key: &K) -> bool {
        let removed = {
            let mut state = self.state.borrow_mut();
            match state.rendered.get(key) {
                Some(record) if record.is_exiting() => state.rendered.remove(key).is_some(),
                Some(_) => {
                    debug!(?key, "exit completed for a re-entered child, keeping it");
                    false
                }
                None => {
                    trace!(?key, "exit completion for unknown child ignored");
                    false
                }
            }
        };
        if removed {
            debug!(?key, "exited child pruned");
            if let Err(error) = self.emit() {
                warn!(?key, %error, "re-render after pruning an exited child failed");
            }
        }
        removed
    }
}

/// Completion callback for one rendered child.
///
/// The host calls [`notify`](Self::notify) when the child's exit has
/// finished. Holds only a weak reference to the group.
pub struct ExitNotifier<K, T> {
    group: Weak<GroupShared<K, T>>,
    key: K,
}

impl<K, T> ExitNotifier<K, T>
where
    K: Clone + Eq + Hash + Debug + 'static,
    T: 'static,
{
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Report the exit as finished. Returns whether the child was pruned.
    pub fn notify(&self) -> bool {
        match self.group.upgrade() {
            Some(group) => group.child_exited(&self.key),
            None => false,
        }
    }
}

impl<K: Clone, T> Clone for ExitNotifier<K, T> {
    fn clone(&self) -> Self {
        Self {
            group: Weak::clone(&self.group),
            key: self.key.clone(),
        }
    }
}

impl<K: Debug, T> Debug for ExitNotifier<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExitNotifier")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Keeps a keyed collection of children rendered while they transition in
/// and out.
///
/// Each [`update`](Self::update) diffs the requested children against the
/// rendered mapping, classifies every child and emits the mapping to the
/// renderer. Removed children stay in the mapping, marked absent, until
/// their exit is reported through [`on_child_exited`](Self::on_child_exited)
/// or the child's [`ExitNotifier`].
///
/// # Example
///
/// ```rust
/// use transition_group::group::{Child, Lifecycle, RenderedChild, TransitionGroup};
/// use transition_group::TransitionError;
///
/// let group = TransitionGroup::new(
///     |_: &[RenderedChild<u32, u32>]| -> Result<(), TransitionError> { Ok(()) },
/// );
///
/// group.update(vec![Child::new(1, 10)]).unwrap();
/// group.update(vec![]).unwrap();
/// assert_eq!(group.lifecycle(&1), Some(Lifecycle::Exiting));
///
/// assert!(group.on_child_exited(&1));
/// assert!(group.is_empty());
/// ```
pub struct TransitionGroup<K, T> {
    shared: Rc<GroupShared<K, T>>,
}

impl<K, T> TransitionGroup<K, T>
where
    K: Clone + Eq + Hash + Debug + 'static,
    T: 'static,
{
    pub fn new(renderer: impl Renderer<K, T> + 'static) -> Self {
        Self::with_policy(renderer, GroupPolicy::default())
    }

    pub fn with_policy(renderer: impl Renderer<K, T> + 'static, policy: GroupPolicy) -> Self {
        Self {
            shared: Rc::new(GroupShared {
                state: RefCell::new(GroupState {
                    rendered: ChildMapping::new(),
                    has_rendered_once: false,
                    policy,
                }),
                renderer: Box::new(renderer),
                emitting: Cell::new(false),
                dirty: Cell::new(false),
            }),
        }
    }

    /// Apply a new requested child list and emit the merged mapping.
    ///
    /// Children present on the group's very first update appear; children
    /// added later enter; children no longer requested start exiting.
    pub fn update(&self, children: Vec<Child<K, T>>) -> Result<(), TransitionError> {
        {
            let mut state = self.shared.state.borrow_mut();
            let is_first_render = !state.has_rendered_once;
            let enter_keys =
                compute_enter_keys(children.iter().map(|child| &child.key), &state.rendered);
            let mut merged = merge_child_mappings(children, &state.rendered)?;

            let mut exiting = 0;
            for record in merged.iter_mut() {
                record.directive = classify(
                    &record.key,
                    is_first_render,
                    &enter_keys,
                    record.directive.present,
                );
                if record.is_exiting() {
                    exiting += 1;
                }
            }
            debug!(
                rendered = merged.len(),
                entering = enter_keys.len(),
                exiting,
                first = is_first_render,
                "group updated"
            );

            state.rendered = merged;
            state.has_rendered_once = true;
        }
        self.shared.emit()
    }

    /// Prune a child whose exit finished and re-emit.
    ///
    /// Only children still marked exiting are pruned; a completion for a
    /// child that re-entered, or one that is unknown, is ignored. Returns
    /// whether the child was pruned.
    pub fn on_child_exited(&self, key: &K) -> bool {
        self.shared.child_exited(key)
    }

    /// Completion callback for `key`, for hosts that wire exits manually.
    pub fn exit_notifier(&self, key: K) -> ExitNotifier<K, T> {
        ExitNotifier {
            group: Rc::downgrade(&self.shared),
            key,
        }
    }

    /// The mapping as it would be emitted now.
    pub fn snapshot(&self) -> Vec<RenderedChild<K, T>> {
        self.shared.snapshot()
    }

    /// Keys of the rendered mapping, exiting children included.
    pub fn rendered_keys(&self) -> Vec<K> {
        self.shared.state.borrow().rendered.keys().cloned().collect()
    }

    pub fn record(&self, key: &K) -> Option<ChildRecord<K, T>> {
        self.shared.state.borrow().rendered.get(key).cloned()
    }

    pub fn directive(&self, key: &K) -> Option<Directive> {
        self.shared
            .state
            .borrow()
            .rendered
            .get(key)
            .map(|record| record.directive)
    }

    pub fn lifecycle(&self, key: &K) -> Option<Lifecycle> {
        self.directive(key).map(|directive| directive.lifecycle())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.shared.state.borrow().rendered.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.shared.state.borrow().rendered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.borrow().rendered.is_empty()
    }

    pub fn has_rendered_once(&self) -> bool {
        self.shared.state.borrow().has_rendered_once
    }

    pub fn policy(&self) -> GroupPolicy {
        self.shared.state.borrow().policy
    }

    /// Change the defaults. Takes effect from the next emission.
    pub fn set_policy(&self, policy: GroupPolicy) {
        self.shared.state.borrow_mut().policy = policy;
    }
}

impl<K: Debug, T> Debug for TransitionGroup<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shared.state.try_borrow() {
            Ok(state) => f
                .debug_struct("TransitionGroup")
                .field("rendered", &state.rendered)
                .field("has_rendered_once", &state.has_rendered_once)
                .field("policy", &state.policy)
                .finish(),
            Err(_) => f.write_str("TransitionGroup { <busy> }"),
        }
    }
}
