//! Reference host that drives one transition machine per rendered child.

use crate::builder::TransitionBuilder;
use crate::core::TransitionState;
use crate::error::TransitionError;
use crate::group::renderer::{RenderedChild, Renderer};
use crate::scheduler::Scheduler;
use crate::transition::TransitionMachine;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;
use tracing::{debug, trace};

/// Builds the machine configuration for a newly mounted child.
pub type MountFactory<K, T> = Box<dyn Fn(&K, &T) -> TransitionBuilder>;

struct Mounted<K> {
    order: Vec<K>,
    machines: HashMap<K, Rc<TransitionMachine>>,
}

struct StageInner<K, T> {
    scheduler: Rc<dyn Scheduler>,
    factory: MountFactory<K, T>,
    mounted: RefCell<Mounted<K>>,
}

/// Renderer that mounts a [`TransitionMachine`] per key.
///
/// A key's machine is built once, when the key is first rendered, from the
/// factory's builder with the child's props applied; later renders only
/// update its presence. When the machine reports `on_exited` the group is
/// notified, and once the group prunes the key the machine is dropped,
/// which cancels anything still pending.
///
/// A child that is first seen already exiting was never shown, so it is
/// reported as exited right away.
///
/// Clones share the same mounted children.
pub struct Stage<K, T> {
    inner: Rc<StageInner<K, T>>,
}

impl<K, T> Clone for Stage<K, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K, T> Stage<K, T>
where
    K: Clone + Eq + Hash + Debug + 'static,
    T: 'static,
{
    pub fn new<F>(scheduler: Rc<dyn Scheduler>, factory: F) -> Self
    where
        F: Fn(&K, &T) -> TransitionBuilder + 'static,
    {
        Self {
            inner: Rc::new(StageInner {
                scheduler,
                factory: Box::new(factory),
                mounted: RefCell::new(Mounted {
                    order: Vec::new(),
                    machines: HashMap::new(),
                }),
            }),
        }
    }

    /// Keys currently mounted, in render order.
    pub fn mounted_keys(&self) -> Vec<K> {
        self.inner.mounted.borrow().order.clone()
    }

    /// Mounted keys whose machine is not `Unmounted`.
    pub fn visible_keys(&self) -> Vec<K> {
        let mounted = self.inner.mounted.borrow();
        mounted
            .order
            .iter()
            .filter(|key| {
                mounted
                    .machines
                    .get(*key)
                    .is_some_and(|machine| machine.is_visible())
            })
            .cloned()
            .collect()
    }

    pub fn state_of(&self, key: &K) -> Option<TransitionState> {
        self.machine(key).map(|machine| machine.state())
    }

    pub fn machine(&self, key: &K) -> Option<Rc<TransitionMachine>> {
        self.inner.mounted.borrow().machines.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.mounted.borrow().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.mounted.borrow().order.is_empty()
    }

    fn mount(&self, child: &RenderedChild<K, T>) -> Result<Rc<TransitionMachine>, TransitionError> {
        let notifier = child.on_exited.clone();
        let builder = (self.inner.factory)(&child.key, &child.element);
        let machine = child
            .props
            .configure(builder)
            .notify_exited(move |_| {
                notifier.notify();
            })
            .build(Rc::clone(&self.inner.scheduler))?;
        debug!(key = ?child.key, lifecycle = ?child.props.lifecycle, "child mounted");
        Ok(Rc::new(machine))
    }
}

impl<K, T> Renderer<K, T> for Stage<K, T>
where
    K: Clone + Eq + Hash + Debug + 'static,
    T: 'static,
{
    fn render(&self, children: &[RenderedChild<K, T>]) -> Result<(), TransitionError> {
        let wanted: HashSet<&K> = children.iter().map(|child| &child.key).collect();

        // Split the work up front; machine callbacks run without the
        // mounted set borrowed.
        let mut existing = Vec::new();
        let mut fresh = Vec::new();
        let mut never_shown = Vec::new();
        let dropped = {
            let mut mounted = self.inner.mounted.borrow_mut();
            let stale: Vec<K> = mounted
                .machines
                .keys()
                .filter(|key| !wanted.contains(key))
                .cloned()
                .collect();
            let dropped: Vec<Rc<TransitionMachine>> = stale
                .iter()
                .filter_map(|key| mounted.machines.remove(key))
                .collect();

            for child in children {
                match mounted.machines.get(&child.key) {
                    Some(machine) => existing.push((Rc::clone(machine), child.props.present)),
                    None if child.props.present => fresh.push(child),
                    None => never_shown.push(child.on_exited.clone()),
                }
            }
            dropped
        };
        for machine in &dropped {
            machine.teardown();
        }
        if !dropped.is_empty() {
            trace!(count = dropped.len(), "unmounting pruned children");
        }
        drop(dropped);

        // Presence changes go first so a child that fails to mount cannot
        // hold back the exits of its siblings.
        for (machine, present) in existing {
            machine.update_presence(present);
        }
        for notifier in never_shown {
            trace!(key = ?notifier.key(), "child exited before it was ever shown");
            notifier.notify();
        }

        let mut failure = None;
        for child in fresh {
            match self.mount(child) {
                Ok(machine) => {
                    self.inner
                        .mounted
                        .borrow_mut()
                        .machines
                        .insert(child.key.clone(), machine);
                }
                Err(error) => {
                    debug!(key = ?child.key, %error, "child failed to mount");
                    failure.get_or_insert(error);
                }
            }
        }

        let mut mounted = self.inner.mounted.borrow_mut();
        let order = children
            .iter()
            .filter(|child| mounted.machines.contains_key(&child.key))
            .map(|child| child.key.clone())
            .collect();
        mounted.order = order;

        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
