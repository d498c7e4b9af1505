//! Keyed child mappings and the pure functions that diff them.
//!
//! Nothing here schedules or renders anything. Given the children requested
//! now and the mapping rendered last time, these functions decide which
//! records exist, in which order, and how each one is classified.

use crate::group::error::DuplicateKeyError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::rc::Rc;

/// Per-child overrides of the group's default policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildOverrides {
    pub appear: Option<bool>,
    pub enter: Option<bool>,
    pub exit: Option<bool>,
    pub unmount_on_exit: Option<bool>,
}

/// A keyed child as supplied by the caller.
pub struct Child<K, T> {
    pub key: K,
    pub element: T,
    pub overrides: ChildOverrides,
}

impl<K, T> Child<K, T> {
    pub fn new(key: K, element: T) -> Self {
        Self {
            key,
            element,
            overrides: ChildOverrides::default(),
        }
    }

    pub fn appear(mut self, appear: bool) -> Self {
        self.overrides.appear = Some(appear);
        self
    }

    pub fn enter(mut self, enter: bool) -> Self {
        self.overrides.enter = Some(enter);
        self
    }

    pub fn exit(mut self, exit: bool) -> Self {
        self.overrides.exit = Some(exit);
        self
    }

    pub fn unmount_on_exit(mut self, unmount_on_exit: bool) -> Self {
        self.overrides.unmount_on_exit = Some(unmount_on_exit);
        self
    }
}

/// Lifecycle classification of a rendered child.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Present on the very first render of the group.
    Appearing,
    /// Added by a later update.
    Entering,
    /// Present before and still requested.
    Existing,
    /// No longer requested, kept until its exit completes.
    Exiting,
}

/// Transition directive assigned to a child by [`classify`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    /// Requested presence (`in`).
    pub present: bool,
    pub appear: bool,
    pub enter: bool,
    /// Whether the child may animate its exit. [`classify`] always allows
    /// it; the group policy and the child's own overrides can still turn
    /// the animation off, see [`ChildProps::resolve`](crate::group::ChildProps::resolve).
    pub exit: bool,
}

impl Directive {
    pub fn lifecycle(&self) -> Lifecycle {
        if !self.present {
            Lifecycle::Exiting
        } else if self.appear {
            Lifecycle::Appearing
        } else if self.enter {
            Lifecycle::Entering
        } else {
            Lifecycle::Existing
        }
    }

    fn pending(present: bool) -> Self {
        Self {
            present,
            appear: false,
            enter: false,
            exit: true,
        }
    }
}

/// One entry of the rendered mapping.
pub struct ChildRecord<K, T> {
    pub key: K,
    pub element: Rc<T>,
    pub overrides: ChildOverrides,
    pub directive: Directive,
}

impl<K, T> ChildRecord<K, T> {
    pub fn lifecycle(&self) -> Lifecycle {
        self.directive.lifecycle()
    }

    /// Kept only until its exit completes.
    pub fn is_exiting(&self) -> bool {
        !self.directive.present
    }
}

impl<K: Clone, T> Clone for ChildRecord<K, T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            element: Rc::clone(&self.element),
            overrides: self.overrides,
            directive: self.directive,
        }
    }
}

impl<K: Debug, T> Debug for ChildRecord<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildRecord")
            .field("key", &self.key)
            .field("directive", &self.directive)
            .finish_non_exhaustive()
    }
}

/// Ordered key → record mapping.
pub struct ChildMapping<K, T> {
    records: Vec<ChildRecord<K, T>>,
    index: HashMap<K, usize>,
}

impl<K, T> Default for ChildMapping<K, T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Clone + Eq + Hash, T> Clone for ChildMapping<K, T> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
            index: self.index.clone(),
        }
    }
}

impl<K: Debug, T> Debug for ChildMapping<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.records.iter()).finish()
    }
}

impl<K: Clone + Eq + Hash + Debug, T> ChildMapping<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Keys must be unique.
    pub fn push(&mut self, record: ChildRecord<K, T>) -> Result<(), DuplicateKeyError> {
        if self.index.contains_key(&record.key) {
            return Err(DuplicateKeyError::new(&record.key));
        }
        self.index.insert(record.key.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    pub fn get(&self, key: &K) -> Option<&ChildRecord<K, T>> {
        self.index.get(key).map(|&position| &self.records[position])
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Remove a record, keeping the order of the rest.
    pub fn remove(&mut self, key: &K) -> Option<ChildRecord<K, T>> {
        let position = self.index.remove(key)?;
        let record = self.records.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(record)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.records.iter().map(|record| &record.key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChildRecord<K, T>> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ChildRecord<K, T>> {
        self.records.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Keys of `next_keys` that `prev` does not contain.
pub fn compute_enter_keys<'a, K, T>(
    next_keys: impl IntoIterator<Item = &'a K>,
    prev: &ChildMapping<K, T>,
) -> HashSet<K>
where
    K: Clone + Eq + Hash + Debug + 'a,
{
    next_keys
        .into_iter()
        .filter(|key| !prev.contains_key(key))
        .cloned()
        .collect()
}

/// Merge the requested children with the previously rendered mapping.
///
/// - Every requested key appears in request order. A key already rendered
///   keeps its record (directive included) with the new element swapped in.
/// - Every previously rendered key that is no longer requested is kept with
///   `present = false`, placed right after the last requested key that
///   preceded it in the previous order, or at the front if none did.
///   Several such keys after the same anchor keep their previous relative
///   order.
///
/// Fails on a duplicate requested key.
pub fn merge_child_mappings<K, T>(
    next: Vec<Child<K, T>>,
    prev: &ChildMapping<K, T>,
) -> Result<ChildMapping<K, T>, DuplicateKeyError>
where
    K: Clone + Eq + Hash + Debug,
{
    let mut next_keys = HashSet::with_capacity(next.len());
    for child in &next {
        if !next_keys.insert(child.key.clone()) {
            return Err(DuplicateKeyError::new(&child.key));
        }
    }

    // Departed keys grouped by the surviving key they follow.
    let mut leading = Vec::new();
    let mut trailing: HashMap<K, Vec<ChildRecord<K, T>>> = HashMap::new();
    let mut anchor: Option<&K> = None;
    for record in prev.iter() {
        if next_keys.contains(&record.key) {
            anchor = Some(&record.key);
            continue;
        }
        let mut departed = record.clone();
        departed.directive.present = false;
        match anchor {
            Some(key) => trailing.entry(key.clone()).or_default().push(departed),
            None => leading.push(departed),
        }
    }

    let mut merged = ChildMapping::new();
    for record in leading {
        merged.push(record)?;
    }
    for child in next {
        let directive = match prev.get(&child.key) {
            Some(previous) => Directive {
                present: true,
                ..previous.directive
            },
            None => Directive::pending(true),
        };
        let followers = trailing.remove(&child.key);
        merged.push(ChildRecord {
            key: child.key,
            element: Rc::new(child.element),
            overrides: child.overrides,
            directive,
        })?;
        for record in followers.into_iter().flatten() {
            merged.push(record)?;
        }
    }
    Ok(merged)
}

/// Classify one key of a merged mapping.
///
/// `appear` and `enter` are mutually exclusive: anything present on the
/// group's very first render appears, never enters.
pub fn classify<K: Eq + Hash>(
    key: &K,
    is_first_render: bool,
    enter_keys: &HashSet<K>,
    is_in_next: bool,
) -> Directive {
    Directive {
        present: is_in_next,
        appear: is_first_render,
        enter: !is_first_render && enter_keys.contains(key),
        exit: true,
    }
}
