//! The host side of the group: what gets emitted and who receives it.

use crate::builder::TransitionBuilder;
use crate::error::TransitionError;
use crate::group::mapping::{ChildOverrides, ChildRecord, Lifecycle};
use crate::group::orchestrator::{ExitNotifier, GroupPolicy};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::rc::Rc;

/// Transition props a rendered child carries into its own machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildProps {
    /// Requested presence (`in`).
    pub present: bool,
    pub appear: bool,
    pub enter: bool,
    pub exit: bool,
    pub unmount_on_exit: Option<bool>,
    /// Emitted as part of the group's very first render.
    pub mounting: bool,
    pub lifecycle: Lifecycle,
}

impl ChildProps {
    /// Combine a record's directive with the group defaults and the child's
    /// own overrides.
    pub fn resolve<K, T>(record: &ChildRecord<K, T>, policy: &GroupPolicy) -> Self {
        let ChildOverrides {
            appear,
            enter,
            exit,
            unmount_on_exit,
        } = record.overrides;
        Self {
            present: record.directive.present,
            appear: appear.unwrap_or(policy.appear),
            enter: enter.unwrap_or(policy.enter),
            exit: record.directive.exit && exit.unwrap_or(policy.exit),
            unmount_on_exit: unmount_on_exit.or(policy.unmount_on_exit),
            mounting: record.directive.appear,
            lifecycle: record.lifecycle(),
        }
    }

    /// Apply these props to a machine builder.
    ///
    /// A child mounted after the group's first render enters rather than
    /// appears, so its `enter` flag decides whether its mount is animated.
    pub fn configure(&self, builder: TransitionBuilder) -> TransitionBuilder {
        let appear = if self.mounting { self.appear } else { self.enter };
        let builder = builder
            .present(self.present)
            .appear(appear)
            .enter(self.enter)
            .exit(self.exit)
            .mounting(self.mounting);
        match self.unmount_on_exit {
            Some(unmount_on_exit) => builder.unmount_on_exit(unmount_on_exit),
            None => builder,
        }
    }
}

/// One entry of an emitted mapping.
pub struct RenderedChild<K, T> {
    pub key: K,
    pub element: Rc<T>,
    pub props: ChildProps,
    /// Call once the child's exit has finished.
    pub on_exited: ExitNotifier<K, T>,
}

impl<K: Clone, T> Clone for RenderedChild<K, T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            element: Rc::clone(&self.element),
            props: self.props,
            on_exited: self.on_exited.clone(),
        }
    }
}

impl<K: Debug, T> Debug for RenderedChild<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderedChild")
            .field("key", &self.key)
            .field("props", &self.props)
            .finish_non_exhaustive()
    }
}

/// Receives every mapping the group emits.
pub trait Renderer<K, T> {
    fn render(&self, children: &[RenderedChild<K, T>]) -> Result<(), TransitionError>;
}

impl<K, T, F> Renderer<K, T> for F
where
    F: Fn(&[RenderedChild<K, T>]) -> Result<(), TransitionError>,
{
    fn render(&self, children: &[RenderedChild<K, T>]) -> Result<(), TransitionError> {
        self(children)
    }
}

/// Forwards only the first rendered child, or nothing when the mapping is
/// empty.
///
/// For single-child use: swapping one keyed child for another keeps at most
/// one on screen.
pub struct FirstChild<R> {
    inner: R,
}

impl<R> FirstChild<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<K, T, R: Renderer<K, T>> Renderer<K, T> for FirstChild<R> {
    fn render(&self, children: &[RenderedChild<K, T>]) -> Result<(), TransitionError> {
        let selected = &children[..children.len().min(1)];
        self.inner.render(selected)
    }
}
