//! Builder for constructing transition machines.

use crate::builder::error::ConfigurationError;
use crate::core::Phase;
use crate::scheduler::Scheduler;
use crate::transition::{
    EndListener, Hook, PhaseCompletion, Timeout, TransitionCallbacks, TransitionConfig,
    TransitionMachine,
};
use std::rc::Rc;

/// Builder for constructing transition machines with a fluent API.
///
/// Defaults: absent, no appear, enter and exit animated, no timeout.
#[derive(Clone, Default)]
pub struct TransitionBuilder {
    config: TransitionConfig,
    callbacks: TransitionCallbacks,
    end_listener: Option<EndListener>,
}

impl TransitionBuilder {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn from_config(config: TransitionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Requested presence at construction (`in`).
    pub fn present(mut self, present: bool) -> Self {
        self.config.present = present;
        self
    }

    pub fn appear(mut self, appear: bool) -> Self {
        self.config.appear = appear;
        self
    }

    pub fn enter(mut self, enter: bool) -> Self {
        self.config.enter = enter;
        self
    }

    pub fn exit(mut self, exit: bool) -> Self {
        self.config.exit = exit;
        self
    }

    /// Phase durations. A plain `Duration` applies to every phase.
    pub fn timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.config.timeout = timeout.into();
        self
    }

    pub fn mount_on_enter(mut self, mount_on_enter: bool) -> Self {
        self.config.mount_on_enter = mount_on_enter;
        self
    }

    pub fn unmount_on_exit(mut self, unmount_on_exit: bool) -> Self {
        self.config.unmount_on_exit = unmount_on_exit;
        self
    }

    /// Whether the initial enter is reported as an appearance.
    pub fn mounting(mut self, mounting: bool) -> Self {
        self.config.mounting = mounting;
        self
    }

    /// Cap on the state changes kept in the machine's history.
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    pub fn on_enter<F: Fn(bool) + 'static>(self, callback: F) -> Self {
        self.set(Hook::Enter, callback)
    }

    pub fn on_entering<F: Fn(bool) + 'static>(self, callback: F) -> Self {
        self.set(Hook::Entering, callback)
    }

    pub fn on_entered<F: Fn(bool) + 'static>(self, callback: F) -> Self {
        self.set(Hook::Entered, callback)
    }

    pub fn on_exit<F: Fn(bool) + 'static>(self, callback: F) -> Self {
        self.set(Hook::Exit, callback)
    }

    pub fn on_exiting<F: Fn(bool) + 'static>(self, callback: F) -> Self {
        self.set(Hook::Exiting, callback)
    }

    pub fn on_exited<F: Fn(bool) + 'static>(self, callback: F) -> Self {
        self.set(Hook::Exited, callback)
    }

    /// Replace all callbacks at once.
    pub fn callbacks(mut self, callbacks: TransitionCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Run `callback` after any `on_exited` callback already registered.
    pub fn notify_exited<F: Fn(bool) + 'static>(mut self, callback: F) -> Self {
        self.callbacks.chain(Hook::Exited, Rc::new(callback));
        self
    }

    /// Let the host report phase completion itself.
    ///
    /// With a timeout as well, whichever comes first completes the phase.
    pub fn add_end_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(Phase, PhaseCompletion) + 'static,
    {
        self.end_listener = Some(Rc::new(listener));
        self
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    /// Validate without building.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.config.check(self.end_listener.is_some())
    }

    /// Build the machine.
    /// Returns an error if an animated phase has no way to complete.
    pub fn build(
        self,
        scheduler: Rc<dyn Scheduler>,
    ) -> Result<TransitionMachine, ConfigurationError> {
        TransitionMachine::new(self.config, self.callbacks, self.end_listener, scheduler)
    }

    fn set<F: Fn(bool) + 'static>(mut self, hook: Hook, callback: F) -> Self {
        *self.callbacks.slot_mut(hook) = Some(Rc::new(callback));
        self
    }
}
