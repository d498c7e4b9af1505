//! Single element transition state machine.

use crate::builder::ConfigurationError;
use crate::core::{Phase, StateChange, TransitionHistory, TransitionState};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::transition::callbacks::{Hook, TransitionCallbacks};
use crate::transition::config::TransitionConfig;
use chrono::Utc;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

/// Listener handed a completion token at the start of every animated phase.
///
/// Lets the host report the end of a phase itself (for example when a CSS
/// transition ends) instead of, or in addition to, waiting for the timeout.
pub type EndListener = Rc<dyn Fn(Phase, PhaseCompletion)>;

/// The phase currently in flight.
#[derive(Clone, Copy, Debug)]
struct ActivePhase {
    phase: Phase,
    appearing: bool,
}

struct MachineCore {
    state: TransitionState,
    /// Last requested presence; `config.present` keeps the initial one.
    present: bool,
    config: TransitionConfig,
    callbacks: TransitionCallbacks,
    end_listener: Option<EndListener>,
    scheduler: Rc<dyn Scheduler>,
    generation: u64,
    pending: Option<TimerHandle>,
    active: Option<ActivePhase>,
    history: TransitionHistory,
    torn_down: bool,
}

impl MachineCore {
    /// Invalidate everything scheduled for the current phase.
    fn cancel_pending(&mut self) {
        self.generation += 1;
        self.active = None;
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn set_state(&mut self, to: TransitionState) {
        let from = self.state;
        if from == to {
            return;
        }
        trace!(%from, %to, generation = self.generation, "transition state change");
        let limit = self.config.history_limit;
        self.history.push_bounded(
            StateChange {
                from,
                to,
                timestamp: Utc::now(),
                generation: self.generation,
            },
            limit,
        );
        self.state = to;
    }

    fn exit_terminal(&self) -> TransitionState {
        if self.config.unmount_on_exit {
            TransitionState::Unmounted
        } else {
            TransitionState::Exited
        }
    }

    /// Move to `Exited`, then on to `Unmounted` when configured to.
    fn settle_exit(&mut self) {
        self.set_state(TransitionState::Exited);
        let terminal = self.exit_terminal();
        self.set_state(terminal);
    }
}

/// Shared handle used by the machine, its timers and completion tokens.
#[derive(Clone)]
struct Shared(Rc<RefCell<MachineCore>>);

impl Shared {
    /// Fire `hook` if `generation` is still current.
    ///
    /// Returns whether the phase is still current after the callback ran;
    /// callbacks may reverse the transition or tear the machine down.
    fn fire(&self, generation: u64, hook: Hook, appearing: bool) -> bool {
        let callback = {
            let core = self.0.borrow();
            if core.generation != generation || core.torn_down {
                return false;
            }
            core.callbacks.get(hook)
        };
        if let Some(callback) = callback {
            trace!(hook = hook.name(), appearing, "firing lifecycle callback");
            callback(appearing);
        }
        let core = self.0.borrow();
        core.generation == generation && !core.torn_down
    }

    fn fire_all(&self, generation: u64, hooks: [Hook; 3], appearing: bool) {
        for hook in hooks {
            if !self.fire(generation, hook, appearing) {
                return;
            }
        }
    }

    fn perform_enter(&self, appearing: bool) {
        let (generation, animate, phase) = {
            let mut core = self.0.borrow_mut();
            core.cancel_pending();
            if core.state == TransitionState::Unmounted {
                // Mount before entering.
                core.set_state(TransitionState::Exited);
            }
            let phase = if appearing { Phase::Appear } else { Phase::Enter };
            let animate = appearing || core.config.enter;
            if animate {
                core.set_state(TransitionState::Entering);
                core.active = Some(ActivePhase { phase, appearing });
            } else {
                core.set_state(TransitionState::Entered);
            }
            (core.generation, animate, phase)
        };
        debug!(%phase, animate, generation, "enter sequence started");

        if !animate {
            self.fire_all(
                generation,
                [Hook::Enter, Hook::Entering, Hook::Entered],
                appearing,
            );
            return;
        }

        if self.fire(generation, Hook::Enter, appearing)
            && self.fire(generation, Hook::Entering, appearing)
        {
            self.await_completion(generation, phase);
        }
    }

    fn perform_exit(&self) {
        let (generation, animate) = {
            let mut core = self.0.borrow_mut();
            core.cancel_pending();
            let animate = core.config.exit;
            if animate {
                core.set_state(TransitionState::Exiting);
                core.active = Some(ActivePhase {
                    phase: Phase::Exit,
                    appearing: false,
                });
            } else {
                core.settle_exit();
            }
            (core.generation, animate)
        };
        debug!(phase = %Phase::Exit, animate, generation, "exit sequence started");

        if !animate {
            self.fire_all(generation, [Hook::Exit, Hook::Exiting, Hook::Exited], false);
            return;
        }

        if self.fire(generation, Hook::Exit, false) && self.fire(generation, Hook::Exiting, false)
        {
            self.await_completion(generation, Phase::Exit);
        }
    }

    /// Arm the phase timeout and hand the end listener its token.
    fn await_completion(&self, generation: u64, phase: Phase) {
        let listener = {
            let mut core = self.0.borrow_mut();
            if core.generation != generation {
                return;
            }
            if let Some(delay) = core.config.timeout.for_phase(phase) {
                let weak = Rc::downgrade(&self.0);
                let handle = core.scheduler.after(
                    delay,
                    Box::new(move || {
                        if let Some(core) = weak.upgrade() {
                            Shared(core).complete(generation);
                        }
                    }),
                );
                core.pending = Some(handle);
                trace!(%phase, ?delay, generation, "phase timer armed");
            }
            core.end_listener.clone()
        };

        if let Some(listener) = listener {
            listener(
                phase,
                PhaseCompletion {
                    core: Rc::downgrade(&self.0),
                    generation,
                    phase,
                },
            );
        }
    }

    /// Finish the phase started at `generation`. Stale signals are ignored.
    fn complete(&self, generation: u64) {
        let (hook, appearing) = {
            let mut core = self.0.borrow_mut();
            if core.generation != generation || core.torn_down {
                trace!(
                    generation,
                    current = core.generation,
                    "stale phase completion ignored"
                );
                return;
            }
            let Some(active) = core.active else {
                return;
            };
            // Retire the timer or listener that did not win.
            core.cancel_pending();
            let hook = match core.state {
                TransitionState::Entering => {
                    core.set_state(TransitionState::Entered);
                    Hook::Entered
                }
                TransitionState::Exiting => {
                    core.settle_exit();
                    Hook::Exited
                }
                _ => return,
            };
            debug!(phase = %active.phase, state = %core.state, "phase completed");
            (hook, active.appearing)
        };

        let callback = self.0.borrow().callbacks.get(hook);
        if let Some(callback) = callback {
            trace!(hook = hook.name(), appearing, "firing lifecycle callback");
            callback(appearing);
        }
    }

    fn teardown(&self) {
        if let Ok(mut core) = self.0.try_borrow_mut() {
            if !core.torn_down {
                core.cancel_pending();
                core.torn_down = true;
                trace!(state = %core.state, "transition machine torn down");
            }
        }
    }
}

/// Token reporting the end of one animated phase.
///
/// Calling [`done`](Self::done) after the phase was superseded, completed by
/// its timeout, or the machine was dropped does nothing.
#[derive(Clone)]
pub struct PhaseCompletion {
    core: Weak<RefCell<MachineCore>>,
    generation: u64,
    phase: Phase,
}

impl PhaseCompletion {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the phase this token belongs to is still in flight.
    pub fn is_current(&self) -> bool {
        self.core.upgrade().is_some_and(|core| {
            let core = core.borrow();
            core.generation == self.generation && core.active.is_some() && !core.torn_down
        })
    }

    pub fn done(&self) {
        if let Some(core) = self.core.upgrade() {
            Shared(core).complete(self.generation);
        }
    }
}

impl fmt::Debug for PhaseCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseCompletion")
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Transition state machine for one element.
///
/// Driven by [`update_presence`](Self::update_presence). Phase completions
/// arrive through the injected scheduler or an end listener. Every new
/// phase bumps the generation counter, so a timer or completion token from
/// a superseded phase is a no-op when it eventually fires.
///
/// Dropping the machine tears it down: pending timers are cancelled and no
/// callback fires afterwards.
///
/// # Example
///
/// ```rust
/// use transition_group::builder::TransitionBuilder;
/// use transition_group::core::TransitionState;
/// use transition_group::scheduler::ManualScheduler;
/// use std::rc::Rc;
/// use std::time::Duration;
///
/// let clock = ManualScheduler::new();
/// let machine = TransitionBuilder::new()
///     .timeout(Duration::from_millis(100))
///     .build(Rc::new(clock.clone()))
///     .unwrap();
/// assert_eq!(machine.state(), TransitionState::Exited);
///
/// machine.update_presence(true);
/// assert_eq!(machine.state(), TransitionState::Entering);
///
/// clock.advance(Duration::from_millis(100));
/// assert_eq!(machine.state(), TransitionState::Entered);
/// ```
pub struct TransitionMachine {
    shared: Shared,
}

impl TransitionMachine {
    /// Create a machine and run its mount behaviour.
    ///
    /// With `present && appear` the appear sequence starts before this
    /// returns, so `on_enter` and `on_entering` may already have fired.
    pub fn new(
        config: TransitionConfig,
        callbacks: TransitionCallbacks,
        end_listener: Option<EndListener>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Result<Self, ConfigurationError> {
        config.check(end_listener.is_some())?;

        let state = initial_state(&config);
        let mount_phase = config.mount_phase();
        let machine = Self {
            shared: Shared(Rc::new(RefCell::new(MachineCore {
                state,
                present: config.present,
                config,
                callbacks,
                end_listener,
                scheduler,
                generation: 0,
                pending: None,
                active: None,
                history: TransitionHistory::new(),
                torn_down: false,
            }))),
        };
        debug!(%state, ?mount_phase, "transition machine created");

        if let Some(phase) = mount_phase {
            machine.shared.perform_enter(phase == Phase::Appear);
        }
        Ok(machine)
    }

    /// Request presence. Only transitions the current direction does not
    /// already cover do anything:
    ///
    /// - `true` while `Exiting`, `Exited` or `Unmounted` starts an enter.
    /// - `false` while `Entering` or `Entered` starts an exit.
    /// - Anything else is a no-op; timers keep running untouched.
    pub fn update_presence(&self, present: bool) {
        let state = {
            let mut core = self.shared.0.borrow_mut();
            if core.torn_down {
                return;
            }
            core.present = present;
            core.state
        };

        match (present, state) {
            (
                true,
                TransitionState::Exiting | TransitionState::Exited | TransitionState::Unmounted,
            ) => self.shared.perform_enter(false),
            (false, TransitionState::Entering | TransitionState::Entered) => {
                self.shared.perform_exit()
            }
            _ => trace!(present, %state, "presence unchanged, nothing to do"),
        }
    }

    pub fn state(&self) -> TransitionState {
        self.shared.0.borrow().state
    }

    /// Last requested presence.
    pub fn is_present(&self) -> bool {
        self.shared.0.borrow().present
    }

    /// Whether the host should render the element at all.
    pub fn is_visible(&self) -> bool {
        self.state().is_visible()
    }

    pub fn generation(&self) -> u64 {
        self.shared.0.borrow().generation
    }

    pub fn has_pending_timer(&self) -> bool {
        self.shared.0.borrow().pending.is_some()
    }

    /// Phase currently in flight, if any.
    pub fn active_phase(&self) -> Option<Phase> {
        self.shared.0.borrow().active.map(|active| active.phase)
    }

    pub fn config(&self) -> TransitionConfig {
        self.shared.0.borrow().config.clone()
    }

    pub fn history(&self) -> TransitionHistory {
        self.shared.0.borrow().history.clone()
    }

    /// Cancel any pending timer and stop reacting to input.
    pub fn teardown(&self) {
        self.shared.teardown();
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.0.borrow().torn_down
    }
}

impl Drop for TransitionMachine {
    fn drop(&mut self) {
        self.shared.teardown();
    }
}

impl fmt::Debug for TransitionMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shared.0.try_borrow() {
            Ok(core) => f
                .debug_struct("TransitionMachine")
                .field("state", &core.state)
                .field("generation", &core.generation)
                .field("pending", &core.pending)
                .field("config", &core.config)
                .finish(),
            Err(_) => f.write_str("TransitionMachine { <busy> }"),
        }
    }
}

fn initial_state(config: &TransitionConfig) -> TransitionState {
    if config.present {
        if config.appear {
            TransitionState::Exited
        } else {
            TransitionState::Entered
        }
    } else if config.unmount_on_exit || config.mount_on_enter {
        TransitionState::Unmounted
    } else {
        TransitionState::Exited
    }
}
