//! Lifecycle callbacks.

use std::fmt;
use std::rc::Rc;

/// Lifecycle callback. The argument is `true` when the enter is the
/// appear variant that runs on the initial mount; always `false` for exit
/// callbacks.
pub type Callback = Rc<dyn Fn(bool)>;

/// The six points in a transition where user code is called.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Hook {
    Enter,
    Entering,
    Entered,
    Exit,
    Exiting,
    Exited,
}

impl Hook {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Enter => "on_enter",
            Self::Entering => "on_entering",
            Self::Entered => "on_entered",
            Self::Exit => "on_exit",
            Self::Exiting => "on_exiting",
            Self::Exited => "on_exited",
        }
    }
}

/// Callbacks fired by a transition machine. Unset hooks are skipped.
#[derive(Clone, Default)]
pub struct TransitionCallbacks {
    pub on_enter: Option<Callback>,
    pub on_entering: Option<Callback>,
    pub on_entered: Option<Callback>,
    pub on_exit: Option<Callback>,
    pub on_exiting: Option<Callback>,
    pub on_exited: Option<Callback>,
}

impl TransitionCallbacks {
    pub fn get(&self, hook: Hook) -> Option<Callback> {
        let slot = match hook {
            Hook::Enter => &self.on_enter,
            Hook::Entering => &self.on_entering,
            Hook::Entered => &self.on_entered,
            Hook::Exit => &self.on_exit,
            Hook::Exiting => &self.on_exiting,
            Hook::Exited => &self.on_exited,
        };
        slot.clone()
    }

    pub(crate) fn slot_mut(&mut self, hook: Hook) -> &mut Option<Callback> {
        match hook {
            Hook::Enter => &mut self.on_enter,
            Hook::Entering => &mut self.on_entering,
            Hook::Entered => &mut self.on_entered,
            Hook::Exit => &mut self.on_exit,
            Hook::Exiting => &mut self.on_exiting,
            Hook::Exited => &mut self.on_exited,
        }
    }

    /// Run `extra` after whatever is already registered for `hook`.
    pub fn chain(&mut self, hook: Hook, extra: Callback) {
        let slot = self.slot_mut(hook);
        let current = slot.take();
        let chained: Callback = match current {
            Some(existing) => Rc::new(move |appearing: bool| {
                existing(appearing);
                extra(appearing);
            }),
            None => extra,
        };
        *slot = Some(chained);
    }
}

impl fmt::Debug for TransitionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionCallbacks")
            .field("on_enter", &self.on_enter.is_some())
            .field("on_entering", &self.on_entering.is_some())
            .field("on_entered", &self.on_entered.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .field("on_exiting", &self.on_exiting.is_some())
            .field("on_exited", &self.on_exited.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn chain_runs_existing_callback_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut callbacks = TransitionCallbacks::default();

        let first = log.clone();
        callbacks.on_exited = Some(Rc::new(move |_: bool| first.borrow_mut().push("user")));
        let second = log.clone();
        callbacks.chain(Hook::Exited, Rc::new(move |_: bool| second.borrow_mut().push("group")));

        if let Some(callback) = callbacks.get(Hook::Exited) {
            callback(false);
        }
        assert_eq!(*log.borrow(), vec!["user", "group"]);
    }

    #[test]
    fn chain_on_empty_slot_installs_callback() {
        let mut callbacks = TransitionCallbacks::default();
        callbacks.chain(Hook::Entered, Rc::new(|_: bool| {}));

        assert!(callbacks.get(Hook::Entered).is_some());
        assert!(callbacks.get(Hook::Enter).is_none());
    }
}
