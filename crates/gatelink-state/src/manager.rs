//! Declarative state machines: a [`FiniteState`] plus per-state handlers.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::time::Duration;

use crate::FiniteState;

/// Callbacks attached to one state of a [`StateManager`].
///
/// All methods default to no-ops, so a handler only implements the hooks
/// it cares about (the same shape as a game's `tick`/`on_player_*` hooks).
pub trait StateHandler<S> {
    /// Called on the tick that enters this state. `prev` is `None` for the
    /// very first state of the machine.
    fn on_enter(&mut self, _prev: Option<S>) {}

    /// Called on the tick that leaves this state, before the next state's
    /// `on_enter`.
    fn on_leave(&mut self, _next: S) {}

    /// Called on every tick while this state is current, including the
    /// entering tick.
    fn on_process(&mut self, _dt: Duration) {}
}

type EnterFn<S> = Box<dyn FnMut(Option<S>)>;
type LeaveFn<S> = Box<dyn FnMut(S)>;
type ProcessFn = Box<dyn FnMut(Duration)>;

/// A [`StateHandler`] assembled from closures.
///
/// ```rust
/// use gatelink_state::{FnHandler, StateManager};
/// use std::time::Duration;
///
/// let mut sm = StateManager::new(0u8)
///     .with_handler(0, FnHandler::new().on_process(|_dt| {}))
///     .with_handler(1, FnHandler::new().on_enter(|prev| assert_eq!(prev, Some(0))));
/// sm.tick(Duration::ZERO);
/// sm.transit(1);
/// sm.tick(Duration::ZERO);
/// ```
pub struct FnHandler<S> {
    enter: Option<EnterFn<S>>,
    leave: Option<LeaveFn<S>>,
    process: Option<ProcessFn>,
}

impl<S> FnHandler<S> {
    /// A handler with no callbacks.
    pub fn new() -> Self {
        Self {
            enter: None,
            leave: None,
            process: None,
        }
    }

    /// Sets the `on_enter` callback.
    pub fn on_enter(mut self, f: impl FnMut(Option<S>) + 'static) -> Self {
        self.enter = Some(Box::new(f));
        self
    }

    /// Sets the `on_leave` callback.
    pub fn on_leave(mut self, f: impl FnMut(S) + 'static) -> Self {
        self.leave = Some(Box::new(f));
        self
    }

    /// Sets the `on_process` callback.
    pub fn on_process(mut self, f: impl FnMut(Duration) + 'static) -> Self {
        self.process = Some(Box::new(f));
        self
    }
}

impl<S> Default for FnHandler<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateHandler<S> for FnHandler<S> {
    fn on_enter(&mut self, prev: Option<S>) {
        if let Some(f) = self.enter.as_mut() {
            f(prev);
        }
    }

    fn on_leave(&mut self, next: S) {
        if let Some(f) = self.leave.as_mut() {
            f(next);
        }
    }

    fn on_process(&mut self, dt: Duration) {
        if let Some(f) = self.process.as_mut() {
            f(dt);
        }
    }
}

/// A [`FiniteState`] that dispatches to per-state handlers on every tick.
///
/// On each [`tick`](Self::tick):
///
/// 1. the underlying cell is ticked;
/// 2. if a transition was committed, the previous state's `on_leave` runs,
///    then the new state's `on_enter`;
/// 3. the current state's `on_process` runs with the frame delta.
///
/// States without a handler are simply skipped.
pub struct StateManager<S> {
    state: FiniteState<S>,
    handlers: HashMap<S, Box<dyn StateHandler<S>>>,
    debug_key: Option<String>,
}

impl<S> StateManager<S>
where
    S: Copy + Eq + Hash + fmt::Debug,
{
    /// Creates a manager whose first tick enters `init`.
    pub fn new(init: S) -> Self {
        Self {
            state: FiniteState::new(init),
            handlers: HashMap::new(),
            debug_key: None,
        }
    }

    /// Creates a manager whose first tick enters `init` with a timeout.
    pub fn new_with_timeout(init: S, timeout: Duration) -> Self {
        Self {
            state: FiniteState::new_with_timeout(init, timeout),
            handlers: HashMap::new(),
            debug_key: None,
        }
    }

    /// Builder form of [`set_handler`](Self::set_handler).
    pub fn with_handler(
        mut self,
        state: S,
        handler: impl StateHandler<S> + 'static,
    ) -> Self {
        self.set_handler(state, handler);
        self
    }

    /// Installs a whole handler table at once. Existing entries for the
    /// same states are replaced; others are kept.
    pub fn with_handlers<I>(mut self, table: I) -> Self
    where
        I: IntoIterator<Item = (S, Box<dyn StateHandler<S>>)>,
    {
        self.handlers.extend(table);
        self
    }

    /// Installs (or replaces) the handler for `state`.
    pub fn set_handler(
        &mut self,
        state: S,
        handler: impl StateHandler<S> + 'static,
    ) -> &mut Self {
        self.handlers.insert(state, Box::new(handler));
        self
    }

    /// Removes the handler for `state`, returning whether one existed.
    pub fn remove_handler(&mut self, state: S) -> bool {
        self.handlers.remove(&state).is_some()
    }

    /// Logs every committed transition at debug level under this key.
    pub fn with_debug_key(mut self, key: impl Into<String>) -> Self {
        self.debug_key = Some(key.into());
        self
    }

    /// See [`FiniteState::transit`].
    pub fn transit(&mut self, next: S) -> bool {
        self.state.transit(next)
    }

    /// See [`FiniteState::transit_timed`].
    pub fn transit_timed(&mut self, next: S, timeout: Duration) -> bool {
        self.state.transit_timed(next, timeout)
    }

    /// See [`FiniteState::force_transit`].
    pub fn force_transit(&mut self, next: S) {
        self.state.force_transit(next);
    }

    /// Ticks the cell and runs the handlers. Returns the current state.
    pub fn tick(&mut self, dt: Duration) -> S {
        let current = self.state.tick(dt);

        if self.state.is_entering() {
            let prev = self.state.prev();
            if let Some(key) = self.debug_key.as_deref() {
                tracing::debug!(key, from = ?prev, to = ?current, "state transition");
            }
            if let Some(prev) = prev {
                if let Some(handler) = self.handlers.get_mut(&prev) {
                    handler.on_leave(current);
                }
            }
            if let Some(handler) = self.handlers.get_mut(&current) {
                handler.on_enter(prev);
            }
        }

        if let Some(handler) = self.handlers.get_mut(&current) {
            handler.on_process(dt);
        }

        current
    }

    /// The underlying state cell.
    pub fn state(&self) -> &FiniteState<S> {
        &self.state
    }

    pub fn current(&self) -> S {
        self.state.current()
    }

    pub fn prev(&self) -> Option<S> {
        self.state.prev()
    }

    pub fn next(&self) -> Option<S> {
        self.state.next()
    }

    pub fn is_entering(&self) -> bool {
        self.state.is_entering()
    }

    pub fn is_timeout(&self) -> bool {
        self.state.is_timeout()
    }

    pub fn elapsed(&self) -> Duration {
        self.state.elapsed()
    }
}
