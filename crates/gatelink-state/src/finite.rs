//! The state cell: one current value, one pending value, one timer.

use std::fmt;
use std::time::Duration;

/// A hierarchical, timer-aware state cell.
///
/// Transitions are *requested* with [`transit`](Self::transit) and only
/// *committed* by the next [`tick`](Self::tick). That split is what makes a
/// tick-driven machine readable: a handler can ask for a new state from
/// anywhere during a frame, and everybody observes the change at the same
/// point (the start of the next frame).
///
/// ## Timeouts
///
/// Every transition carries an optional timeout. After the transition is
/// committed, each tick adds its `dt` to the elapsed time; once the elapsed
/// time reaches the timeout, [`is_timeout`](Self::is_timeout) turns `true`
/// and stays `true` until the next committed transition. A zero timeout
/// never fires.
///
/// ## Forced transitions
///
/// [`force_transit`](Self::force_transit) latches the pending state. Any
/// ordinary `transit` call made before the next tick is ignored, so a forced
/// jump (e.g. "abort everything") can't be overwritten by logic that runs
/// later in the same frame.
#[derive(Clone)]
pub struct FiniteState<S> {
    current: S,
    next: Option<S>,
    prev: Option<S>,
    /// `false` until the initial pending transition has been committed.
    started: bool,
    elapsed: Duration,
    timeout: Duration,
    entering: bool,
    timed_out: bool,
    forced: bool,
}

impl<S: Copy + Eq> FiniteState<S> {
    /// Creates a cell whose first tick enters `init` (with no timeout).
    ///
    /// Before that first tick, [`current`](Self::current) already reports
    /// `init` so callers never see an uninitialized value.
    pub fn new(init: S) -> Self {
        Self::new_with_timeout(init, Duration::ZERO)
    }

    /// Creates a cell whose first tick enters `init` with the given timeout.
    pub fn new_with_timeout(init: S, timeout: Duration) -> Self {
        Self {
            current: init,
            next: Some(init),
            prev: None,
            started: false,
            elapsed: Duration::ZERO,
            timeout,
            entering: false,
            timed_out: false,
            forced: false,
        }
    }

    /// Requests a transition to `next` with no timeout.
    ///
    /// Returns `false` (and does nothing) while a forced transition is
    /// pending. Calling this several times before a tick keeps only the
    /// last target.
    pub fn transit(&mut self, next: S) -> bool {
        self.transit_timed(next, Duration::ZERO)
    }

    /// Requests a transition to `next`; once entered, the state times out
    /// after `timeout` (zero = never).
    pub fn transit_timed(&mut self, next: S, timeout: Duration) -> bool {
        if self.forced {
            return false;
        }
        self.next = Some(next);
        self.timeout = timeout;
        true
    }

    /// Requests a transition that later `transit` calls cannot override
    /// until it has been committed by [`tick`](Self::tick).
    pub fn force_transit(&mut self, next: S) {
        self.next = Some(next);
        self.timeout = Duration::ZERO;
        self.forced = true;
    }

    /// Advances the cell by one frame and returns the (possibly new) current
    /// state.
    ///
    /// If a transition is pending it is committed and `dt` is *not* counted
    /// towards the new state's timer. Otherwise `dt` is accumulated and the
    /// timeout flag is raised once the window has elapsed.
    pub fn tick(&mut self, dt: Duration) -> S {
        match self.next.take() {
            Some(next) => {
                self.prev = self.started.then_some(self.current);
                self.current = next;
                self.started = true;
                self.elapsed = Duration::ZERO;
                self.entering = true;
                self.timed_out = false;
                self.forced = false;
            }
            None => {
                self.entering = false;
                self.elapsed = self.elapsed.saturating_add(dt);
                if !self.timeout.is_zero() && self.elapsed >= self.timeout {
                    self.timed_out = true;
                }
            }
        }
        self.current
    }

    /// The state the cell is in.
    pub fn current(&self) -> S {
        self.current
    }

    /// The pending state, if a transition has been requested but not yet
    /// committed.
    pub fn next(&self) -> Option<S> {
        self.next
    }

    /// The state before the last committed transition.
    pub fn prev(&self) -> Option<S> {
        self.prev
    }

    /// `true` only on the tick that committed the current state.
    pub fn is_entering(&self) -> bool {
        self.entering
    }

    /// `true` once the current state has outlived its timeout.
    pub fn is_timeout(&self) -> bool {
        self.timed_out
    }

    /// `true` while a forced transition is waiting to be committed.
    pub fn is_forced(&self) -> bool {
        self.forced
    }

    /// Time spent in the current state since it was entered.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The timeout window of the current (or pending) state.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<S: fmt::Debug> fmt::Debug for FiniteState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FiniteState")
            .field("current", &self.current)
            .field("next", &self.next)
            .field("prev", &self.prev)
            .field("elapsed", &self.elapsed)
            .field("timeout", &self.timeout)
            .field("entering", &self.entering)
            .field("timed_out", &self.timed_out)
            .field("forced", &self.forced)
            .finish()
    }
}
