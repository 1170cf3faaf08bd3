//! Tick-driven state machines for Gatelink.
//!
//! Two building blocks, both advanced by an external frame loop:
//!
//! - [`FiniteState`] - a single state cell with current/next/prev values,
//!   an "entering" flag, a cooperative timeout and a forced-transition latch.
//! - [`StateManager`] - a [`FiniteState`] plus a table of per-state
//!   [`StateHandler`]s that are invoked automatically on every tick.
//!
//! Nothing here owns a clock. Each `tick` receives the frame delta, so a
//! test can drive hours of simulated time in a loop.
//!
//! ```text
//! transit(B) ──→ [pending B] ──tick──→ current = B, entering = true
//!                                   ──tick──→ entering = false, elapsed += dt
//!                                   ──tick──→ ... elapsed ≥ timeout → is_timeout
//! ```

mod finite;
mod manager;

pub use finite::FiniteState;
pub use manager::{FnHandler, StateHandler, StateManager};
