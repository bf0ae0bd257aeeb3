//! Dashboard UI State
//!
//! Celebration overlays, the count-increased notice, the countdown to the
//! next poll and the last user-visible error. [`DashboardState`] is a plain
//! reducer; [`DashboardRuntime`] runs it and owns the timers.

mod celebration;
mod countdown;
mod runtime;
mod state;

pub use celebration::{ActiveCelebration, Celebration};
pub use countdown::Countdown;
pub use runtime::{DashboardEvent, DashboardRuntime};
pub use state::{Action, DashboardState, Effect, Notice, TimerId, COUNT_INCREASED, GENERIC_ERROR};
