//! Poll cycle: fetch, commit, publish.

pub mod engine;
pub mod history;
pub mod simulate;
pub mod state;

pub use engine::{PollError, PollEvent, Poller};
pub use history::History;
pub use simulate::{SimulationError, SimulationMode};
pub use state::{CycleOutcome, CycleReport, PollState};
