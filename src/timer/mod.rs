pub mod controller;
pub mod state;

pub use controller::{PhaseView, TimerController, TimerEvent, TimerSnapshot};
pub use state::{
    default_phases, format_clock, PhaseSlot, SessionState, TickOutcome, TimerPhase, TimerSession,
    MAX_PHASE_SECONDS,
};
