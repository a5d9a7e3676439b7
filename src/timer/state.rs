use serde::{Deserialize, Serialize};

/// Upper bound for a single phase, in seconds (15 minutes).
pub const MAX_PHASE_SECONDS: u32 = 900;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerPhase {
    pub id: String,
    pub label: String,
    pub duration_seconds: u32,
}

impl TimerPhase {
    pub fn new(id: impl Into<String>, label: impl Into<String>, duration_seconds: u32) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            duration_seconds: duration_seconds.min(MAX_PHASE_SECONDS),
        }
    }
}

pub fn default_phases() -> [TimerPhase; 2] {
    [
        TimerPhase::new("focus", "WISDOM", 10 * 60),
        TimerPhase::new("rest", "MEDITATION", 5 * 60),
    ]
}

/// Which of the two phases is selected.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PhaseSlot {
    #[default]
    First,
    Second,
}

impl PhaseSlot {
    pub fn index(self) -> usize {
        match self {
            PhaseSlot::First => 0,
            PhaseSlot::Second => 1,
        }
    }

    pub fn next(self) -> Self {
        match self {
            PhaseSlot::First => PhaseSlot::Second,
            PhaseSlot::Second => PhaseSlot::First,
        }
    }
}

/// Running state of a session. An idle session always shows the full duration
/// of its selected phase, so it carries no remaining counter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum SessionState {
    Idle { phase: PhaseSlot },
    Counting { phase: PhaseSlot, remaining: u32 },
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle {
            phase: PhaseSlot::default(),
        }
    }
}

/// What a single `tick` did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session was not counting; nothing changed.
    Ignored,
    /// Remaining time went down by one second.
    Counted,
    /// The exhausted phase handed over to the other phase.
    PhaseChanged { from: PhaseSlot, to: PhaseSlot },
    /// Repeat is off and the second phase finished; the session is back at rest.
    CycleCompleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSession {
    pub phases: [TimerPhase; 2],
    pub state: SessionState,
    pub repeat: bool,
}

impl Default for TimerSession {
    fn default() -> Self {
        Self::new(default_phases())
    }
}

impl TimerSession {
    pub fn new(phases: [TimerPhase; 2]) -> Self {
        Self {
            phases,
            state: SessionState::default(),
            repeat: true,
        }
    }

    pub fn current_slot(&self) -> PhaseSlot {
        match self.state {
            SessionState::Idle { phase } | SessionState::Counting { phase, .. } => phase,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_slot().index()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SessionState::Counting { .. })
    }

    pub fn phase(&self, slot: PhaseSlot) -> &TimerPhase {
        &self.phases[slot.index()]
    }

    pub fn remaining_seconds(&self) -> u32 {
        match self.state {
            SessionState::Idle { phase } => self.phase(phase).duration_seconds,
            SessionState::Counting { remaining, .. } => remaining,
        }
    }

    /// Remaining seconds shown for `slot`: the live value for the selected
    /// phase, the full duration for the other one.
    pub fn display_seconds(&self, slot: PhaseSlot) -> u32 {
        if slot == self.current_slot() {
            self.remaining_seconds()
        } else {
            self.phase(slot).duration_seconds
        }
    }

    pub fn reset(&mut self) {
        self.state = SessionState::Idle {
            phase: PhaseSlot::First,
        };
    }

    /// Flip between counting and idle. An exhausted phase restarts the whole
    /// session from the first phase before flipping.
    pub fn start_pause(&mut self) {
        if self.remaining_seconds() == 0 {
            self.reset();
        }

        self.state = match self.state {
            SessionState::Idle { phase } => SessionState::Counting {
                phase,
                remaining: self.phase(phase).duration_seconds,
            },
            SessionState::Counting { phase, .. } => SessionState::Idle { phase },
        };
    }

    pub fn toggle_repeat(&mut self) -> bool {
        self.repeat = !self.repeat;
        self.repeat
    }

    /// Replace the phase whose id matches. Returns `false` for unknown ids.
    pub fn update_phase(&mut self, config: TimerPhase) -> bool {
        let Some(index) = self.phases.iter().position(|p| p.id == config.id) else {
            return false;
        };

        let duration = config.duration_seconds.min(MAX_PHASE_SECONDS);
        self.phases[index] = TimerPhase {
            duration_seconds: duration,
            ..config
        };

        // Keep the live counter within the (possibly shorter) new duration.
        if let SessionState::Counting { phase, remaining } = &mut self.state {
            if phase.index() == index {
                *remaining = (*remaining).min(duration);
            }
        }
        true
    }

    pub fn tick(&mut self) -> TickOutcome {
        let SessionState::Counting { phase, remaining } = self.state else {
            return TickOutcome::Ignored;
        };

        if remaining > 0 {
            self.state = SessionState::Counting {
                phase,
                remaining: remaining - 1,
            };
            return TickOutcome::Counted;
        }

        let next = phase.next();
        if !self.repeat && next == PhaseSlot::First {
            self.reset();
            return TickOutcome::CycleCompleted;
        }

        self.state = SessionState::Counting {
            phase: next,
            remaining: self.phase(next).duration_seconds,
        };
        TickOutcome::PhaseChanged {
            from: phase,
            to: next,
        }
    }
}

/// Format seconds as `MM:SS`.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
