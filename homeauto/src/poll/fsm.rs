//! Phases of one poll sequence

use serde::{Deserialize, Serialize};

/// Poll phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollPhase {
    /// Nothing in flight
    Idle,

    /// Login request in flight
    Authenticating,

    /// Device list request in flight
    ListingDevices,

    /// Value request in flight
    FetchingValue,
}

/// Poll event
#[derive(Debug, Clone)]
pub enum PollEvent {
    Login,
    ListDevices,
    FetchValue,
    Succeeded,
    Failed(String),
}

/// Poll FSM
#[derive(Debug, Clone)]
pub struct PollFsm {
    phase: PollPhase,
    error: Option<String>,
    failure_streak: u32,
}

impl PollFsm {
    pub fn new() -> Self {
        Self {
            phase: PollPhase::Idle,
            error: None,
            failure_streak: 0,
        }
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    /// Error of the last failed request, cleared by the next success
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Consecutive failed requests
    pub fn failure_streak(&self) -> u32 {
        self.failure_streak
    }

    pub fn is_idle(&self) -> bool {
        self.phase == PollPhase::Idle
    }

    /// Process an event and transition phase
    pub fn process(&mut self, event: PollEvent) -> Result<(), String> {
        let next = match (self.phase, &event) {
            (PollPhase::Idle, PollEvent::Login) => PollPhase::Authenticating,
            (PollPhase::Idle, PollEvent::ListDevices) => PollPhase::ListingDevices,
            (PollPhase::Idle, PollEvent::FetchValue) => PollPhase::FetchingValue,

            (phase, PollEvent::Succeeded) if phase != PollPhase::Idle => {
                self.error = None;
                self.failure_streak = 0;
                PollPhase::Idle
            }
            (phase, PollEvent::Failed(err)) if phase != PollPhase::Idle => {
                self.error = Some(err.clone());
                self.failure_streak += 1;
                PollPhase::Idle
            }

            (phase, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", phase, event));
            }
        };

        self.phase = next;
        Ok(())
    }
}

impl Default for PollFsm {
    fn default() -> Self {
        Self::new()
    }
}
