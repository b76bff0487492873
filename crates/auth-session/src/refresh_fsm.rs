//! Token refresh cycle state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │      Idle       │ (initial)
//! └────────┬────────┘
//!          │ RefreshRequested
//!          ▼
//! ┌─────────────────┐  RefreshFailed   ┌─────────────────┐
//! │   Refreshing    │ ───────────────► │    LoggedOut    │
//! └────────┬────────┘                  └────────┬────────┘
//!          │ RefreshSucceeded                   │ RefreshRequested
//!          ▼                                    │
//!        Idle  ◄──── (via Refreshing) ──────────┤
//!          ▲                                    │ SignedIn
//!          └────────────────────────────────────┘
//! ```
//!
//! A second `RefreshRequested` while `Refreshing` is rejected: concurrent
//! callers join the in-flight refresh instead of starting another.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub refresh_machine(Idle)

    Idle => {
        RefreshRequested => Refreshing
    },
    Refreshing => {
        RefreshSucceeded => Idle,
        RefreshFailed => LoggedOut
    },
    LoggedOut => {
        RefreshRequested => Refreshing,
        SignedIn => Idle
    }
}

pub use refresh_machine::Input as RefreshMachineInput;
pub use refresh_machine::State as RefreshMachineState;
pub use refresh_machine::StateMachine as RefreshMachine;

/// Refresh cycle state for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshState {
    /// No refresh running.
    Idle,
    /// A refresh network call is in flight.
    Refreshing,
    /// The last refresh failed and the session was cleared; no sign-in since.
    LoggedOut,
}

impl RefreshState {
    pub fn is_refreshing(&self) -> bool {
        matches!(self, RefreshState::Refreshing)
    }
}

impl From<&RefreshMachineState> for RefreshState {
    fn from(state: &RefreshMachineState) -> Self {
        match state {
            RefreshMachineState::Idle => RefreshState::Idle,
            RefreshMachineState::Refreshing => RefreshState::Refreshing,
            RefreshMachineState::LoggedOut => RefreshState::LoggedOut,
        }
    }
}
