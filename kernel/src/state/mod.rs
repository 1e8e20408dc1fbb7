// Student Lifecycle State Machine
//
// Every student id moves through `Nonexistent -> Active -> Deleted`.
// Grade changes are `Active -> Active` self-transitions and `Deleted`
// is terminal. This module is pure and side-effect free.

use serde::Serialize;

/// Lifecycle state of a student id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StudentState {
    /// The id has never been issued.
    Nonexistent,

    /// The student has a live transcript.
    Active,

    /// The transcript was removed. The id is retired for good.
    Deleted,
}

/// Operations that drive a student through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentEvent {
    Enrolled,
    GradeRecorded,
    Withdrawn,
}

/// Errors produced during state transitions.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StateError {
    #[error("illegal state transition: cannot apply {event:?} while {state:?}")]
    IllegalTransition {
        state: StudentState,
        event: StudentEvent,
    },
}

impl StudentState {
    /// Apply a single event, returning the next state.
    pub fn apply(self, event: StudentEvent) -> Result<StudentState, StateError> {
        use StudentEvent::*;
        use StudentState::*;

        match (self, event) {
            (Nonexistent, Enrolled) => Ok(Active),
            (Active, GradeRecorded) => Ok(Active),
            (Active, Withdrawn) => Ok(Deleted),

            (state, event) => Err(StateError::IllegalTransition { state, event }),
        }
    }
}
