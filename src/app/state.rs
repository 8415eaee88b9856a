// SPDX-License-Identifier: GPL-3.0-only

//! Capture session state
//!
//! [`CaptureState`] is the only state the UI sees. The controller owns the
//! authoritative copy and publishes a clone after every mutation.

use crate::backends::permission::AuthorizationStatus;
use crate::errors::CaptureErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

/// Lifecycle phase, derived from the state flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Nothing attempted yet
    Idle,
    /// Waiting for the user or the system to answer an access request
    Authorizing,
    /// Access refused; terminal until restart
    Denied,
    /// Input and output attached, not streaming
    Configured,
    /// Streaming preview frames
    Running,
    /// Photo captured, session stopped
    Taken,
    /// Captured photo persisted
    Saved,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Authorizing => "authorizing",
            SessionPhase::Denied => "denied",
            SessionPhase::Configured => "configured",
            SessionPhase::Running => "running",
            SessionPhase::Taken => "taken",
            SessionPhase::Saved => "saved",
        };
        f.write_str(name)
    }
}

/// Snapshot of the capture session as seen by the UI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureState {
    pub authorization: AuthorizationStatus,
    /// An access request is in flight
    pub requesting_access: bool,
    /// Camera input and photo output are attached
    pub is_configured: bool,
    /// The session is streaming frames
    pub is_running: bool,
    /// A photo was captured and the session stopped
    pub is_taken: bool,
    /// The captured photo is in the photo library
    pub is_saved: bool,
    /// The authorization-denied alert is raised
    pub alert: bool,
    /// Encoded bytes of the captured photo; empty until a capture completes
    pub pending_image: Arc<[u8]>,
    /// Where the last save landed
    pub saved_path: Option<PathBuf>,
    /// Kind of the most recent failed operation
    pub last_error: Option<CaptureErrorKind>,
}

impl CaptureState {
    pub fn phase(&self) -> SessionPhase {
        if self.alert || self.authorization == AuthorizationStatus::Denied {
            SessionPhase::Denied
        } else if self.requesting_access {
            SessionPhase::Authorizing
        } else if self.is_saved {
            SessionPhase::Saved
        } else if self.is_taken {
            SessionPhase::Taken
        } else if self.is_running {
            SessionPhase::Running
        } else if self.is_configured {
            SessionPhase::Configured
        } else {
            SessionPhase::Idle
        }
    }

    /// taken ⇒ stopped, saved ⇒ taken with data, running ⇒ configured
    pub fn invariants_hold(&self) -> bool {
        (!self.is_taken || !self.is_running)
            && (!self.is_saved || (self.is_taken && !self.pending_image.is_empty()))
            && (!self.is_running || self.is_configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        let state = CaptureState::default();
        assert_eq!(state.phase(), SessionPhase::Idle);
        assert!(state.invariants_hold());
        assert!(state.pending_image.is_empty());
    }

    #[test]
    fn test_saved_without_data_violates_invariants() {
        let state = CaptureState {
            is_configured: true,
            is_taken: true,
            is_saved: true,
            ..Default::default()
        };
        assert!(!state.invariants_hold());
    }

    #[test]
    fn test_denied_overrides_other_phases() {
        let state = CaptureState {
            authorization: AuthorizationStatus::Denied,
            alert: true,
            ..Default::default()
        };
        assert_eq!(state.phase(), SessionPhase::Denied);
    }

    #[test]
    fn test_running_requires_configured() {
        let state = CaptureState {
            is_running: true,
            ..Default::default()
        };
        assert!(!state.invariants_hold());
    }
}
