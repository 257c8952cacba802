/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Session state machine.
//!
//! The session moves through five states. Every transition the session makes
//! is checked against [`SessionState::can_transition_to`]; a transport close
//! returns any state to [`SessionState::Disconnected`].

use std::fmt;

/// Lifecycle state of a FIX session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No logon exchanged on the current connection, or no connection.
    #[default]
    Disconnected,
    /// Logon sent (initiator) or received (acceptor), not yet completed.
    LogonPending,
    /// Logged on and in sequence.
    Active,
    /// Logged on, waiting for the counterparty to fill a gap.
    ResendInProgress,
    /// Logout sent, waiting for the counterparty's Logout.
    LogoutPending,
}

impl SessionState {
    /// Returns true if the transition from `self` to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Disconnected, LogonPending)
                | (LogonPending, Active)
                | (Active, ResendInProgress)
                | (ResendInProgress, Active)
                | (Active, LogoutPending)
                | (ResendInProgress, LogoutPending)
                | (_, Disconnected)
        )
    }

    /// Returns true once the logon handshake has completed.
    #[must_use]
    pub const fn is_logged_on(self) -> bool {
        matches!(self, Self::Active | Self::ResendInProgress)
    }

    /// Returns the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::LogonPending => "LOGON_PENDING",
            Self::Active => "ACTIVE",
            Self::ResendInProgress => "RESEND_IN_PROGRESS",
            Self::LogoutPending => "LOGOUT_PENDING",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_transitions() {
        use SessionState::*;
        assert!(Disconnected.can_transition_to(LogonPending));
        assert!(LogonPending.can_transition_to(Active));
        assert!(Active.can_transition_to(ResendInProgress));
        assert!(ResendInProgress.can_transition_to(Active));
        assert!(Active.can_transition_to(LogoutPending));
        assert!(ResendInProgress.can_transition_to(LogoutPending));

        assert!(!Disconnected.can_transition_to(Active));
        assert!(!LogonPending.can_transition_to(ResendInProgress));
        assert!(!LogoutPending.can_transition_to(Active));
    }

    #[test]
    fn test_any_state_can_disconnect() {
        use SessionState::*;
        for state in [Disconnected, LogonPending, Active, ResendInProgress, LogoutPending] {
            assert!(state.can_transition_to(Disconnected), "{}", state);
        }
    }

    #[test]
    fn test_is_logged_on() {
        assert!(SessionState::Active.is_logged_on());
        assert!(SessionState::ResendInProgress.is_logged_on());
        assert!(!SessionState::LogonPending.is_logged_on());
        assert!(!SessionState::LogoutPending.is_logged_on());
        assert_eq!(SessionState::default(), SessionState::Disconnected);
    }
}
