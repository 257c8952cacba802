/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Application callbacks.
//!
//! `to_admin`, `to_app` and `from_admin` run while the session is locked and
//! must not call back into the same [`Session`](crate::Session). `on_logon`,
//! `on_logout` and `from_app` run after the lock is released, so replying
//! from inside them is fine.

use async_trait::async_trait;
use ferrofix_core::message::Message;
use ferrofix_core::session_id::SessionId;
use ferrofix_core::types::{BusinessRejectReason, SessionRejectReason};
use thiserror::Error;

/// Returned by `to_admin`/`to_app` to stop a message from being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Error)]
#[error("do not send")]
pub struct DoNotSend;

/// Why the application refused an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Answer with a session-level Reject(3).
    Session {
        /// SessionRejectReason(373).
        reason: SessionRejectReason,
        /// RefTagID(371).
        ref_tag: Option<u32>,
        /// Text(58).
        text: Option<String>,
    },
    /// Answer with a BusinessMessageReject(j).
    Business {
        /// BusinessRejectReason(380).
        reason: BusinessRejectReason,
        /// BusinessRejectRefID(379).
        ref_id: Option<String>,
        /// Text(58).
        text: Option<String>,
    },
}

impl RejectReason {
    /// Session-level reject with no tag reference.
    #[must_use]
    pub const fn session(reason: SessionRejectReason) -> Self {
        Self::Session {
            reason,
            ref_tag: None,
            text: None,
        }
    }

    /// Business-level reject.
    #[must_use]
    pub const fn business(reason: BusinessRejectReason) -> Self {
        Self::Business {
            reason,
            ref_id: None,
            text: None,
        }
    }

    /// Sets the tag reference of a session reject.
    #[must_use]
    pub fn with_ref_tag(mut self, tag: u32) -> Self {
        if let Self::Session { ref_tag, .. } = &mut self {
            *ref_tag = Some(tag);
        }
        self
    }

    /// Sets the BusinessRejectRefID of a business reject.
    #[must_use]
    pub fn with_ref_id(mut self, id: impl Into<String>) -> Self {
        if let Self::Business { ref_id, .. } = &mut self {
            *ref_id = Some(id.into());
        }
        self
    }

    /// Sets the text.
    #[must_use]
    pub fn with_text(mut self, value: impl Into<String>) -> Self {
        match &mut self {
            Self::Session { text, .. } | Self::Business { text, .. } => {
                *text = Some(value.into());
            }
        }
        self
    }

    /// Returns the text, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Session { text, .. } | Self::Business { text, .. } => text.as_deref(),
        }
    }
}

/// Hooks through which the application sees session events and traffic.
#[async_trait]
pub trait Application: Send + Sync {
    /// A session was created.
    async fn on_create(&self, _session_id: &SessionId) {}

    /// The logon handshake completed.
    async fn on_logon(&self, _session_id: &SessionId) {}

    /// The session logged out or lost its connection after logon.
    async fn on_logout(&self, _session_id: &SessionId) {}

    /// An administrative message is about to be sent.
    ///
    /// # Errors
    /// Return [`DoNotSend`] to drop the message.
    async fn to_admin(&self, _message: &mut Message, _session_id: &SessionId) -> Result<(), DoNotSend> {
        Ok(())
    }

    /// An administrative message was received.
    ///
    /// # Errors
    /// Return a [`RejectReason`] to reject it. A rejected Logon ends the
    /// connection.
    async fn from_admin(&self, _message: &Message, _session_id: &SessionId) -> Result<(), RejectReason> {
        Ok(())
    }

    /// An application message is about to be sent or resent.
    ///
    /// # Errors
    /// Return [`DoNotSend`] to drop the message; a resend is replaced by a gap fill.
    async fn to_app(&self, _message: &mut Message, _session_id: &SessionId) -> Result<(), DoNotSend> {
        Ok(())
    }

    /// An application message was received in sequence.
    ///
    /// # Errors
    /// Return a [`RejectReason`] to reject it. The sequence number is
    /// consumed either way.
    async fn from_app(&self, _message: &Message, _session_id: &SessionId) -> Result<(), RejectReason> {
        Ok(())
    }
}

/// Application that accepts everything and does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpApplication;

#[async_trait]
impl Application for NoOpApplication {}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrofix_core::message::MsgType;

    #[test]
    fn test_reject_reason_builders() {
        let reject = RejectReason::session(SessionRejectReason::RequiredTagMissing)
            .with_ref_tag(55)
            .with_text("Symbol required");
        assert_eq!(
            reject,
            RejectReason::Session {
                reason: SessionRejectReason::RequiredTagMissing,
                ref_tag: Some(55),
                text: Some("Symbol required".to_string()),
            }
        );

        let bmr = RejectReason::business(BusinessRejectReason::UnknownSecurity)
            .with_ref_id("ORD-1")
            .with_ref_tag(11);
        assert!(matches!(
            &bmr,
            RejectReason::Business { ref_id: Some(id), .. } if id == "ORD-1"
        ));
        assert_eq!(bmr.text(), None);
    }

    #[tokio::test]
    async fn test_noop_application_accepts_everything() {
        let app = NoOpApplication;
        let id = SessionId::new("FIX.4.4", "A", "B");
        let mut msg = Message::new("FIX.4.4", MsgType::NewOrderSingle);
        app.on_create(&id).await;
        assert!(app.to_app(&mut msg, &id).await.is_ok());
        assert!(app.from_app(&msg, &id).await.is_ok());
        assert!(app.to_admin(&mut msg, &id).await.is_ok());
        assert!(app.from_admin(&msg, &id).await.is_ok());
    }
}
