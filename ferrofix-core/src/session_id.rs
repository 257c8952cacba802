/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Session identity.

use crate::message::FieldMap;
use crate::tags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable key identifying one FIX session from the local side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId {
    /// FIX version string (e.g., "FIX.4.4").
    pub begin_string: String,
    /// Our CompID (SenderCompID on outgoing messages).
    pub sender_comp_id: String,
    /// Counterparty CompID (TargetCompID on outgoing messages).
    pub target_comp_id: String,
    /// Optional qualifier distinguishing sessions with the same CompIDs.
    pub qualifier: Option<String>,
}

impl SessionId {
    /// Creates a new session identifier.
    #[must_use]
    pub fn new(
        begin_string: impl Into<String>,
        sender_comp_id: impl Into<String>,
        target_comp_id: impl Into<String>,
    ) -> Self {
        Self {
            begin_string: begin_string.into(),
            sender_comp_id: sender_comp_id.into(),
            target_comp_id: target_comp_id.into(),
            qualifier: None,
        }
    }

    /// Sets the session qualifier.
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Derives the local session id from the header of an inbound message.
    ///
    /// The counterparty's SenderCompID is our TargetCompID and vice versa.
    #[must_use]
    pub fn from_inbound(header: &FieldMap) -> Option<Self> {
        Some(Self::new(
            header.get_str(tags::BEGIN_STRING)?,
            header.get_str(tags::TARGET_COMP_ID)?,
            header.get_str(tags::SENDER_COMP_ID)?,
        ))
    }

    /// Returns the same id without its qualifier.
    #[must_use]
    pub fn unqualified(&self) -> Self {
        Self {
            qualifier: None,
            ..self.clone()
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}->{}",
            self.begin_string, self.sender_comp_id, self.target_comp_id
        )?;
        if let Some(q) = &self.qualifier {
            write!(f, ":{}", q)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_display() {
        let id = SessionId::new("FIX.4.4", "SENDER", "TARGET");
        assert_eq!(id.to_string(), "FIX.4.4:SENDER->TARGET");
        let q = id.with_qualifier("EU");
        assert_eq!(q.to_string(), "FIX.4.4:SENDER->TARGET:EU");
        assert_eq!(q.unqualified().qualifier, None);
    }

    #[test]
    fn test_from_inbound_swaps_sides() {
        let mut header = FieldMap::new();
        header.set_str(tags::BEGIN_STRING, "FIX.4.2");
        header.set_str(tags::SENDER_COMP_ID, "CLIENT");
        header.set_str(tags::TARGET_COMP_ID, "BROKER");
        let id = SessionId::from_inbound(&header).unwrap();
        assert_eq!(id, SessionId::new("FIX.4.2", "BROKER", "CLIENT"));

        header.remove(tags::SENDER_COMP_ID);
        assert!(SessionId::from_inbound(&header).is_none());
    }
}
