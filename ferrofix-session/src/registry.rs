/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Session lookup by identifier.

use crate::session::Session;
use ferrofix_core::error::SessionError;
use ferrofix_core::message::Message;
use ferrofix_core::session_id::SessionId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Sessions known to an engine.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session.
    ///
    /// # Errors
    /// Returns `SessionError::DuplicateSession` if the id is taken.
    pub fn register(&self, session: Arc<Session>) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write();
        let id = session.id().clone();
        if sessions.contains_key(&id) {
            return Err(SessionError::DuplicateSession(id.to_string()));
        }
        sessions.insert(id, session);
        Ok(())
    }

    /// Looks up a session by its id.
    #[must_use]
    pub fn lookup(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    /// Finds the session an inbound message belongs to.
    ///
    /// The counterparty's SenderCompID is our TargetCompID. A qualified
    /// session matches when it is the only one for that CompID pair.
    #[must_use]
    pub fn lookup_inbound(&self, message: &Message) -> Option<Arc<Session>> {
        let id = SessionId::from_inbound(&message.header)?;
        let sessions = self.sessions.read();
        if let Some(session) = sessions.get(&id) {
            return Some(session.clone());
        }
        let mut candidates = sessions
            .iter()
            .filter(|(key, _)| key.unqualified() == id)
            .map(|(_, session)| session);
        match (candidates.next(), candidates.next()) {
            (Some(session), None) => Some(session.clone()),
            _ => None,
        }
    }

    /// Removes a session.
    pub fn remove(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.write().remove(id)
    }

    /// Returns every registered id.
    #[must_use]
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.read().keys().cloned().collect()
    }

    /// Returns every registered session.
    #[must_use]
    pub fn sessions(&self) -> Vec<Arc<Session>> {
        self.sessions.read().values().cloned().collect()
    }

    /// Number of sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns true if no session is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::NoOpApplication;
    use crate::config::SessionConfigBuilder;
    use ferrofix_core::message::MsgType;
    use ferrofix_core::tags;
    use ferrofix_store::MemoryStore;

    fn session(sender: &str, target: &str, qualifier: Option<&str>) -> Arc<Session> {
        let mut builder = SessionConfigBuilder::new()
            .sender_comp_id(sender)
            .target_comp_id(target);
        if let Some(q) = qualifier {
            builder = builder.session_qualifier(q);
        }
        Arc::new(Session::new(
            builder.build().unwrap(),
            Arc::new(MemoryStore::new()),
            Arc::new(NoOpApplication),
        ))
    }

    fn inbound(sender: &str, target: &str) -> Message {
        let mut msg = Message::new("FIX.4.4", MsgType::Logon);
        msg.header.set_str(tags::SENDER_COMP_ID, sender);
        msg.header.set_str(tags::TARGET_COMP_ID, target);
        msg
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let registry = SessionRegistry::new();
        registry.register(session("SERVER", "CLIENT", None)).unwrap();
        let err = registry
            .register(session("SERVER", "CLIENT", None))
            .unwrap_err();
        assert!(matches!(err, SessionError::DuplicateSession(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_inbound_swaps_comp_ids() {
        let registry = SessionRegistry::new();
        registry.register(session("SERVER", "CLIENT", None)).unwrap();
        registry.register(session("SERVER", "OTHER", None)).unwrap();

        let found = registry.lookup_inbound(&inbound("CLIENT", "SERVER")).unwrap();
        assert_eq!(found.id().target_comp_id, "CLIENT");
        assert!(registry.lookup_inbound(&inbound("NOBODY", "SERVER")).is_none());
    }

    #[test]
    fn test_lookup_inbound_qualified() {
        let registry = SessionRegistry::new();
        registry
            .register(session("SERVER", "CLIENT", Some("A")))
            .unwrap();
        assert!(registry.lookup_inbound(&inbound("CLIENT", "SERVER")).is_some());

        registry
            .register(session("SERVER", "CLIENT", Some("B")))
            .unwrap();
        assert!(registry.lookup_inbound(&inbound("CLIENT", "SERVER")).is_none());
    }

    #[test]
    fn test_remove() {
        let registry = SessionRegistry::new();
        let s = session("SERVER", "CLIENT", None);
        let id = s.id().clone();
        registry.register(s).unwrap();
        assert!(registry.remove(&id).is_some());
        assert!(registry.is_empty());
        assert!(registry.lookup(&id).is_none());
    }
}
