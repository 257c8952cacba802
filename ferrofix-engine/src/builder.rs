/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Engine builder for fluent configuration.

use crate::engine::{Engine, EngineSettings};
use crate::error::Result;
use ferrofix_dictionary::{Dictionary, Validator, Version};
use ferrofix_session::{Application, NoOpApplication, Session, SessionConfig, SessionRegistry};
use ferrofix_store::{MemoryStoreFactory, MessageStoreFactory};
use ferrofix_transport::ConnectionOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Builder for configuring a FIX engine.
pub struct EngineBuilder {
    application: Arc<dyn Application>,
    store_factory: Arc<dyn MessageStoreFactory>,
    sessions: Vec<SessionConfig>,
    validate: bool,
    connect_timeout: Duration,
    reconnect_interval: Duration,
    max_reconnect_attempts: u32,
    tick_interval: Duration,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    /// Creates a new engine builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            application: Arc::new(NoOpApplication),
            store_factory: Arc::new(MemoryStoreFactory::new()),
            sessions: Vec::new(),
            validate: false,
            connect_timeout: Duration::from_secs(30),
            reconnect_interval: Duration::from_secs(5),
            max_reconnect_attempts: 10,
            tick_interval: Duration::from_secs(1),
        }
    }

    /// Sets the application callback handler.
    #[must_use]
    pub fn with_application<A: Application + 'static>(mut self, application: A) -> Self {
        self.application = Arc::new(application);
        self
    }

    /// Sets a shared application callback handler.
    #[must_use]
    pub fn with_shared_application(mut self, application: Arc<dyn Application>) -> Self {
        self.application = application;
        self
    }

    /// Sets the factory that creates one store per session.
    #[must_use]
    pub fn with_store_factory<F: MessageStoreFactory + 'static>(mut self, factory: F) -> Self {
        self.store_factory = Arc::new(factory);
        self
    }

    /// Adds a session configuration.
    #[must_use]
    pub fn add_session(mut self, config: SessionConfig) -> Self {
        self.sessions.push(config);
        self
    }

    /// Validates inbound messages against the built-in dictionary for each
    /// session's BeginString.
    #[must_use]
    pub const fn with_validation(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the reconnect interval.
    #[must_use]
    pub const fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Sets the maximum consecutive reconnect attempts; 0 retries forever.
    #[must_use]
    pub const fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Sets how often session timers run.
    #[must_use]
    pub const fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Returns the configured sessions.
    #[must_use]
    pub fn sessions(&self) -> &[SessionConfig] {
        &self.sessions
    }

    /// Returns the connection timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the reconnect interval.
    #[must_use]
    pub const fn reconnect_interval(&self) -> Duration {
        self.reconnect_interval
    }

    /// Returns the maximum reconnect attempts.
    #[must_use]
    pub const fn max_reconnect_attempts(&self) -> u32 {
        self.max_reconnect_attempts
    }

    /// Creates every session, registers it and calls `on_create`.
    ///
    /// # Errors
    /// Returns an error if a store cannot be created or two sessions share an id.
    pub async fn build(self) -> Result<Engine> {
        let registry = Arc::new(SessionRegistry::new());
        for config in self.sessions {
            let id = config.session_id();
            let store = self.store_factory.create(&id)?;
            let mut session = Session::new(config, store, self.application.clone());
            if self.validate {
                if let Some(version) = Version::from_begin_string(&id.begin_string) {
                    let dictionary = Arc::new(Dictionary::builtin(version));
                    session = session.with_validator(Validator::new(dictionary));
                } else {
                    debug!(session = %id, "no built-in dictionary, validation disabled");
                }
            }
            registry.register(Arc::new(session))?;
            self.application.on_create(&id).await;
            info!(session = %id, "session created");
        }

        let settings = EngineSettings {
            connect_timeout: self.connect_timeout,
            reconnect_interval: self.reconnect_interval,
            max_reconnect_attempts: self.max_reconnect_attempts,
            connection: ConnectionOptions {
                tick_interval: self.tick_interval,
                ..ConnectionOptions::default()
            },
        };
        Ok(Engine::new(registry, settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ferrofix_core::error::SessionError;
    use ferrofix_core::session_id::SessionId;
    use ferrofix_core::types::CompId;
    use parking_lot::Mutex;

    fn config(target: &str) -> SessionConfig {
        SessionConfig::new(
            CompId::new("SENDER").unwrap(),
            CompId::new(target).unwrap(),
            "FIX.4.4",
        )
    }

    #[derive(Default)]
    struct Created(Mutex<Vec<SessionId>>);

    #[async_trait]
    impl Application for Created {
        async fn on_create(&self, session_id: &SessionId) {
            self.0.lock().push(session_id.clone());
        }
    }

    #[test]
    fn test_engine_builder_default() {
        let builder = EngineBuilder::new();
        assert_eq!(builder.connect_timeout(), Duration::from_secs(30));
        assert_eq!(builder.reconnect_interval(), Duration::from_secs(5));
        assert_eq!(builder.max_reconnect_attempts(), 10);
        assert!(builder.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_build_registers_sessions_and_calls_on_create() {
        let app = Arc::new(Created::default());
        let engine = EngineBuilder::new()
            .with_shared_application(app.clone())
            .with_validation(true)
            .add_session(config("A"))
            .add_session(config("B"))
            .build()
            .await
            .unwrap();

        assert_eq!(engine.registry().len(), 2);
        assert_eq!(app.0.lock().len(), 2);
        let id = SessionId::new("FIX.4.4", "SENDER", "A");
        assert!(engine.session(&id).is_some());
    }

    #[tokio::test]
    async fn test_build_rejects_duplicate_sessions() {
        let result = EngineBuilder::new()
            .add_session(config("A"))
            .add_session(config("A"))
            .build()
            .await;
        assert!(matches!(
            result,
            Err(crate::EngineError::Session(SessionError::DuplicateSession(_)))
        ));
    }
}
