/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Running engine: TCP acceptor and reconnecting initiator.

use crate::builder::EngineBuilder;
use crate::error::{EngineError, Result};
use ferrofix_core::error::SessionError;
use ferrofix_core::message::Message;
use ferrofix_core::session_id::SessionId;
use ferrofix_core::types::SeqNum;
use ferrofix_session::{Session, SessionRegistry};
use ferrofix_transport::{ConnectionOptions, run_acceptor, run_initiator};
use std::future::{Future, pending};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

const SHUTDOWN_TEXT: &str = "engine shutdown";

#[derive(Debug, Clone, Copy)]
pub(crate) struct EngineSettings {
    pub(crate) connect_timeout: Duration,
    pub(crate) reconnect_interval: Duration,
    pub(crate) max_reconnect_attempts: u32,
    pub(crate) connection: ConnectionOptions,
}

/// A configured set of sessions ready to accept or initiate connections.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<SessionRegistry>,
    settings: EngineSettings,
}

impl Engine {
    pub(crate) fn new(registry: Arc<SessionRegistry>, settings: EngineSettings) -> Self {
        Self { registry, settings }
    }

    /// Starts configuring an engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Returns the session registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Returns a configured session.
    #[must_use]
    pub fn session(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.registry.lookup(id)
    }

    /// Sends an application message on a session.
    ///
    /// # Errors
    /// Returns `UnknownSession` or the session's send error.
    pub async fn send(&self, id: &SessionId, message: Message) -> Result<SeqNum> {
        let session = self
            .session(id)
            .ok_or_else(|| EngineError::UnknownSession(id.to_string()))?;
        Ok(session.send(message).await?)
    }

    /// Sends Logout on every logged-on session.
    pub async fn logout_all(&self, text: Option<&str>) {
        for session in self.registry.sessions() {
            if session.is_logged_on().await
                && let Err(err) = session.logout(text).await
            {
                warn!(session = %session.id(), error = %err, "logout failed");
            }
        }
    }

    /// Binds a listener that serves every registered acceptor session.
    ///
    /// # Errors
    /// Returns an error if the address cannot be bound.
    pub async fn bind<A: ToSocketAddrs>(&self, address: A) -> Result<Acceptor> {
        let listener = TcpListener::bind(address).await?;
        info!(address = ?listener.local_addr().ok(), "acceptor listening");
        Ok(Acceptor {
            listener,
            engine: self.clone(),
        })
    }

    /// Prepares an initiator that connects `id` to `address`.
    ///
    /// # Errors
    /// Returns `UnknownSession` if `id` is not configured.
    pub fn initiator(&self, id: &SessionId, address: impl Into<String>) -> Result<Initiator> {
        let session = self
            .session(id)
            .ok_or_else(|| EngineError::UnknownSession(id.to_string()))?;
        Ok(Initiator {
            session,
            address: address.into(),
            settings: self.settings,
        })
    }
}

/// Server side: accepts TCP connections and routes them by CompIDs.
#[derive(Debug)]
pub struct Acceptor {
    listener: TcpListener,
    engine: Engine,
}

impl Acceptor {
    /// Returns the bound address.
    ///
    /// # Errors
    /// Returns an error if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections forever.
    ///
    /// # Errors
    /// Never returns `Ok` on its own; accept failures are logged and retried.
    pub async fn run(self) -> Result<()> {
        self.run_until(pending()).await
    }

    /// Accepts connections until `shutdown` resolves, then logs out every
    /// session and waits for open connections to finish.
    ///
    /// # Errors
    /// Accept errors are logged, not returned.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let options = self.engine.settings.connection;
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        if let Err(err) = stream.set_nodelay(true) {
                            debug!(remote = %remote, error = %err, "set_nodelay failed");
                        }
                        info!(remote = %remote, "connection accepted");
                        let registry = self.engine.registry.clone();
                        connections.spawn(async move {
                            if let Err(err) = run_acceptor(stream, Some(remote), registry, options).await {
                                debug!(remote = %remote, error = %err, "connection finished with error");
                            }
                        });
                    }
                    Err(err) => warn!(error = %err, "accept failed"),
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    log_join(joined);
                }
            }
        }

        info!("acceptor shutting down");
        self.engine.logout_all(Some(SHUTDOWN_TEXT)).await;
        let grace = self.grace_period();
        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = connections.join_next().await {
                log_join(joined);
            }
        })
        .await;
        if drained.is_err() {
            warn!(remaining = connections.len(), "closing connections after grace period");
            connections.shutdown().await;
        }
        Ok(())
    }

    fn grace_period(&self) -> Duration {
        self.engine
            .registry
            .sessions()
            .iter()
            .map(|s| s.config().logout_timeout)
            .max()
            .unwrap_or_default()
            + self.engine.settings.connection.tick_interval
    }
}

/// Client side: keeps one session connected, reconnecting after failures.
#[derive(Debug)]
pub struct Initiator {
    session: Arc<Session>,
    address: String,
    settings: EngineSettings,
}

impl Initiator {
    /// Returns the session this initiator drives.
    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Connects and reconnects until attempts run out.
    ///
    /// # Errors
    /// Returns `ReconnectExhausted` after too many consecutive failures.
    pub async fn run(self) -> Result<()> {
        self.run_until(pending()).await
    }

    /// Connects and reconnects until `shutdown` resolves, then logs out.
    ///
    /// The attempt counter only counts consecutive connect failures; a
    /// connection that was established resets it.
    ///
    /// # Errors
    /// Returns `ReconnectExhausted` after too many consecutive failures.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut failures = 0u32;

        loop {
            let connect = tokio::time::timeout(
                self.settings.connect_timeout,
                TcpStream::connect(self.address.as_str()),
            );
            let connected = tokio::select! {
                () = &mut shutdown => return Ok(()),
                result = connect => result,
            };

            match connected {
                Ok(Ok(stream)) => {
                    failures = 0;
                    if let Err(err) = stream.set_nodelay(true) {
                        debug!(address = %self.address, error = %err, "set_nodelay failed");
                    }
                    let remote = stream.peer_addr().ok();
                    info!(session = %self.session.id(), address = %self.address, "connected");
                    let mut task = tokio::spawn(run_initiator(
                        stream,
                        remote,
                        self.session.clone(),
                        self.settings.connection,
                    ));
                    tokio::select! {
                        joined = &mut task => self.report(joined),
                        () = &mut shutdown => {
                            self.shutdown(task).await;
                            return Ok(());
                        }
                    }
                }
                Ok(Err(err)) => {
                    failures += 1;
                    warn!(address = %self.address, attempt = failures, error = %err, "connect failed");
                }
                Err(_) => {
                    failures += 1;
                    warn!(address = %self.address, attempt = failures, "connect timed out");
                }
            }

            let limit = self.settings.max_reconnect_attempts;
            if limit != 0 && failures >= limit {
                error!(session = %self.session.id(), attempts = failures, "giving up");
                return Err(EngineError::ReconnectExhausted {
                    address: self.address,
                    attempts: failures,
                });
            }

            tokio::select! {
                () = &mut shutdown => return Ok(()),
                () = tokio::time::sleep(self.settings.reconnect_interval) => {}
            }
        }
    }

    fn report(&self, joined: std::result::Result<std::result::Result<(), SessionError>, JoinError>) {
        match joined {
            Ok(Ok(())) => info!(session = %self.session.id(), "disconnected"),
            Ok(Err(err)) => warn!(session = %self.session.id(), error = %err, "disconnected"),
            Err(err) => error!(session = %self.session.id(), error = %err, "connection task failed"),
        }
    }

    async fn shutdown(&self, mut task: JoinHandle<std::result::Result<(), SessionError>>) {
        if self.session.is_logged_on().await
            && let Err(err) = self.session.logout(Some(SHUTDOWN_TEXT)).await
        {
            warn!(session = %self.session.id(), error = %err, "logout failed");
        }
        let grace = self.session.config().logout_timeout + self.settings.connection.tick_interval;
        match tokio::time::timeout(grace, &mut task).await {
            Ok(joined) => self.report(joined),
            Err(_) => {
                warn!(session = %self.session.id(), "closing connection after grace period");
                task.abort();
            }
        }
    }
}

fn log_join(joined: std::result::Result<(), JoinError>) {
    if let Err(err) = joined {
        error!(error = %err, "connection task failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrofix_session::{ConnectionType, SessionConfigBuilder};

    fn initiator_engine_config() -> ferrofix_session::SessionConfig {
        SessionConfigBuilder::new()
            .sender_comp_id("CLIENT")
            .target_comp_id("SERVER")
            .connection_type(ConnectionType::Initiator)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_initiator_for_unknown_session() {
        let engine = EngineBuilder::new().build().await.unwrap();
        let id = SessionId::new("FIX.4.4", "CLIENT", "SERVER");
        assert!(matches!(
            engine.initiator(&id, "127.0.0.1:1"),
            Err(EngineError::UnknownSession(_))
        ));
    }

    #[tokio::test]
    async fn test_initiator_gives_up_after_max_attempts() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let engine = EngineBuilder::new()
            .add_session(initiator_engine_config())
            .with_reconnect_interval(Duration::from_millis(10))
            .with_connect_timeout(Duration::from_millis(500))
            .with_max_reconnect_attempts(2)
            .build()
            .await
            .unwrap();
        let id = SessionId::new("FIX.4.4", "CLIENT", "SERVER");
        let initiator = engine.initiator(&id, address.to_string()).unwrap();

        let result = initiator.run().await;
        assert!(matches!(
            result,
            Err(EngineError::ReconnectExhausted { attempts: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_send_to_unknown_session() {
        let engine = EngineBuilder::new().build().await.unwrap();
        let id = SessionId::new("FIX.4.4", "X", "Y");
        let msg = Message::new("FIX.4.4", ferrofix_core::message::MsgType::Heartbeat);
        assert!(matches!(
            engine.send(&id, msg).await,
            Err(EngineError::UnknownSession(_))
        ));
    }
}
