/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Per-connection driver.
//!
//! One task reads and frames inbound bytes, feeds the session and runs its
//! timer; a second task owns the write half. Dropping out of the read loop
//! detaches the session by connection id.

use crate::codec::{CodecError, FixCodec, InboundFrame};
use crate::responder::{ChannelResponder, Outbound};
use bytes::BytesMut;
use ferrofix_core::error::SessionError;
use ferrofix_core::tags;
use ferrofix_session::{Responder, Session, SessionRegistry};
use ferrofix_tagvalue::{parse_message, peek_field};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, error, info, warn};

/// Driver settings.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionOptions {
    /// How often the session timer runs.
    pub tick_interval: Duration,
    /// How long an acceptor waits for the first message.
    pub first_message_timeout: Duration,
    /// Initial read buffer capacity.
    pub read_buffer_size: usize,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            first_message_timeout: Duration::from_secs(10),
            read_buffer_size: 8 * 1024,
        }
    }
}

/// Serves an accepted connection.
///
/// The first frame selects the session through the registry. A connection
/// whose first frame is unreadable or names no known session is dropped
/// without touching any session.
///
/// # Errors
/// Returns `SessionError::UnknownSession` for an unknown counterparty, or the
/// fatal error that ended the connection.
pub async fn run_acceptor<S>(
    stream: S,
    remote: Option<SocketAddr>,
    registry: Arc<SessionRegistry>,
    options: ConnectionOptions,
) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut reader, writer) = tokio::io::split(stream);
    let mut codec = FixCodec::new();
    let mut buf = BytesMut::with_capacity(options.read_buffer_size);

    let first = tokio::time::timeout(
        options.first_message_timeout,
        read_frame(&mut reader, &mut codec, &mut buf),
    )
    .await
    .map_err(|_| {
        warn!(remote = ?remote, "no message before timeout");
        SessionError::ProtocolViolation("no Logon received".to_string())
    })??;

    let frame = match first {
        Some(InboundFrame::Message(frame)) => frame,
        Some(InboundFrame::Malformed(err)) => {
            warn!(remote = ?remote, error = %err, "malformed first message");
            return Err(SessionError::ProtocolViolation(err.to_string()));
        }
        None => {
            debug!(remote = ?remote, "closed before first message");
            return Ok(());
        }
    };

    let Some(session) = parse_message(frame.clone())
        .ok()
        .and_then(|msg| registry.lookup_inbound(&msg))
    else {
        let field = |tag| {
            peek_field(&frame, tag)
                .map(|v| String::from_utf8_lossy(v).into_owned())
                .unwrap_or_default()
        };
        let described = format!(
            "{}->{}",
            field(tags::SENDER_COMP_ID),
            field(tags::TARGET_COMP_ID)
        );
        warn!(remote = ?remote, counterparty = %described, "unknown session, dropping connection");
        return Err(SessionError::UnknownSession(described));
    };

    codec = FixCodec::for_session(session.config());
    let (conn_id, writer) = attach(&session, writer, remote).await?;
    let first_result = session.next(frame).await;
    drive(session, reader, codec, buf, writer, conn_id, options, first_result).await
}

/// Drives an outbound connection: attaches the session and sends Logon.
///
/// # Errors
/// Returns the fatal error that ended the connection.
pub async fn run_initiator<S>(
    stream: S,
    remote: Option<SocketAddr>,
    session: Arc<Session>,
    options: ConnectionOptions,
) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let codec = FixCodec::for_session(session.config());
    let buf = BytesMut::with_capacity(options.read_buffer_size);
    let (conn_id, writer) = attach(&session, writer, remote).await?;
    let logon = session.logon().await;
    drive(session, reader, codec, buf, writer, conn_id, options, logon).await
}

async fn attach<W>(
    session: &Arc<Session>,
    writer: W,
    remote: Option<SocketAddr>,
) -> Result<(u64, JoinHandle<()>), SessionError>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    let (responder, rx) = ChannelResponder::new(remote);
    let conn_id = responder.connection_id();
    session.on_connect(Arc::new(responder)).await?;
    Ok((conn_id, tokio::spawn(write_loop(writer, rx, conn_id))))
}

async fn read_frame<R>(
    reader: &mut R,
    codec: &mut FixCodec,
    buf: &mut BytesMut,
) -> Result<Option<InboundFrame>, SessionError>
where
    R: AsyncRead + Unpin,
{
    loop {
        match codec.decode(buf) {
            Ok(Some(frame)) => return Ok(Some(frame)),
            Ok(None) => {}
            Err(err) => return Err(SessionError::ProtocolViolation(err.to_string())),
        }
        let read = reader
            .read_buf(buf)
            .await
            .map_err(|err| SessionError::Transport(err.to_string()))?;
        if read == 0 {
            return Ok(None);
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn drive<R>(
    session: Arc<Session>,
    mut reader: R,
    mut codec: FixCodec,
    mut buf: BytesMut,
    mut writer: JoinHandle<()>,
    conn_id: u64,
    options: ConnectionOptions,
    initial: Result<(), SessionError>,
) -> Result<(), SessionError>
where
    R: AsyncRead + Unpin,
{
    let mut outcome = settle(&session, initial);
    let mut attached = true;
    // Frames that arrived together with the first one.
    if outcome.is_ok() && !buf.is_empty() {
        match process_buffer(&session, &mut codec, &mut buf).await {
            Ok(open) => attached = open,
            Err(err) => outcome = Err(err),
        }
    }
    let mut writer_done = false;
    let mut ticker = tokio::time::interval(options.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while attached && outcome.is_ok() {
        let step = tokio::select! {
            read = reader.read_buf(&mut buf) => match read {
                Ok(0) => {
                    info!(session = %session.id(), connection = conn_id, "connection closed by peer");
                    break;
                }
                Ok(_) => match process_buffer(&session, &mut codec, &mut buf).await {
                    Ok(true) => Ok(()),
                    Ok(false) => break,
                    Err(err) => Err(err),
                },
                Err(err) => Err(SessionError::Transport(err.to_string())),
            },
            _ = ticker.tick() => session.tick(Instant::now()).await,
            _ = &mut writer, if !writer_done => {
                writer_done = true;
                break;
            }
        };
        outcome = settle(&session, step);
    }

    if let Err(err) = session.on_disconnect(conn_id).await {
        error!(session = %session.id(), error = %err, "detach failed");
    }
    if !writer_done && let Err(err) = writer.await {
        error!(session = %session.id(), error = %err, "writer task failed");
    }
    outcome
}

/// Keeps fatal errors, logs and drops the rest.
fn settle(session: &Session, result: Result<(), SessionError>) -> Result<(), SessionError> {
    match result {
        Err(err) if err.is_fatal() => {
            warn!(session = %session.id(), error = %err, "connection ended");
            Err(err)
        }
        Err(err) => {
            warn!(session = %session.id(), error = %err, "session error");
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}

/// Feeds every buffered frame to the session. Returns false once the session
/// has dropped the connection.
async fn process_buffer(
    session: &Session,
    codec: &mut FixCodec,
    buf: &mut BytesMut,
) -> Result<bool, SessionError> {
    loop {
        let result = match codec.decode(buf) {
            Ok(Some(InboundFrame::Message(frame))) => session.next(frame).await,
            Ok(Some(InboundFrame::Malformed(err))) => session.next_malformed(&err).await,
            Ok(None) => return Ok(true),
            Err(CodecError::Frame(err)) => {
                session.next_malformed(&err).await?;
                return Err(SessionError::ProtocolViolation(err.to_string()));
            }
            Err(CodecError::Io(err)) => return Err(SessionError::Transport(err)),
        };
        settle(session, result)?;
        // Frames behind a Logout are not processed.
        if !session.is_connected().await {
            debug!(session = %session.id(), remaining = buf.len(), "session detached, discarding buffered input");
            return Ok(false);
        }
    }
}

async fn write_loop<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Outbound>, conn_id: u64)
where
    W: AsyncWrite + Unpin,
{
    let mut codec = FixCodec::new();
    let mut out = BytesMut::with_capacity(4096);
    let mut closing = false;

    while !closing {
        let Some(first) = rx.recv().await else {
            break;
        };
        let mut next = Some(first);
        while let Some(item) = next.take() {
            match item {
                Outbound::Data(frame) => {
                    if let Err(err) = codec.encode(frame, &mut out) {
                        error!(connection = conn_id, error = %err, "encode failed");
                    }
                }
                Outbound::Close => closing = true,
            }
            if !closing {
                next = rx.try_recv().ok();
            }
        }
        if let Err(err) = writer.write_all(&out).await {
            error!(connection = conn_id, error = %err, "write failed");
            return;
        }
        out.clear();
    }

    if let Err(err) = writer.shutdown().await {
        debug!(connection = conn_id, error = %err, "shutdown failed");
    }
    debug!(connection = conn_id, "writer finished");
}
