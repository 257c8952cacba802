/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! The handle a session writes to.

use bytes::Bytes;
use ferrofix_core::error::SessionError;
use std::net::SocketAddr;

/// Live connection attached to a session.
///
/// `send` must not block: implementations hand the bytes to a writer that
/// preserves submission order.
pub trait Responder: Send + Sync {
    /// Queues an encoded frame for writing.
    ///
    /// # Errors
    /// Returns `SessionError::Transport` if the connection is gone.
    fn send(&self, frame: Bytes) -> Result<(), SessionError>;

    /// Asks the transport to close the connection after queued frames are written.
    fn disconnect(&self);

    /// Address of the counterparty, if known.
    fn remote_address(&self) -> Option<SocketAddr>;

    /// Identifier unique to this connection.
    fn connection_id(&self) -> u64;
}
