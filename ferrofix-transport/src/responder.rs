/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Channel-backed [`Responder`].
//!
//! Frames are pushed onto an unbounded channel drained by the connection's
//! writer task, so `send` never waits on the socket and frames leave in
//! submission order.

use bytes::Bytes;
use ferrofix_core::error::SessionError;
use ferrofix_session::Responder;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Work item for a writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Write these bytes.
    Data(Bytes),
    /// Flush what was queued before and close.
    Close,
}

/// Responder that forwards frames to a writer task.
#[derive(Debug)]
pub struct ChannelResponder {
    tx: mpsc::UnboundedSender<Outbound>,
    connection_id: u64,
    remote: Option<SocketAddr>,
}

impl ChannelResponder {
    /// Creates a responder and the receiving end for its writer.
    #[must_use]
    pub fn new(remote: Option<SocketAddr>) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let responder = Self {
            tx,
            connection_id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            remote,
        };
        (responder, rx)
    }
}

impl Responder for ChannelResponder {
    fn send(&self, frame: Bytes) -> Result<(), SessionError> {
        self.tx.send(Outbound::Data(frame)).map_err(|_| {
            SessionError::Transport(format!("connection {} closed", self.connection_id))
        })
    }

    fn disconnect(&self) {
        // The writer may already be gone.
        self.tx.send(Outbound::Close).ok();
    }

    fn remote_address(&self) -> Option<SocketAddr> {
        self.remote
    }

    fn connection_id(&self) -> u64 {
        self.connection_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_keep_submission_order() {
        let (responder, mut rx) = ChannelResponder::new(None);
        responder.send(Bytes::from_static(b"one")).unwrap();
        responder.send(Bytes::from_static(b"two")).unwrap();
        responder.disconnect();

        assert_eq!(rx.try_recv().unwrap(), Outbound::Data(Bytes::from_static(b"one")));
        assert_eq!(rx.try_recv().unwrap(), Outbound::Data(Bytes::from_static(b"two")));
        assert_eq!(rx.try_recv().unwrap(), Outbound::Close);
    }

    #[test]
    fn test_send_after_writer_gone() {
        let (responder, rx) = ChannelResponder::new(None);
        drop(rx);
        assert!(matches!(
            responder.send(Bytes::from_static(b"x")),
            Err(SessionError::Transport(_))
        ));
        responder.disconnect();
    }

    #[test]
    fn test_connection_ids_are_unique() {
        let (a, _rx_a) = ChannelResponder::new(None);
        let (b, _rx_b) = ChannelResponder::new(None);
        assert_ne!(a.connection_id(), b.connection_id());
    }
}
