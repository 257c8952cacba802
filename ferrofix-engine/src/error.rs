/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Engine errors.

use ferrofix_core::error::{SessionError, StoreError};
use thiserror::Error;

/// Errors raised while building or running an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Session-level error.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Store creation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Socket error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// No session with this id is configured.
    #[error("unknown session: {0}")]
    UnknownSession(String),

    /// The initiator gave up reconnecting.
    #[error("gave up connecting to {address} after {attempts} attempts")]
    ReconnectExhausted {
        /// Remote address.
        address: String,
        /// Consecutive failed attempts.
        attempts: u32,
    },
}

/// Engine result alias.
pub type Result<T> = std::result::Result<T, EngineError>;
