/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! # FerroFix
//!
//! A FIX session engine for Rust, covering FIX 4.0 through FIX 4.4 and
//! FIXT.1.1.
//!
//! ## Features
//!
//! - **Zero-copy framing**: messages are split off the read buffer as `Bytes`
//! - **Session layer**: logon, heartbeats, gap detection and resend handling
//! - **Async networking**: TCP acceptor and reconnecting initiator on Tokio
//! - **Pluggable storage**: per-session message stores behind a trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferrofix::prelude::*;
//!
//! # async fn run() -> Result<(), EngineError> {
//! let config = SessionConfigBuilder::new()
//!     .sender_comp_id("SERVER")
//!     .target_comp_id("CLIENT")
//!     .build()?;
//! let engine = EngineBuilder::new()
//!     .with_application(NoOpApplication)
//!     .add_session(config)
//!     .build()
//!     .await?;
//! engine.bind("0.0.0.0:9876").await?.run().await
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Fundamental types, message model and errors
//! - [`dictionary`]: Built-in dictionaries and message validation
//! - [`tagvalue`]: Tag=value framing, parsing and encoding
//! - [`session`]: Session layer protocol implementation
//! - [`store`]: Message persistence and storage
//! - [`transport`]: Codec and per-connection driver
//! - [`engine`]: TCP acceptor and initiator

pub mod core {
    //! Core types, message model and errors.
    pub use ferrofix_core::*;
}

pub mod dictionary {
    //! Built-in dictionaries and message validation.
    pub use ferrofix_dictionary::*;
}

pub mod tagvalue {
    //! Tag=value framing, parsing and encoding.
    pub use ferrofix_tagvalue::*;
}

pub mod session {
    //! Session layer protocol implementation.
    pub use ferrofix_session::*;
}

pub mod store {
    //! Message persistence and storage.
    pub use ferrofix_store::*;
}

pub mod transport {
    //! Codec and per-connection driver.
    pub use ferrofix_transport::*;
}

pub mod engine {
    //! TCP acceptor and initiator.
    pub use ferrofix_engine::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use ferrofix_core::{
        CompId, FieldMap, FixError, Message, MsgType, SeqNum, SessionError, SessionId,
        StoreError, Timestamp, tags,
    };

    // Dictionary
    pub use ferrofix_dictionary::{Dictionary, Validator, Version};

    // Tag-value encoding
    pub use ferrofix_tagvalue::{Framer, calculate_checksum, encode, parse_message};

    // Session
    pub use ferrofix_session::{
        Application, ConnectionType, DoNotSend, NoOpApplication, RejectReason, Session,
        SessionConfig, SessionConfigBuilder, SessionState,
    };

    // Store
    pub use ferrofix_store::{MemoryStore, MemoryStoreFactory, MessageStore, MessageStoreFactory};

    // Transport
    pub use ferrofix_transport::{CodecError, FixCodec};

    // Engine
    pub use ferrofix_engine::{Acceptor, Engine, EngineBuilder, EngineError, Initiator};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let _seq = SeqNum::new(1);
        let _ts = Timestamp::now();
        let msg = Message::new("FIX.4.4", MsgType::Heartbeat);
        assert!(encode(&msg).is_ok());
    }

    #[test]
    fn test_version() {
        let version = Version::Fix44;
        assert_eq!(version.begin_string(), "FIX.4.4");
    }
}
