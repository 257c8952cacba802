/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! # FerroFix Transport
//!
//! Network transport layer for the FerroFix engine.
//!
//! This crate provides:
//! - **Codec**: tokio codec around the FIX framer
//! - **Responder**: channel-backed connection handle for sessions
//! - **Connection driver**: read loop, timer and writer task per connection

pub mod codec;
pub mod connection;
pub mod responder;

pub use codec::{CodecError, FixCodec, InboundFrame};
pub use connection::{ConnectionOptions, run_acceptor, run_initiator};
pub use responder::{ChannelResponder, Outbound};
