/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! # FerroFix Session
//!
//! FIX session layer protocol implementation for the FerroFix engine.
//!
//! This crate provides:
//! - **Session engine**: logon, logout, sequence reconciliation and resend recovery
//! - **State machine**: the session lifecycle and its allowed transitions
//! - **Heartbeat handling**: Heartbeat/TestRequest timing
//! - **Registry**: lookup of sessions by identifier
//! - **Configuration**: session settings and their defaults

pub mod application;
pub mod config;
pub mod heartbeat;
pub mod registry;
pub mod responder;
pub mod sequence;
pub mod session;
pub mod state;

pub use application::{Application, DoNotSend, NoOpApplication, RejectReason};
pub use config::{ConnectionType, SeqTooLowPolicy, SessionConfig, SessionConfigBuilder};
pub use heartbeat::{HeartbeatAction, HeartbeatManager};
pub use registry::SessionRegistry;
pub use responder::Responder;
pub use sequence::{MessageQueue, ResendRange, SequenceResult};
pub use session::Session;
pub use state::SessionState;
