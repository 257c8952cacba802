/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! # FerroFix Engine
//!
//! Runs configured FIX sessions over TCP.
//!
//! - **Builder**: fluent configuration of sessions, store and application
//! - **Acceptor**: listens and routes each connection by its CompIDs
//! - **Initiator**: connects one session and reconnects after failures

pub mod builder;
pub mod engine;
pub mod error;

pub use builder::EngineBuilder;
pub use engine::{Acceptor, Engine, Initiator};
pub use error::{EngineError, Result};
