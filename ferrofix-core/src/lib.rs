/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! # FerroFix Core
//!
//! Core types and error definitions shared by every FerroFix crate:
//! - **Error types**: one `thiserror` enum per layer, unified under [`FixError`]
//! - **Fields and messages**: [`Field`], [`FieldMap`], [`Message`], [`MsgType`]
//! - **Tags**: session-level tag constants and header/trailer classification
//! - **Core types**: [`SeqNum`], [`Timestamp`], [`CompId`], [`SessionId`], reject reasons
//!
//! Decoded messages keep their field values as slices of the received frame.

pub mod error;
pub mod field;
pub mod message;
pub mod session_id;
pub mod tags;
pub mod types;

pub use error::{
    DecodeError, EncodeError, FixError, FrameError, Result, SessionError, StoreError,
};
pub use field::{Field, FieldValue};
pub use message::{FieldMap, Message, MsgType};
pub use session_id::SessionId;
pub use types::{BusinessRejectReason, CompId, SeqNum, SessionRejectReason, Timestamp};
