/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! # FerroFix Tag-Value
//!
//! FIX tag=value wire format for the FerroFix engine.
//!
//! - [`Framer`]: splits a byte stream into checksum-validated frames
//! - [`parse_message`]: zero-copy parse of one frame into a [`Message`]
//! - [`Encoder`]: builds frames, computing BodyLength and CheckSum
//!
//! Framing, parsing and encoding are pure functions over byte buffers; none
//! of them performs I/O.

pub mod checksum;
pub mod decoder;
pub mod encoder;
pub mod frame;

pub use checksum::{Checksum, calculate_checksum};
pub use decoder::{Decoder, parse_message, peek_field};
pub use encoder::{Encoder, encode, write_to};
pub use ferrofix_core::message::Message;
pub use frame::{DEFAULT_MAX_MESSAGE_SIZE, Framer, SOH};
