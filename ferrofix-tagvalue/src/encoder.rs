/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! FIX message encoder.
//!
//! BodyLength and CheckSum are always computed here; values the caller put
//! in the message for tags 9 and 10 are ignored. Lengths are worked out
//! before anything is written, so a message streams straight into its sink
//! while the checksum accumulates.

use crate::checksum::{Checksum, format_checksum};
use crate::frame::SOH;
use bytes::{BufMut, Bytes, BytesMut};
use ferrofix_core::error::EncodeError;
use ferrofix_core::field::Field;
use ferrofix_core::message::Message;
use ferrofix_core::tags;
use std::io::Write;

/// Encodes [`Message`]s into tag=value frames.
///
/// Holds a scratch buffer that is reused across calls.
#[derive(Debug)]
pub struct Encoder {
    buf: BytesMut,
}

impl Encoder {
    /// Creates an encoder with a default scratch capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates an encoder with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Encodes a message into a new frame.
    ///
    /// # Errors
    /// Returns `EncodeError::MissingRequiredField` when BeginString or MsgType
    /// is absent, and `EncodeError::InvalidFieldValue` when a non-data value
    /// contains SOH.
    pub fn encode(&mut self, msg: &Message) -> Result<Bytes, EncodeError> {
        let layout = Layout::of(msg)?;
        self.buf.clear();
        self.buf.reserve(layout.total_len());
        {
            let mut writer = (&mut self.buf).writer();
            layout.write(msg, &mut writer)?;
        }
        Ok(self.buf.split().freeze())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encodes a message into a new frame.
///
/// # Errors
/// See [`Encoder::encode`].
pub fn encode(msg: &Message) -> Result<Bytes, EncodeError> {
    Encoder::new().encode(msg)
}

/// Streams an encoded message into `sink`, returning the bytes written.
///
/// # Errors
/// Same as [`Encoder::encode`], plus `EncodeError::Io` if the sink fails.
pub fn write_to<W: Write>(msg: &Message, mut sink: W) -> Result<usize, EncodeError> {
    let layout = Layout::of(msg)?;
    layout.write(msg, &mut sink)?;
    Ok(layout.total_len())
}

/// Precomputed sizes for one message.
struct Layout<'a> {
    begin_string: &'a [u8],
    msg_type: &'a Field,
    body_length: usize,
}

impl<'a> Layout<'a> {
    fn of(msg: &'a Message) -> Result<Self, EncodeError> {
        let begin_string = msg
            .header
            .get(tags::BEGIN_STRING)
            .ok_or(EncodeError::MissingRequiredField {
                tag: tags::BEGIN_STRING,
            })?
            .as_bytes();
        let msg_type = msg
            .header
            .get(tags::MSG_TYPE)
            .ok_or(EncodeError::MissingRequiredField { tag: tags::MSG_TYPE })?;

        let mut body_length = msg_type.wire_len();
        for field in body_fields(msg) {
            if !tags::is_data_tag(field.tag) && field.value.contains(&SOH) {
                return Err(EncodeError::InvalidFieldValue {
                    tag: field.tag,
                    reason: "value contains the field delimiter".to_string(),
                });
            }
            body_length += field.wire_len();
        }

        Ok(Self {
            begin_string,
            msg_type,
            body_length,
        })
    }

    fn header_len(&self) -> usize {
        let mut digits = itoa::Buffer::new();
        2 + self.begin_string.len() + 1 + 2 + digits.format(self.body_length).len() + 1
    }

    fn total_len(&self) -> usize {
        self.header_len() + self.body_length + crate::frame::TRAILER_LEN
    }

    fn write<W: Write>(&self, msg: &Message, sink: &mut W) -> Result<(), EncodeError> {
        let mut out = ChecksumWriter {
            sink,
            checksum: Checksum::new(),
        };
        out.put_field(tags::BEGIN_STRING, self.begin_string)?;
        let mut digits = itoa::Buffer::new();
        out.put_field(tags::BODY_LENGTH, digits.format(self.body_length).as_bytes())?;
        out.put_field(self.msg_type.tag, &self.msg_type.value)?;
        for field in body_fields(msg) {
            out.put_field(field.tag, &field.value)?;
        }

        let checksum = format_checksum(out.checksum.value());
        out.sink.write_all(b"10=")?;
        out.sink.write_all(&checksum)?;
        out.sink.write_all(&[SOH])?;
        Ok(())
    }
}

/// Everything between MsgType and CheckSum, in wire order.
fn body_fields(msg: &Message) -> impl Iterator<Item = &Field> {
    let header = msg.header.iter().filter(|f| {
        !matches!(
            f.tag,
            tags::BEGIN_STRING | tags::BODY_LENGTH | tags::MSG_TYPE
        )
    });
    let trailer = msg.trailer.iter().filter(|f| f.tag != tags::CHECKSUM);
    header.chain(msg.body.iter()).chain(trailer)
}

struct ChecksumWriter<'w, W: Write> {
    sink: &'w mut W,
    checksum: Checksum,
}

impl<W: Write> ChecksumWriter<'_, W> {
    fn put(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.sink.write_all(bytes)?;
        self.checksum.update(bytes);
        Ok(())
    }

    fn put_field(&mut self, tag: u32, value: &[u8]) -> Result<(), EncodeError> {
        let mut tag_buf = itoa::Buffer::new();
        self.put(tag_buf.format(tag).as_bytes())?;
        self.put(b"=")?;
        self.put(value)?;
        self.put(&[SOH])
    }
}
