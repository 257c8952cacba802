/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Tokio codec for FIX message framing.
//!
//! The codec wraps [`Framer`]: a frame with a bad checksum or body length is
//! yielded as [`InboundFrame::Malformed`] so the session can reject it while
//! the stream keeps going. Only oversized input ends decoding.

use bytes::{BufMut, Bytes, BytesMut};
use ferrofix_core::error::FrameError;
use ferrofix_session::SessionConfig;
use ferrofix_tagvalue::Framer;
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// Errors that can occur during codec operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The stream cannot be framed any further.
    #[error("framing error: {0}")]
    Frame(FrameError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// One unit read off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// A complete, verified frame.
    Message(Bytes),
    /// A complete frame that failed verification.
    Malformed(FrameError),
}

/// Tokio codec for FIX message framing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixCodec {
    framer: Framer,
}

impl FixCodec {
    /// Creates a new codec with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            framer: Framer::new(),
        }
    }

    /// Creates a codec with a session's size and checksum settings.
    #[must_use]
    pub const fn for_session(config: &SessionConfig) -> Self {
        Self::new()
            .with_max_message_size(config.max_message_size)
            .with_checksum_validation(config.validate_checksum)
    }

    /// Sets the maximum message size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.framer = self.framer.with_max_message_size(size);
        self
    }

    /// Sets whether to validate checksums.
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.framer = self.framer.with_checksum_validation(validate);
        self
    }
}

impl Decoder for FixCodec {
    type Item = InboundFrame;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.framer.decode(src) {
            Ok(frame) => Ok(frame.map(InboundFrame::Message)),
            Err(err @ FrameError::MessageTooLarge { .. }) => Err(CodecError::Frame(err)),
            Err(err) => Ok(Some(InboundFrame::Malformed(err))),
        }
    }
}

impl Encoder<Bytes> for FixCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(&item);
        Ok(())
    }
}

impl Encoder<&[u8]> for FixCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrofix_tagvalue::calculate_checksum;

    fn make_fix_message(body: &str) -> Vec<u8> {
        let header = format!("8=FIX.4.4\x019={}\x01", body.len());
        let without_checksum = format!("{}{}", header, body);
        let checksum = calculate_checksum(without_checksum.as_bytes());
        format!("{}10={:03}\x01", without_checksum, checksum).into_bytes()
    }

    #[test]
    fn test_codec_decode_complete_message() {
        let mut codec = FixCodec::new();
        let msg = make_fix_message("35=0\x01");
        let mut buf = BytesMut::from(&msg[..]);

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some(InboundFrame::Message(Bytes::from(msg))));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_codec_decode_incomplete() {
        let mut codec = FixCodec::new();
        let msg = make_fix_message("35=0\x01");
        let mut buf = BytesMut::from(&msg[..msg.len() - 5]);

        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_codec_checksum_mismatch_does_not_stop_stream() {
        let mut codec = FixCodec::new();
        let good = make_fix_message("35=0\x01");
        let mut buf = BytesMut::from(&b"8=FIX.4.4\x019=5\x0135=0\x0110=000\x01"[..]);
        buf.extend_from_slice(&good);

        let first = codec.decode(&mut buf).unwrap();
        assert!(matches!(
            first,
            Some(InboundFrame::Malformed(FrameError::ChecksumMismatch { .. }))
        ));
        let second = codec.decode(&mut buf).unwrap();
        assert_eq!(second, Some(InboundFrame::Message(Bytes::from(good))));
    }

    #[test]
    fn test_codec_decode_no_checksum_validation() {
        let mut codec = FixCodec::new().with_checksum_validation(false);
        let mut buf = BytesMut::from(&b"8=FIX.4.4\x019=5\x0135=0\x0110=000\x01"[..]);

        let result = codec.decode(&mut buf).unwrap();
        assert!(matches!(result, Some(InboundFrame::Message(_))));
    }

    #[test]
    fn test_codec_message_too_large() {
        let mut codec = FixCodec::new().with_max_message_size(64);
        let mut buf = BytesMut::from(&b"8=FIX.4.4\x019=500\x0135=0\x01"[..]);

        let result = codec.decode(&mut buf);
        assert!(matches!(
            result,
            Err(CodecError::Frame(FrameError::MessageTooLarge { .. }))
        ));
    }

    #[test]
    fn test_codec_encode() {
        let mut codec = FixCodec::new();
        let msg = b"8=FIX.4.4\x019=5\x0135=0\x0110=123\x01";
        let mut dst = BytesMut::new();

        codec.encode(Bytes::from_static(msg), &mut dst).unwrap();
        codec.encode(&msg[..], &mut dst).unwrap();
        assert_eq!(dst.len(), msg.len() * 2);
        assert_eq!(&dst[..msg.len()], msg);
    }
}
