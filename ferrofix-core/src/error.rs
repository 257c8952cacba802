/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Error types for the FerroFix FIX engine.
//!
//! Every layer reports failures as an explicit error kind instead of unwinding:
//! the framer returns [`FrameError`], the field parser [`DecodeError`], the
//! session layer [`SessionError`]. Callers decide whether a failure is fatal
//! for the connection by asking the error itself.

use crate::message::MsgType;
use bytes::Bytes;
use std::ops::Range;
use thiserror::Error;

/// Result type alias using [`FixError`] as the error type.
pub type Result<T> = std::result::Result<T, FixError>;

/// Top-level error type for all FerroFix operations.
#[derive(Debug, Error)]
pub enum FixError {
    /// Error while locating a message frame in a byte stream.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Error during message decoding.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Error during message encoding.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Error in session layer operations.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Error in message store operations.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error from underlying transport.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the stream framer.
///
/// Recoverable variants carry the offending frame so the session can answer
/// it with a Reject; the bytes have already been consumed from the input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The declared CheckSum does not match the computed one.
    #[error("checksum mismatch: calculated {calculated}, declared {declared}")]
    ChecksumMismatch {
        /// Exact bytes of the rejected frame.
        frame: Bytes,
        /// MsgType of the frame, when readable.
        msg_type: Option<MsgType>,
        /// Calculated checksum value.
        calculated: u8,
        /// Declared checksum value.
        declared: u8,
    },

    /// The CheckSum field is not where BodyLength says it should be.
    #[error("body length mismatch: declared {declared}, actual {actual}")]
    BodyLengthMismatch {
        /// Exact bytes of the rejected frame.
        frame: Bytes,
        /// MsgType of the frame, when readable.
        msg_type: Option<MsgType>,
        /// BodyLength value found in the header.
        declared: usize,
        /// Body length measured up to the trailer that was found.
        actual: usize,
    },

    /// The CheckSum field value is not three decimal digits.
    #[error("malformed checksum field")]
    MalformedChecksum {
        /// Exact bytes of the rejected frame.
        frame: Bytes,
        /// MsgType of the frame, when readable.
        msg_type: Option<MsgType>,
    },

    /// The declared or buffered message exceeds the configured bound.
    #[error("message too large: {size} bytes exceeds maximum {max_size}")]
    MessageTooLarge {
        /// Size in bytes that triggered the violation.
        size: usize,
        /// Maximum allowed size in bytes.
        max_size: usize,
    },
}

impl FrameError {
    /// Returns the bytes of the rejected frame, if the error consumed one.
    #[must_use]
    pub fn frame(&self) -> Option<&Bytes> {
        match self {
            Self::ChecksumMismatch { frame, .. }
            | Self::BodyLengthMismatch { frame, .. }
            | Self::MalformedChecksum { frame, .. } => Some(frame),
            Self::MessageTooLarge { .. } => None,
        }
    }

    /// Returns the MsgType of the rejected frame, when it could be read.
    #[must_use]
    pub fn msg_type(&self) -> Option<&MsgType> {
        match self {
            Self::ChecksumMismatch { msg_type, .. }
            | Self::BodyLengthMismatch { msg_type, .. }
            | Self::MalformedChecksum { msg_type, .. } => msg_type.as_ref(),
            Self::MessageTooLarge { .. } => None,
        }
    }

    /// Returns true if no ordinary reject can answer this error.
    ///
    /// Oversized input is always fatal. A corrupted Logon is fatal because no
    /// session exists yet to reject against.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::MessageTooLarge { .. } => true,
            _ => matches!(self.msg_type(), Some(MsgType::Logon)),
        }
    }
}

/// Errors that occur while parsing the fields of a FIX message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Message buffer is incomplete, need more data.
    #[error("incomplete message, need more data")]
    Incomplete,

    /// Invalid BeginString field (tag 8).
    #[error("invalid begin string: expected 8=FIX.x.y as first field")]
    InvalidBeginString,

    /// Missing BodyLength field (tag 9).
    #[error("missing body length field (tag 9)")]
    MissingBodyLength,

    /// Invalid BodyLength value.
    #[error("invalid body length value")]
    InvalidBodyLength,

    /// Missing MsgType field (tag 35).
    #[error("missing msg type field (tag 35)")]
    MissingMsgType,

    /// Invalid tag format (not a valid integer).
    #[error("invalid tag format: {0}")]
    InvalidTag(String),

    /// A field has no value.
    #[error("tag {tag} specified without a value")]
    EmptyValue {
        /// The tag number of the empty field.
        tag: u32,
    },

    /// A header tag appeared after the body started.
    #[error("tag {tag} specified out of required order")]
    TagOutOfOrder {
        /// The tag number of the misplaced field.
        tag: u32,
    },

    /// Missing required field.
    #[error("missing required field: tag {tag}")]
    MissingRequiredField {
        /// The tag number of the missing field.
        tag: u32,
    },

    /// Invalid field value for the expected type.
    #[error("invalid field value for tag {tag}: {reason}")]
    InvalidFieldValue {
        /// The tag number of the field.
        tag: u32,
        /// Description of why the value is invalid.
        reason: String,
    },

    /// Invalid UTF-8 in string field.
    #[error("invalid utf-8 in field: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

impl DecodeError {
    /// Returns the tag the error refers to, if any.
    #[must_use]
    pub const fn ref_tag(&self) -> Option<u32> {
        match self {
            Self::InvalidBeginString => Some(8),
            Self::MissingBodyLength | Self::InvalidBodyLength => Some(9),
            Self::MissingMsgType => Some(35),
            Self::EmptyValue { tag }
            | Self::TagOutOfOrder { tag }
            | Self::MissingRequiredField { tag }
            | Self::InvalidFieldValue { tag, .. } => Some(*tag),
            Self::Incomplete | Self::InvalidTag(_) | Self::InvalidUtf8(_) => None,
        }
    }
}

/// Errors that occur during FIX message encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Missing required field during encoding.
    #[error("missing required field: tag {tag}")]
    MissingRequiredField {
        /// The tag number of the missing field.
        tag: u32,
    },

    /// Invalid field value for encoding.
    #[error("invalid field value for tag {tag}: {reason}")]
    InvalidFieldValue {
        /// The tag number of the field.
        tag: u32,
        /// Description of why the value is invalid.
        reason: String,
    },

    /// The output sink failed.
    #[error("write failed: {0}")]
    Io(String),
}

impl From<std::io::Error> for EncodeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Errors in FIX session layer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Session is not in the correct state for the operation.
    #[error("invalid session state: expected {expected}, current {current}")]
    InvalidState {
        /// Expected state for the operation.
        expected: String,
        /// Current session state.
        current: String,
    },

    /// Logon was rejected.
    #[error("logon rejected: {reason}")]
    LogonRejected {
        /// Reason for rejection.
        reason: String,
    },

    /// Heartbeat timeout - no response to TestRequest.
    #[error("heartbeat timeout after {elapsed_ms} milliseconds")]
    HeartbeatTimeout {
        /// Elapsed time in milliseconds since last message.
        elapsed_ms: u64,
    },

    /// Sequence number too low without PossDupFlag.
    #[error("sequence too low: expected >= {expected}, received {received}")]
    SequenceTooLow {
        /// Minimum expected sequence number.
        expected: u64,
        /// Received sequence number.
        received: u64,
    },

    /// Counterparty violated the session protocol.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// The application vetoed an outgoing message.
    #[error("message vetoed by application")]
    DoNotSend,

    /// An application message was persisted but the session is not logged on.
    #[error("session not logged on; message seq={seq_num} stored for resend")]
    NotLoggedOn {
        /// Sequence number assigned to the stored message.
        seq_num: u64,
    },

    /// A connection is already attached to the session.
    #[error("session already has a live connection")]
    AlreadyConnected,

    /// A session with this identity is already registered.
    #[error("duplicate session: {0}")]
    DuplicateSession(String),

    /// No session is configured for the identity.
    #[error("unknown session: {0}")]
    UnknownSession(String),

    /// Session configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Writing to the transport failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Encoding an outgoing message failed.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// The message store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Returns true if the connection must be dropped after this error.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::LogonRejected { .. }
                | Self::HeartbeatTimeout { .. }
                | Self::SequenceTooLow { .. }
                | Self::ProtocolViolation(_)
                | Self::Transport(_)
        )
    }
}

/// Errors in message store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Failed to store message.
    #[error("failed to store message seq={seq_num}: {reason}")]
    StoreFailed {
        /// Sequence number of the message.
        seq_num: u64,
        /// Reason for failure.
        reason: String,
    },

    /// Range of messages not available.
    #[error("messages not available for range: {range:?}")]
    RangeNotAvailable {
        /// The requested range of sequence numbers.
        range: Range<u64>,
    },

    /// Store is corrupted.
    #[error("store corrupted: {reason}")]
    Corrupted {
        /// Description of the corruption.
        reason: String,
    },

    /// I/O error in persistent store.
    #[error("store i/o error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_error_display() {
        let err = FrameError::ChecksumMismatch {
            frame: Bytes::new(),
            msg_type: None,
            calculated: 100,
            declared: 200,
        };
        assert_eq!(
            err.to_string(),
            "checksum mismatch: calculated 100, declared 200"
        );
    }

    #[test]
    fn test_frame_error_fatal_for_logon() {
        let logon = FrameError::ChecksumMismatch {
            frame: Bytes::from_static(b"8=FIX.4.4\x01"),
            msg_type: Some(MsgType::Logon),
            calculated: 1,
            declared: 2,
        };
        assert!(logon.is_fatal());

        let order = FrameError::BodyLengthMismatch {
            frame: Bytes::from_static(b"8=FIX.4.4\x01"),
            msg_type: Some(MsgType::NewOrderSingle),
            declared: 10,
            actual: 12,
        };
        assert!(!order.is_fatal());
        assert!(order.frame().is_some());

        let big = FrameError::MessageTooLarge {
            size: 10,
            max_size: 5,
        };
        assert!(big.is_fatal());
        assert!(big.frame().is_none());
    }

    #[test]
    fn test_fix_error_from_decode() {
        let decode_err = DecodeError::Incomplete;
        let fix_err: FixError = decode_err.into();
        assert!(matches!(fix_err, FixError::Decode(DecodeError::Incomplete)));
    }

    #[test]
    fn test_decode_error_ref_tag() {
        assert_eq!(DecodeError::MissingMsgType.ref_tag(), Some(35));
        assert_eq!(DecodeError::TagOutOfOrder { tag: 49 }.ref_tag(), Some(49));
        assert_eq!(DecodeError::InvalidTag("x".into()).ref_tag(), None);
    }

    #[test]
    fn test_session_error_fatality() {
        assert!(
            SessionError::SequenceTooLow {
                expected: 5,
                received: 3
            }
            .is_fatal()
        );
        assert!(!SessionError::DoNotSend.is_fatal());
        assert!(!SessionError::NotLoggedOn { seq_num: 4 }.is_fatal());
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::RangeNotAvailable { range: 1..5 };
        assert_eq!(err.to_string(), "messages not available for range: 1..5");
    }
}
