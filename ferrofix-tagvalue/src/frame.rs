/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Stream framing.
//!
//! [`Framer`] extracts complete FIX messages from an accumulating byte
//! buffer. It only looks at the BeginString, BodyLength and CheckSum fields;
//! everything between them is passed through untouched.

use crate::checksum::{calculate_checksum, parse_checksum};
use bytes::{Buf, Bytes, BytesMut};
use ferrofix_core::error::FrameError;
use ferrofix_core::message::MsgType;
use memchr::{memchr, memmem};

/// SOH (Start of Header) delimiter used in FIX messages.
pub const SOH: u8 = 0x01;

/// Every BeginString (FIX.4.x and FIXT.1.1) starts with this.
const BEGIN_PREFIX: &[u8] = b"8=FIX";

/// `10=ddd` plus its SOH.
pub const TRAILER_LEN: usize = 7;

/// Default upper bound on a single message.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Longest BeginString value we accept before giving up on a candidate header.
const MAX_BEGIN_STRING_LEN: usize = 16;

/// Longest BodyLength digit run.
const MAX_BODY_LENGTH_DIGITS: usize = 9;

enum Broken {
    MalformedChecksum,
    Mismatch { calculated: u8, declared: u8 },
}

enum Header {
    Incomplete,
    Malformed,
    Complete { header_end: usize, body_length: usize },
}

/// Splits complete FIX messages off a byte stream.
///
/// One framer belongs to one connection; it keeps no state between calls
/// besides its settings, so all buffering lives in the caller's `BytesMut`.
#[derive(Debug, Clone, Copy)]
pub struct Framer {
    validate_checksum: bool,
    max_message_size: usize,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer {
    /// Creates a framer that validates checksums and uses the default size bound.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            validate_checksum: true,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Sets whether checksums are verified.
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }

    /// Sets the maximum size of a single message in bytes.
    #[must_use]
    pub const fn with_max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self
    }

    /// Returns the configured maximum message size.
    #[must_use]
    pub const fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Extracts the next complete frame from `buf`.
    ///
    /// Returns `Ok(None)` when more bytes are needed. Bytes preceding a
    /// recognisable header are discarded, except a trailing partial `8=FIX`
    /// prefix which is kept for the next call. A header whose declared frame
    /// does not check out is dropped as garbage when another header starts
    /// inside that frame.
    ///
    /// # Errors
    /// A checksum or body length mismatch consumes the broken frame and
    /// returns it inside the error. Oversized input returns
    /// [`FrameError::MessageTooLarge`] and leaves the buffer untouched.
    pub fn decode(&self, buf: &mut BytesMut) -> Result<Option<Bytes>, FrameError> {
        loop {
            match memmem::find(&buf[..], BEGIN_PREFIX) {
                Some(0) => {}
                Some(pos) => buf.advance(pos),
                None => {
                    let keep = partial_prefix_len(&buf[..]);
                    let discard = buf.len() - keep;
                    buf.advance(discard);
                    return Ok(None);
                }
            }

            let (header_end, body_length) = match parse_header(&buf[..]) {
                Header::Complete {
                    header_end,
                    body_length,
                } => (header_end, body_length),
                Header::Incomplete => return Ok(None),
                Header::Malformed => {
                    buf.advance(1);
                    continue;
                }
            };

            let trailer_start = header_end + body_length;
            let total = trailer_start + TRAILER_LEN;
            let sized = total <= self.max_message_size;

            if sized && buf.len() >= total && is_trailer(&buf[trailer_start..total]) {
                let verdict = self.verify(&buf[..total], trailer_start);
                // A bad checksum around a clean frame means this header was garbage.
                if verdict.is_err()
                    && let Some(pos) = self.embedded_frame(&buf[..], trailer_start)
                {
                    buf.advance(pos);
                    continue;
                }
                let frame = buf.split_to(total).freeze();
                return match verdict {
                    Ok(()) => Ok(Some(frame)),
                    Err(Broken::MalformedChecksum) => Err(FrameError::MalformedChecksum {
                        msg_type: peek_msg_type(&frame, header_end),
                        frame,
                    }),
                    Err(Broken::Mismatch {
                        calculated,
                        declared,
                    }) => Err(FrameError::ChecksumMismatch {
                        msg_type: peek_msg_type(&frame, header_end),
                        frame,
                        calculated,
                        declared,
                    }),
                };
            }

            let located = find_trailer(&buf[..], header_end);
            if let Some(end) = located {
                let body_end = end - TRAILER_LEN;
                let resync = if sized && buf.len() >= total {
                    // The declared trailer is known to be wrong: any later
                    // header inside the span starts the next frame.
                    memmem::find(&buf[1..body_end], BEGIN_PREFIX).map(|pos| pos + 1)
                } else {
                    self.embedded_frame(&buf[..], body_end)
                };
                if let Some(pos) = resync {
                    buf.advance(pos);
                    continue;
                }
            }

            if !sized {
                return Err(FrameError::MessageTooLarge {
                    size: total,
                    max_size: self.max_message_size,
                });
            }
            if buf.len() < total {
                return Ok(None);
            }

            return match located {
                Some(end) => {
                    let frame = buf.split_to(end).freeze();
                    let actual = end - TRAILER_LEN - header_end;
                    Err(FrameError::BodyLengthMismatch {
                        msg_type: peek_msg_type(&frame, header_end),
                        frame,
                        declared: body_length,
                        actual,
                    })
                }
                None if buf.len() > self.max_message_size => Err(FrameError::MessageTooLarge {
                    size: buf.len(),
                    max_size: self.max_message_size,
                }),
                None => Ok(None),
            };
        }
    }

    fn verify(&self, frame: &[u8], trailer_start: usize) -> Result<(), Broken> {
        let declared = parse_checksum(&frame[trailer_start + 3..trailer_start + 6])
            .ok_or(Broken::MalformedChecksum)?;
        if self.validate_checksum {
            let calculated = calculate_checksum(&frame[..trailer_start]);
            if calculated != declared {
                return Err(Broken::Mismatch {
                    calculated,
                    declared,
                });
            }
        }
        Ok(())
    }

    /// Offset of the first header in `buf[1..limit]` that frames a complete,
    /// valid message.
    fn embedded_frame(&self, buf: &[u8], limit: usize) -> Option<usize> {
        memmem::find_iter(&buf[1..limit], BEGIN_PREFIX)
            .map(|pos| pos + 1)
            .find(|&pos| self.frames_cleanly(&buf[pos..]))
    }

    fn frames_cleanly(&self, candidate: &[u8]) -> bool {
        let Header::Complete {
            header_end,
            body_length,
        } = parse_header(candidate)
        else {
            return false;
        };
        let trailer_start = header_end + body_length;
        let total = trailer_start + TRAILER_LEN;
        total <= self.max_message_size
            && candidate.len() >= total
            && is_trailer(&candidate[trailer_start..total])
            && self.verify(&candidate[..total], trailer_start).is_ok()
    }
}

/// Parses `8=FIX...<SOH>9=<digits><SOH>` at the start of `buf`.
fn parse_header(buf: &[u8]) -> Header {
    let Some(begin_len) = memchr(SOH, &buf[2..]) else {
        let partial = &buf[2..];
        return if partial.len() > MAX_BEGIN_STRING_LEN || !is_begin_string(partial, false) {
            Header::Malformed
        } else {
            Header::Incomplete
        };
    };
    if begin_len > MAX_BEGIN_STRING_LEN || !is_begin_string(&buf[2..2 + begin_len], true) {
        return Header::Malformed;
    }

    let len_field = 2 + begin_len + 1;
    let rest = &buf[len_field..];
    if rest.len() < 2 {
        return if rest.is_empty() || rest[0] == b'9' {
            Header::Incomplete
        } else {
            Header::Malformed
        };
    }
    if &rest[..2] != b"9=" {
        return Header::Malformed;
    }

    let digits = &rest[2..];
    let mut body_length: usize = 0;
    for (i, &b) in digits.iter().enumerate() {
        if b == SOH {
            if i == 0 {
                return Header::Malformed;
            }
            return Header::Complete {
                header_end: len_field + 2 + i + 1,
                body_length,
            };
        }
        if !b.is_ascii_digit() || i >= MAX_BODY_LENGTH_DIGITS {
            return Header::Malformed;
        }
        body_length = body_length * 10 + usize::from(b - b'0');
    }
    Header::Incomplete
}

/// Checks `FIX.<n>.<n>` or `FIXT.<n>.<n>`. With `complete` false, `value` only
/// has to be a prefix of such a string.
fn is_begin_string(value: &[u8], complete: bool) -> bool {
    let Some(version) = value
        .strip_prefix(b"FIXT.")
        .or_else(|| value.strip_prefix(b"FIX."))
    else {
        return !complete && (b"FIXT.".starts_with(value) || b"FIX.".starts_with(value));
    };
    let digits = |part: &[u8]| part.iter().all(u8::is_ascii_digit);
    let mut parts = version.splitn(2, |&b| b == b'.');
    let major = parts.next().unwrap_or_default();
    match parts.next() {
        None => !complete && digits(major),
        Some(minor) => {
            !major.is_empty() && digits(major) && digits(minor) && (!complete || !minor.is_empty())
        }
    }
}

/// Returns true for exactly `10=ddd<SOH>`.
fn is_trailer(bytes: &[u8]) -> bool {
    bytes.len() == TRAILER_LEN
        && bytes.starts_with(b"10=")
        && bytes[3..6].iter().all(u8::is_ascii_digit)
        && bytes[6] == SOH
}

/// Locates the end of the first `<SOH>10=ddd<SOH>` after the header.
fn find_trailer(buf: &[u8], header_end: usize) -> Option<usize> {
    let search_from = header_end - 1;
    let mut offset = search_from;
    while let Some(pos) = memmem::find(&buf[offset..], b"\x0110=") {
        let start = offset + pos + 1;
        let end = start + TRAILER_LEN;
        if end > buf.len() {
            return None;
        }
        if is_trailer(&buf[start..end]) {
            return Some(end);
        }
        offset = start;
    }
    None
}

/// Length of the longest suffix of `buf` that could begin a header.
fn partial_prefix_len(buf: &[u8]) -> usize {
    (1..BEGIN_PREFIX.len())
        .rev()
        .find(|&k| buf.ends_with(&BEGIN_PREFIX[..k]))
        .unwrap_or(0)
}

/// Reads MsgType from a frame whose first body field should be tag 35.
fn peek_msg_type(frame: &[u8], header_end: usize) -> Option<MsgType> {
    let body = frame.get(header_end..)?;
    let value = body.strip_prefix(b"35=")?;
    let end = memchr(SOH, value)?;
    Some(MsgType::from_bytes(&value[..end]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEARTBEAT: &[u8] = b"8=FIX.4.2\x019=12\x0135=X\x01108=30\x0110=049\x01";

    fn framer() -> Framer {
        Framer::new()
    }

    #[test]
    fn test_single_frame() {
        let mut buf = BytesMut::from(HEARTBEAT);
        let frame = framer().decode(&mut buf).unwrap().unwrap();
        assert_eq!(&frame[..], HEARTBEAT);
        assert!(buf.is_empty());
        assert!(framer().decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_need_more_data_until_complete() {
        let mut buf = BytesMut::new();
        for (i, &b) in HEARTBEAT.iter().enumerate() {
            buf.extend_from_slice(&[b]);
            let result = framer().decode(&mut buf).unwrap();
            if i + 1 < HEARTBEAT.len() {
                assert!(result.is_none(), "frame emitted early at byte {}", i);
            } else {
                assert_eq!(&result.unwrap()[..], HEARTBEAT);
            }
        }
    }

    #[test]
    fn test_two_frames_in_one_buffer() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(HEARTBEAT);
        buf.extend_from_slice(HEARTBEAT);
        assert!(framer().decode(&mut buf).unwrap().is_some());
        assert!(framer().decode(&mut buf).unwrap().is_some());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_garbage_prefix_skipped() {
        let mut buf = BytesMut::from(&b"garbage\x01\x0299=1"[..]);
        buf.extend_from_slice(HEARTBEAT);
        let frame = framer().decode(&mut buf).unwrap().unwrap();
        assert_eq!(&frame[..], HEARTBEAT);
    }

    #[test]
    fn test_partial_prefix_kept() {
        let mut buf = BytesMut::from(&b"noise8=F"[..]);
        assert!(framer().decode(&mut buf).unwrap().is_none());
        assert_eq!(&buf[..], b"8=F");
        buf.extend_from_slice(&HEARTBEAT[3..]);
        assert_eq!(&framer().decode(&mut buf).unwrap().unwrap()[..], HEARTBEAT);
    }

    #[test]
    fn test_malformed_header_resyncs() {
        let mut buf = BytesMut::from(&b"8=FIX.4.2\x019=abc\x01"[..]);
        buf.extend_from_slice(HEARTBEAT);
        let frame = framer().decode(&mut buf).unwrap().unwrap();
        assert_eq!(&frame[..], HEARTBEAT);
    }

    #[test]
    fn test_checksum_mismatch_consumes_frame() {
        let bad = b"8=FIX.4.2\x019=12\x0135=X\x01108=30\x0110=050\x01";
        let mut buf = BytesMut::from(&bad[..]);
        buf.extend_from_slice(HEARTBEAT);

        match framer().decode(&mut buf) {
            Err(FrameError::ChecksumMismatch {
                frame,
                msg_type,
                calculated,
                declared,
            }) => {
                assert_eq!(&frame[..], &bad[..]);
                assert_eq!(msg_type, Some(MsgType::MarketDataIncrementalRefresh));
                assert_eq!(calculated, 49);
                assert_eq!(declared, 50);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(&framer().decode(&mut buf).unwrap().unwrap()[..], HEARTBEAT);
    }

    fn drain(buf: &mut BytesMut) -> Vec<Bytes> {
        let mut frames = Vec::new();
        while let Some(frame) = framer().decode(buf).unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_truncated_begin_string_does_not_hide_next_frame() {
        for fragment in [&b"8=FIX.4"[..], b"8=FIX", b"8=FIXT.1", b"8=FIX.4.2", b"8=FIX."] {
            let mut buf = BytesMut::from(fragment);
            buf.extend_from_slice(HEARTBEAT);
            let frame = framer().decode(&mut buf).unwrap().unwrap();
            assert_eq!(&frame[..], HEARTBEAT, "after {:?}", fragment);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_begin_string_shape() {
        assert!(is_begin_string(b"FIX.4.2", true));
        assert!(is_begin_string(b"FIXT.1.1", true));
        assert!(is_begin_string(b"FIX.4", false));
        assert!(!is_begin_string(b"FIX.4", true));
        assert!(!is_begin_string(b"FIX.48=FIX.4.2", true));
        assert!(!is_begin_string(b"FIXQ", false));
    }

    #[test]
    fn test_wrong_body_length_fragment_resyncs() {
        let fragment = b"8=FIX.4.2\x019=40\x0135=D\x0149=A";

        // Declared frame end lies beyond the buffer.
        let mut buf = BytesMut::from(&fragment[..]);
        buf.extend_from_slice(HEARTBEAT);
        assert_eq!(drain(&mut buf), vec![Bytes::from_static(HEARTBEAT)]);

        // Declared frame end lies inside the following message.
        let mut buf = BytesMut::from(&fragment[..]);
        buf.extend_from_slice(HEARTBEAT);
        buf.extend_from_slice(HEARTBEAT);
        assert_eq!(
            drain(&mut buf),
            vec![Bytes::from_static(HEARTBEAT), Bytes::from_static(HEARTBEAT)]
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_garbage_header_ending_on_real_trailer_resyncs() {
        // Declared length 32 puts the trailer exactly on the heartbeat's own.
        let mut buf = BytesMut::from(&b"8=FIX.4.2\x019=32\x0135=D\x01"[..]);
        buf.extend_from_slice(HEARTBEAT);
        assert_eq!(drain(&mut buf), vec![Bytes::from_static(HEARTBEAT)]);
    }

    #[test]
    fn test_checksum_validation_disabled() {
        let bad = b"8=FIX.4.2\x019=12\x0135=X\x01108=30\x0110=050\x01";
        let mut buf = BytesMut::from(&bad[..]);
        let lenient = framer().with_checksum_validation(false);
        assert!(lenient.decode(&mut buf).unwrap().is_some());
    }

    #[test]
    fn test_body_length_mismatch_locates_trailer() {
        let bad = b"8=FIX.4.2\x019=10\x0135=0\x01112=TEST\x0110=000\x01";
        let mut buf = BytesMut::from(&bad[..]);
        buf.extend_from_slice(HEARTBEAT);

        match framer().decode(&mut buf) {
            Err(FrameError::BodyLengthMismatch {
                frame,
                msg_type,
                declared,
                actual,
            }) => {
                assert_eq!(&frame[..], &bad[..]);
                assert_eq!(msg_type, Some(MsgType::Heartbeat));
                assert_eq!(declared, 10);
                assert_eq!(actual, 14);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(&framer().decode(&mut buf).unwrap().unwrap()[..], HEARTBEAT);
    }

    #[test]
    fn test_declared_length_too_large() {
        let mut buf = BytesMut::from(&b"8=FIX.4.2\x019=999999\x0135=0\x01"[..]);
        let small = framer().with_max_message_size(1024);
        assert!(matches!(
            small.decode(&mut buf),
            Err(FrameError::MessageTooLarge { max_size: 1024, .. })
        ));
    }

    #[test]
    fn test_logon_corruption_is_fatal() {
        let bad = b"8=FIX.4.2\x019=5\x0135=A\x0110=000\x01";
        let mut buf = BytesMut::from(&bad[..]);
        let err = framer().decode(&mut buf).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_fixt_begin_string() {
        let body = b"35=0\x01";
        let mut frame = format!("8=FIXT.1.1\x019={}\x01", body.len()).into_bytes();
        frame.extend_from_slice(body);
        let sum = calculate_checksum(&frame);
        frame.extend_from_slice(format!("10={:03}\x01", sum).as_bytes());

        let mut buf = BytesMut::from(&frame[..]);
        assert_eq!(&framer().decode(&mut buf).unwrap().unwrap()[..], &frame[..]);
    }
}
