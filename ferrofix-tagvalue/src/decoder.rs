/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Zero-copy field parser.
//!
//! Turns a complete frame, as produced by [`Framer`](crate::Framer), into a
//! [`Message`]. Field values are `Bytes` slices of the frame, so parsing
//! allocates only the field list.

use crate::frame::SOH;
use bytes::Bytes;
use ferrofix_core::error::DecodeError;
use ferrofix_core::field::Field;
use ferrofix_core::message::{FieldMap, Message};
use ferrofix_core::tags;
use memchr::memchr;

/// Equals sign delimiter between tag and value.
pub const EQUALS: u8 = b'=';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Body,
    Trailer,
}

/// Sequential field reader over one frame.
#[derive(Debug)]
pub struct Decoder {
    input: Bytes,
    offset: usize,
    /// Data tag expected next and its declared length.
    pending_data: Option<(u32, usize)>,
}

impl Decoder {
    /// Creates a decoder over a frame.
    #[must_use]
    pub fn new(input: Bytes) -> Self {
        Self {
            input,
            offset: 0,
            pending_data: None,
        }
    }

    /// Reads the next field.
    ///
    /// A field following a length field (e.g. RawData after RawDataLength) is
    /// read by the declared length and may contain SOH.
    ///
    /// # Errors
    /// Returns `DecodeError` for a malformed tag, a missing `=`, or an empty value.
    pub fn next_field(&mut self) -> Result<Option<Field>, DecodeError> {
        if self.offset >= self.input.len() {
            return Ok(None);
        }
        let remaining = &self.input[self.offset..];

        let eq_pos = memchr(EQUALS, remaining).ok_or_else(|| {
            DecodeError::InvalidTag(String::from_utf8_lossy(remaining).into_owned())
        })?;
        let tag_bytes = &remaining[..eq_pos];
        let tag = parse_tag(tag_bytes).ok_or_else(|| {
            DecodeError::InvalidTag(String::from_utf8_lossy(tag_bytes).into_owned())
        })?;

        let value_start = self.offset + eq_pos + 1;
        let value_end = match self.pending_data.take() {
            Some((data_tag, len)) if data_tag == tag => {
                let end = value_start
                    .checked_add(len)
                    .filter(|&end| end < self.input.len())
                    .ok_or_else(|| DecodeError::InvalidFieldValue {
                        tag,
                        reason: format!("data length {} runs past the frame", len),
                    })?;
                if self.input[end] != SOH {
                    return Err(DecodeError::InvalidFieldValue {
                        tag,
                        reason: format!("data length {} does not end at a delimiter", len),
                    });
                }
                end
            }
            _ => {
                let soh = memchr(SOH, &self.input[value_start..]).ok_or(DecodeError::Incomplete)?;
                value_start + soh
            }
        };

        if value_end == value_start {
            return Err(DecodeError::EmptyValue { tag });
        }
        let value = self.input.slice(value_start..value_end);
        self.offset = value_end + 1;

        if let Some(data_tag) = tags::data_tag_for(tag) {
            let field = Field::new(tag, value.clone());
            let len = field.as_u64().map_err(|_| DecodeError::InvalidFieldValue {
                tag,
                reason: "length field is not a number".to_string(),
            })?;
            let len = usize::try_from(len).map_err(|_| DecodeError::InvalidFieldValue {
                tag,
                reason: format!("length {} is too large", len),
            })?;
            self.pending_data = Some((data_tag, len));
            return Ok(Some(field));
        }

        Ok(Some(Field::new(tag, value)))
    }

    /// Parses the whole frame into a message.
    ///
    /// The first three fields must be BeginString, BodyLength and MsgType.
    /// Header tags after the body has started are rejected as out of order.
    ///
    /// # Errors
    /// Returns `DecodeError` describing the first problem found.
    pub fn decode(mut self) -> Result<Message, DecodeError> {
        let mut header = FieldMap::new();
        let mut body = FieldMap::new();
        let mut trailer = FieldMap::new();

        let begin = self.next_field()?.ok_or(DecodeError::InvalidBeginString)?;
        if begin.tag != tags::BEGIN_STRING {
            return Err(DecodeError::InvalidBeginString);
        }
        header.add(begin);

        let length = self.next_field()?.ok_or(DecodeError::MissingBodyLength)?;
        if length.tag != tags::BODY_LENGTH {
            return Err(DecodeError::MissingBodyLength);
        }
        length
            .as_u64()
            .map_err(|_| DecodeError::InvalidBodyLength)?;
        header.add(length);

        let msg_type = self.next_field()?.ok_or(DecodeError::MissingMsgType)?;
        if msg_type.tag != tags::MSG_TYPE {
            return Err(DecodeError::MissingMsgType);
        }
        header.add(msg_type);

        let mut section = Section::Header;
        while let Some(field) = self.next_field()? {
            let tag = field.tag;
            if tags::is_header_tag(tag) {
                if section != Section::Header {
                    return Err(DecodeError::TagOutOfOrder { tag });
                }
                header.add(field);
            } else if tags::is_trailer_tag(tag) {
                section = Section::Trailer;
                trailer.add(field);
            } else {
                if section == Section::Trailer {
                    return Err(DecodeError::TagOutOfOrder { tag });
                }
                section = Section::Body;
                body.add(field);
            }
        }

        Ok(Message::from_parts(header, body, trailer, self.input))
    }
}

/// Parses a complete frame into a [`Message`].
///
/// # Errors
/// See [`Decoder::decode`].
pub fn parse_message(frame: Bytes) -> Result<Message, DecodeError> {
    Decoder::new(frame).decode()
}

/// Finds a field value in a frame without parsing the rest of it.
///
/// Used on frames the framer rejected, where a full parse may fail.
#[must_use]
pub fn peek_field(frame: &[u8], tag: u32) -> Option<&[u8]> {
    let mut buf = itoa::Buffer::new();
    let tag_str = buf.format(tag).as_bytes();
    let mut offset = 0;
    while offset < frame.len() {
        let rest = &frame[offset..];
        let end = memchr(SOH, rest).unwrap_or(rest.len());
        let field = &rest[..end];
        if let Some(value) = field
            .strip_prefix(tag_str)
            .and_then(|v| v.strip_prefix(b"="))
        {
            return Some(value);
        }
        offset += end + 1;
    }
    None
}

/// Parses a tag number from ASCII digits.
#[inline]
fn parse_tag(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }
    let mut result: u32 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        result = result.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
    }
    (result > 0).then_some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrofix_core::message::MsgType;

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag(b"8"), Some(8));
        assert_eq!(parse_tag(b"12345"), Some(12345));
        assert_eq!(parse_tag(b""), None);
        assert_eq!(parse_tag(b"0"), None);
        assert_eq!(parse_tag(b"12a"), None);
    }

    #[test]
    fn test_parse_heartbeat_example() {
        let frame = Bytes::from_static(b"8=FIX.4.2\x019=12\x0135=X\x01108=30\x0110=049\x01");
        let msg = parse_message(frame.clone()).unwrap();
        assert_eq!(msg.msg_type(), Some(MsgType::MarketDataIncrementalRefresh));
        assert_eq!(msg.header.get_u64(tags::BODY_LENGTH), Some(12));
        assert_eq!(msg.body.get_u64(tags::HEART_BT_INT), Some(30));
        assert_eq!(msg.trailer.get_str(tags::CHECKSUM), Some("049"));
        assert_eq!(msg.raw(), Some(&frame));
    }

    #[test]
    fn test_sections_classified() {
        let frame = Bytes::from_static(
            b"8=FIX.4.4\x019=40\x0135=D\x0149=A\x0156=B\x0134=2\x0111=X\x0155=IBM\x0110=000\x01",
        );
        let msg = parse_message(frame).unwrap();
        let header: Vec<u32> = msg.header.iter().map(|f| f.tag).collect();
        assert_eq!(header, vec![8, 9, 35, 49, 56, 34]);
        let body: Vec<u32> = msg.body.iter().map(|f| f.tag).collect();
        assert_eq!(body, vec![11, 55]);
        assert_eq!(msg.trailer.len(), 1);
    }

    #[test]
    fn test_header_tag_after_body_is_out_of_order() {
        let frame = Bytes::from_static(b"8=FIX.4.4\x019=20\x0135=D\x0111=X\x0149=A\x0110=000\x01");
        assert_eq!(
            parse_message(frame).unwrap_err(),
            DecodeError::TagOutOfOrder { tag: 49 }
        );
    }

    #[test]
    fn test_first_fields_must_be_standard() {
        let no_begin = Bytes::from_static(b"9=5\x0135=0\x0110=000\x01");
        assert_eq!(
            parse_message(no_begin).unwrap_err(),
            DecodeError::InvalidBeginString
        );
        let no_type = Bytes::from_static(b"8=FIX.4.4\x019=5\x0134=1\x0110=000\x01");
        assert_eq!(parse_message(no_type).unwrap_err(), DecodeError::MissingMsgType);
    }

    #[test]
    fn test_empty_value_and_bad_tag() {
        let empty = Bytes::from_static(b"8=FIX.4.4\x019=5\x0135=0\x0158=\x0110=000\x01");
        assert_eq!(
            parse_message(empty).unwrap_err(),
            DecodeError::EmptyValue { tag: 58 }
        );
        let bad_tag = Bytes::from_static(b"8=FIX.4.4\x019=5\x0135=0\x01x8=1\x0110=000\x01");
        assert!(matches!(
            parse_message(bad_tag).unwrap_err(),
            DecodeError::InvalidTag(_)
        ));
    }

    #[test]
    fn test_data_field_with_soh() {
        let frame = Bytes::from_static(
            b"8=FIX.4.4\x019=21\x0135=B\x0195=5\x0196=ab\x01cd\x0158=ok\x0110=000\x01",
        );
        let msg = parse_message(frame).unwrap();
        assert_eq!(msg.body.get(tags::RAW_DATA).unwrap().as_bytes(), b"ab\x01cd");
        assert_eq!(msg.body.get_str(tags::TEXT), Some("ok"));
    }

    #[test]
    fn test_data_length_past_frame_is_rejected() {
        let huge = Bytes::from_static(
            b"8=FIX.4.4\x019=40\x0135=B\x0195=18446744073709551612\x0196=ab\x0110=000\x01",
        );
        assert!(matches!(
            parse_message(huge).unwrap_err(),
            DecodeError::InvalidFieldValue { tag: 96, .. }
        ));

        let long = Bytes::from_static(b"8=FIX.4.4\x019=21\x0135=B\x0195=50\x0196=ab\x0110=000\x01");
        assert!(matches!(
            parse_message(long).unwrap_err(),
            DecodeError::InvalidFieldValue { tag: 96, .. }
        ));
    }

    #[test]
    fn test_peek_field() {
        let frame = b"8=FIX.4.4\x019=5\x0135=D\x0134=17\x01134=9\x0110=000\x01";
        assert_eq!(peek_field(frame, 34), Some(&b"17"[..]));
        assert_eq!(peek_field(frame, 134), Some(&b"9"[..]));
        assert_eq!(peek_field(frame, 52), None);
    }
}
