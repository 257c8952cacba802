/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Field types for FIX protocol messages.
//!
//! A [`Field`] is a tag plus the raw value bytes exactly as they appeared on
//! the wire. Decoded messages hold their values as zero-copy slices of the
//! received frame; typed interpretation happens on demand.

use crate::error::DecodeError;
use crate::types::Timestamp;
use bytes::Bytes;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single `tag=value` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    /// The field tag number.
    pub tag: u32,
    /// Raw value bytes (without delimiters).
    pub value: Bytes,
}

impl Field {
    /// Creates a field from any byte source.
    #[inline]
    #[must_use]
    pub fn new(tag: u32, value: impl Into<Bytes>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    /// Creates a field from a string value.
    #[inline]
    #[must_use]
    pub fn from_str_value(tag: u32, value: &str) -> Self {
        Self::new(tag, Bytes::copy_from_slice(value.as_bytes()))
    }

    /// Creates a field holding an unsigned integer.
    #[must_use]
    pub fn from_u64(tag: u32, value: u64) -> Self {
        let mut buf = itoa::Buffer::new();
        Self::from_str_value(tag, buf.format(value))
    }

    /// Creates a field holding a signed integer.
    #[must_use]
    pub fn from_i64(tag: u32, value: i64) -> Self {
        let mut buf = itoa::Buffer::new();
        Self::from_str_value(tag, buf.format(value))
    }

    /// Creates a `Y`/`N` field.
    #[must_use]
    pub fn from_bool(tag: u32, value: bool) -> Self {
        Self::new(tag, Bytes::from_static(if value { b"Y" } else { b"N" }))
    }

    /// Returns the value as a string slice.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidUtf8` if the value is not valid UTF-8.
    pub fn as_str(&self) -> Result<&str, DecodeError> {
        std::str::from_utf8(&self.value).map_err(DecodeError::from)
    }

    /// Parses the value as the specified type.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidFieldValue` if parsing fails.
    pub fn parse<T: FromStr>(&self) -> Result<T, DecodeError> {
        let s = self.as_str()?;
        s.parse().map_err(|_| DecodeError::InvalidFieldValue {
            tag: self.tag,
            reason: format!("failed to parse '{}' as {}", s, std::any::type_name::<T>()),
        })
    }

    /// Returns the value as a u64.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidFieldValue` if the value is not a valid integer.
    pub fn as_u64(&self) -> Result<u64, DecodeError> {
        self.parse()
    }

    /// Returns the value as an i64.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidFieldValue` if the value is not a valid integer.
    pub fn as_i64(&self) -> Result<i64, DecodeError> {
        self.parse()
    }

    /// Returns the value as a Decimal.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidFieldValue` if the value is not a valid decimal.
    pub fn as_decimal(&self) -> Result<Decimal, DecodeError> {
        self.parse()
    }

    /// Returns the value as a bool (FIX uses 'Y'/'N').
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidFieldValue` if the value is not 'Y' or 'N'.
    pub fn as_bool(&self) -> Result<bool, DecodeError> {
        match self.value.as_ref() {
            b"Y" => Ok(true),
            b"N" => Ok(false),
            _ => Err(DecodeError::InvalidFieldValue {
                tag: self.tag,
                reason: "expected 'Y' or 'N'".to_string(),
            }),
        }
    }

    /// Returns the value as a single character.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidFieldValue` if the value is not a single ASCII character.
    pub fn as_char(&self) -> Result<char, DecodeError> {
        match self.value.as_ref() {
            [c] if c.is_ascii() => Ok(*c as char),
            _ => Err(DecodeError::InvalidFieldValue {
                tag: self.tag,
                reason: "expected single ASCII character".to_string(),
            }),
        }
    }

    /// Returns the value as a UTC timestamp.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidFieldValue` if the value is not a FIX UTCTimestamp.
    pub fn as_timestamp(&self) -> Result<Timestamp, DecodeError> {
        let s = self.as_str()?;
        Timestamp::parse(s).ok_or_else(|| DecodeError::InvalidFieldValue {
            tag: self.tag,
            reason: format!("'{}' is not a UTCTimestamp", s),
        })
    }

    /// Returns the raw bytes of the value.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.value
    }

    /// Returns the number of bytes this field occupies on the wire,
    /// including the `=` and the SOH delimiter.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        tag_digits(self.tag) + 1 + self.value.len() + 1
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.tag, String::from_utf8_lossy(&self.value))
    }
}

/// Number of decimal digits in a tag number.
#[inline]
#[must_use]
pub const fn tag_digits(mut tag: u32) -> usize {
    let mut digits = 1;
    while tag >= 10 {
        tag /= 10;
        digits += 1;
    }
    digits
}

/// A field value interpreted according to its dictionary type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// String value.
    String(String),
    /// Integer value.
    Int(i64),
    /// Unsigned integer value.
    UInt(u64),
    /// Decimal/float value.
    Decimal(Decimal),
    /// Boolean value (Y/N).
    Bool(bool),
    /// Single character value.
    Char(char),
    /// UTC timestamp.
    Timestamp(Timestamp),
    /// Raw bytes (for data fields).
    Data(Bytes),
}

impl FieldValue {
    /// Returns the value as a string, if it is a String variant.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an i64, if it is an Int variant.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a u64, if it is a UInt variant.
    #[must_use]
    pub const fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a bool, if it is a Bool variant.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s),
            Self::Int(v) => write!(f, "{}", v),
            Self::UInt(v) => write!(f, "{}", v),
            Self::Decimal(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", if *v { "Y" } else { "N" }),
            Self::Char(c) => write!(f, "{}", c),
            Self::Timestamp(ts) => write!(f, "{}", ts),
            Self::Data(d) => write!(f, "<{} bytes>", d.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_as_str() {
        let field = Field::from_str_value(11, "ORDER123");
        assert_eq!(field.as_str().unwrap(), "ORDER123");
    }

    #[test]
    fn test_field_numeric() {
        let field = Field::from_u64(34, 12345);
        assert_eq!(field.as_u64().unwrap(), 12345);
        assert_eq!(field.as_bytes(), b"12345");

        let neg = Field::from_i64(1, -7);
        assert_eq!(neg.as_i64().unwrap(), -7);
        assert!(Field::from_str_value(34, "abc").as_u64().is_err());
    }

    #[test]
    fn test_field_as_bool() {
        assert!(Field::from_bool(141, true).as_bool().unwrap());
        assert!(!Field::from_bool(141, false).as_bool().unwrap());
        assert!(Field::from_str_value(141, "X").as_bool().is_err());
    }

    #[test]
    fn test_field_as_char() {
        assert_eq!(Field::from_str_value(54, "1").as_char().unwrap(), '1');
        assert!(Field::from_str_value(54, "12").as_char().is_err());
    }

    #[test]
    fn test_field_as_timestamp() {
        let field = Field::from_str_value(52, "20240115-10:30:00.123");
        let ts = field.as_timestamp().unwrap();
        assert_eq!(ts.format_millis().as_str(), "20240115-10:30:00.123");
        assert!(Field::from_str_value(52, "yesterday").as_timestamp().is_err());
    }

    #[test]
    fn test_field_invalid_utf8() {
        let field = Field::new(1, vec![0xFF, 0xFE]);
        assert!(field.as_str().is_err());
    }

    #[test]
    fn test_wire_len() {
        assert_eq!(Field::from_str_value(35, "A").wire_len(), "35=A\x01".len());
        assert_eq!(tag_digits(5), 1);
        assert_eq!(tag_digits(10), 2);
        assert_eq!(tag_digits(9999), 4);
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::String("test".to_string()).to_string(), "test");
        assert_eq!(FieldValue::Int(42).to_string(), "42");
        assert_eq!(FieldValue::Bool(true).to_string(), "Y");
        assert_eq!(FieldValue::Data(Bytes::from_static(b"abc")).to_string(), "<3 bytes>");
    }
}
