/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Message model for FIX protocol.
//!
//! A [`Message`] is three ordered [`FieldMap`]s (header, body, trailer).
//! Decoded messages also keep the exact frame they were parsed from, so a
//! received message can be stored or forwarded byte for byte.

use crate::field::Field;
use crate::tags;
use crate::types::Timestamp;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Standard FIX message types.
///
/// Types not listed here are carried as `Custom(String)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MsgType {
    /// Heartbeat (0) - Session level.
    #[default]
    Heartbeat,
    /// Test Request (1) - Session level.
    TestRequest,
    /// Resend Request (2) - Session level.
    ResendRequest,
    /// Reject (3) - Session level.
    Reject,
    /// Sequence Reset (4) - Session level.
    SequenceReset,
    /// Logout (5) - Session level.
    Logout,
    /// Execution Report (8).
    ExecutionReport,
    /// Order Cancel Reject (9).
    OrderCancelReject,
    /// Logon (A) - Session level.
    Logon,
    /// News (B).
    News,
    /// New Order Single (D).
    NewOrderSingle,
    /// Order Cancel Request (F).
    OrderCancelRequest,
    /// Order Cancel/Replace Request (G).
    OrderCancelReplaceRequest,
    /// Order Status Request (H).
    OrderStatusRequest,
    /// Quote Request (R).
    QuoteRequest,
    /// Quote (S).
    Quote,
    /// Market Data Request (V).
    MarketDataRequest,
    /// Market Data Snapshot/Full Refresh (W).
    MarketDataSnapshotFullRefresh,
    /// Market Data Incremental Refresh (X).
    MarketDataIncrementalRefresh,
    /// Business Message Reject (j).
    BusinessMessageReject,
    /// Custom or unknown message type.
    Custom(String),
}

impl std::str::FromStr for MsgType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "0" => Self::Heartbeat,
            "1" => Self::TestRequest,
            "2" => Self::ResendRequest,
            "3" => Self::Reject,
            "4" => Self::SequenceReset,
            "5" => Self::Logout,
            "8" => Self::ExecutionReport,
            "9" => Self::OrderCancelReject,
            "A" => Self::Logon,
            "B" => Self::News,
            "D" => Self::NewOrderSingle,
            "F" => Self::OrderCancelRequest,
            "G" => Self::OrderCancelReplaceRequest,
            "H" => Self::OrderStatusRequest,
            "R" => Self::QuoteRequest,
            "S" => Self::Quote,
            "V" => Self::MarketDataRequest,
            "W" => Self::MarketDataSnapshotFullRefresh,
            "X" => Self::MarketDataIncrementalRefresh,
            "j" => Self::BusinessMessageReject,
            other => Self::Custom(other.to_string()),
        })
    }
}

impl MsgType {
    /// Interprets raw tag 35 bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let s = String::from_utf8_lossy(bytes);
        match s.parse() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }

    /// Returns the string representation of this message type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Heartbeat => "0",
            Self::TestRequest => "1",
            Self::ResendRequest => "2",
            Self::Reject => "3",
            Self::SequenceReset => "4",
            Self::Logout => "5",
            Self::ExecutionReport => "8",
            Self::OrderCancelReject => "9",
            Self::Logon => "A",
            Self::News => "B",
            Self::NewOrderSingle => "D",
            Self::OrderCancelRequest => "F",
            Self::OrderCancelReplaceRequest => "G",
            Self::OrderStatusRequest => "H",
            Self::QuoteRequest => "R",
            Self::Quote => "S",
            Self::MarketDataRequest => "V",
            Self::MarketDataSnapshotFullRefresh => "W",
            Self::MarketDataIncrementalRefresh => "X",
            Self::BusinessMessageReject => "j",
            Self::Custom(s) => s,
        }
    }

    /// Returns true if this is an administrative message.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Self::Heartbeat
                | Self::TestRequest
                | Self::ResendRequest
                | Self::Reject
                | Self::SequenceReset
                | Self::Logout
                | Self::Logon
        )
    }

    /// Returns true if this is an application message.
    #[must_use]
    pub fn is_app(&self) -> bool {
        !self.is_admin()
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered list of fields.
///
/// Insertion order is preserved. [`set`](Self::set) replaces the first
/// occurrence of a tag; [`add`](Self::add) always appends, which is how
/// repeating group instances are built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    fields: SmallVec<[Field; 8]>,
}

impl FieldMap {
    /// Creates an empty field map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the first field with the tag.
    #[must_use]
    pub fn get(&self, tag: u32) -> Option<&Field> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    /// Returns the first value of the tag as a string.
    #[must_use]
    pub fn get_str(&self, tag: u32) -> Option<&str> {
        self.get(tag).and_then(|f| f.as_str().ok())
    }

    /// Returns the first value of the tag as a u64.
    #[must_use]
    pub fn get_u64(&self, tag: u32) -> Option<u64> {
        self.get(tag).and_then(|f| f.as_u64().ok())
    }

    /// Returns the first value of the tag as a `Y`/`N` flag.
    #[must_use]
    pub fn get_bool(&self, tag: u32) -> Option<bool> {
        self.get(tag).and_then(|f| f.as_bool().ok())
    }

    /// Returns true if the tag is present.
    #[must_use]
    pub fn contains(&self, tag: u32) -> bool {
        self.get(tag).is_some()
    }

    /// Replaces the first occurrence of the field's tag, or appends it.
    pub fn set(&mut self, field: Field) {
        match self.fields.iter_mut().find(|f| f.tag == field.tag) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    /// Sets a string field.
    pub fn set_str(&mut self, tag: u32, value: &str) {
        self.set(Field::from_str_value(tag, value));
    }

    /// Sets an unsigned integer field.
    pub fn set_u64(&mut self, tag: u32, value: u64) {
        self.set(Field::from_u64(tag, value));
    }

    /// Sets a `Y`/`N` field.
    pub fn set_bool(&mut self, tag: u32, value: bool) {
        self.set(Field::from_bool(tag, value));
    }

    /// Sets a timestamp field with millisecond precision.
    pub fn set_timestamp(&mut self, tag: u32, value: Timestamp) {
        self.set_str(tag, value.format_millis().as_str());
    }

    /// Appends a field even if the tag is already present.
    pub fn add(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Removes every occurrence of the tag, returning the first one.
    pub fn remove(&mut self, tag: u32) -> Option<Field> {
        let pos = self.fields.iter().position(|f| f.tag == tag)?;
        let removed = self.fields.remove(pos);
        self.fields.retain(|f| f.tag != tag);
        Some(removed)
    }

    /// Iterates over the fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the map holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Removes all fields.
    pub fn clear(&mut self) {
        self.fields.clear();
    }
}

impl FromIterator<Field> for FieldMap {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FieldMap {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// A FIX message with header, body and trailer sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Standard header fields.
    pub header: FieldMap,
    /// Body fields.
    pub body: FieldMap,
    /// Standard trailer fields.
    pub trailer: FieldMap,
    raw: Option<Bytes>,
}

impl Message {
    /// Creates a message with BeginString and MsgType set.
    #[must_use]
    pub fn new(begin_string: &str, msg_type: MsgType) -> Self {
        let mut msg = Self::default();
        msg.header.set_str(tags::BEGIN_STRING, begin_string);
        msg.header.set_str(tags::MSG_TYPE, msg_type.as_str());
        msg
    }

    /// Creates an application message without a BeginString.
    ///
    /// The session stamps the BeginString and the rest of the header on send.
    #[must_use]
    pub fn of_type(msg_type: MsgType) -> Self {
        let mut msg = Self::default();
        msg.header.set_str(tags::MSG_TYPE, msg_type.as_str());
        msg
    }

    /// Assembles a decoded message that remembers its source frame.
    #[must_use]
    pub fn from_parts(header: FieldMap, body: FieldMap, trailer: FieldMap, raw: Bytes) -> Self {
        Self {
            header,
            body,
            trailer,
            raw: Some(raw),
        }
    }

    /// Returns the exact frame this message was decoded from.
    #[must_use]
    pub fn raw(&self) -> Option<&Bytes> {
        self.raw.as_ref()
    }

    /// Drops the remembered frame; called when the message is modified for resend.
    pub fn clear_raw(&mut self) {
        self.raw = None;
    }

    /// Returns the message type from tag 35.
    #[must_use]
    pub fn msg_type(&self) -> Option<MsgType> {
        self.header
            .get(tags::MSG_TYPE)
            .map(|f| MsgType::from_bytes(f.as_bytes()))
    }

    /// Returns true if tag 35 holds the given type.
    #[must_use]
    pub fn is_type(&self, msg_type: &MsgType) -> bool {
        self.header.get_str(tags::MSG_TYPE) == Some(msg_type.as_str())
    }

    /// Returns the BeginString (tag 8).
    #[must_use]
    pub fn begin_string(&self) -> Option<&str> {
        self.header.get_str(tags::BEGIN_STRING)
    }

    /// Returns MsgSeqNum (tag 34).
    #[must_use]
    pub fn seq_num(&self) -> Option<u64> {
        self.header.get_u64(tags::MSG_SEQ_NUM)
    }

    /// Returns SendingTime (tag 52).
    #[must_use]
    pub fn sending_time(&self) -> Option<Timestamp> {
        self.header
            .get(tags::SENDING_TIME)
            .and_then(|f| f.as_timestamp().ok())
    }

    /// Returns true if PossDupFlag (tag 43) is `Y`.
    #[must_use]
    pub fn is_poss_dup(&self) -> bool {
        self.header.get_bool(tags::POSS_DUP_FLAG).unwrap_or(false)
    }

    /// Returns true if this is an administrative message.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.msg_type().is_some_and(|t| t.is_admin())
    }

    /// Looks up a tag in header, body and trailer, in that order.
    #[must_use]
    pub fn get(&self, tag: u32) -> Option<&Field> {
        self.header
            .get(tag)
            .or_else(|| self.body.get(tag))
            .or_else(|| self.trailer.get(tag))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for field in self.header.iter().chain(&self.body).chain(&self.trailer) {
            if !first {
                f.write_str("|")?;
            }
            first = false;
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msg_type_roundtrip() {
        for t in ["0", "A", "D", "j", "AE"] {
            let parsed: MsgType = t.parse().unwrap();
            assert_eq!(parsed.as_str(), t);
        }
        assert_eq!(MsgType::from_bytes(b"A"), MsgType::Logon);
        assert_eq!(MsgType::from_bytes(b"U1"), MsgType::Custom("U1".to_string()));
    }

    #[test]
    fn test_msg_type_is_admin() {
        assert!(MsgType::Logon.is_admin());
        assert!(MsgType::SequenceReset.is_admin());
        assert!(!MsgType::NewOrderSingle.is_admin());
        assert!(MsgType::BusinessMessageReject.is_app());
    }

    #[test]
    fn test_field_map_set_replaces_first() {
        let mut map = FieldMap::new();
        map.set_str(55, "MSFT");
        map.set_u64(38, 100);
        map.set_str(55, "AAPL");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_str(55), Some("AAPL"));
        let tags: Vec<u32> = map.iter().map(|f| f.tag).collect();
        assert_eq!(tags, vec![55, 38]);
    }

    #[test]
    fn test_field_map_add_and_remove() {
        let mut map = FieldMap::new();
        map.set_u64(268, 2);
        map.add(Field::from_str_value(269, "0"));
        map.add(Field::from_str_value(269, "1"));
        assert_eq!(map.len(), 3);
        assert_eq!(map.get_str(269), Some("0"));

        let removed = map.remove(269).unwrap();
        assert_eq!(removed.as_str().unwrap(), "0");
        assert_eq!(map.len(), 1);
        assert!(!map.contains(269));
        assert!(map.remove(269).is_none());
    }

    #[test]
    fn test_message_accessors() {
        let mut msg = Message::new("FIX.4.4", MsgType::NewOrderSingle);
        msg.header.set_u64(tags::MSG_SEQ_NUM, 7);
        msg.header.set_bool(tags::POSS_DUP_FLAG, true);
        msg.body.set_str(tags::CL_ORD_ID, "ORD-1");

        assert_eq!(msg.msg_type(), Some(MsgType::NewOrderSingle));
        assert!(msg.is_type(&MsgType::NewOrderSingle));
        assert_eq!(msg.begin_string(), Some("FIX.4.4"));
        assert_eq!(msg.seq_num(), Some(7));
        assert!(msg.is_poss_dup());
        assert!(!msg.is_admin());
        assert_eq!(msg.get(tags::CL_ORD_ID).unwrap().as_str().unwrap(), "ORD-1");
        assert!(msg.raw().is_none());
    }

    #[test]
    fn test_message_display() {
        let mut msg = Message::new("FIX.4.2", MsgType::Heartbeat);
        msg.body.set_str(tags::TEST_REQ_ID, "T1");
        assert_eq!(msg.to_string(), "8=FIX.4.2|35=0|112=T1");
    }
}
