/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Message validation against a [`Dictionary`].
//!
//! Checks run in wire order, so the first offending field is the one
//! reported. Each failure maps to the SessionRejectReason(373) code and
//! RefTagID(371) the session answers with.

use crate::schema::{Dictionary, FieldDef, FieldRef, FieldType, MessageDef};
use ferrofix_core::field::{Field, FieldValue};
use ferrofix_core::message::{FieldMap, Message};
use ferrofix_core::tags;
use ferrofix_core::types::{SessionRejectReason, Timestamp};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// First tag of the user-defined range.
pub const USER_DEFINED_TAG_MIN: u32 = 5000;

/// Reasons a message fails dictionary validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// MsgType is not in the dictionary.
    #[error("unsupported message type: {msg_type}")]
    UnsupportedMsgType {
        /// The received MsgType value.
        msg_type: String,
    },

    /// A required field is absent.
    #[error("required tag missing: {tag}")]
    RequiredTagMissing {
        /// Missing tag.
        tag: u32,
    },

    /// The tag is not known to the dictionary at all.
    #[error("invalid tag number: {tag}")]
    InvalidTagNumber {
        /// Offending tag.
        tag: u32,
    },

    /// The tag is known but not allowed in this message type.
    #[error("tag {tag} not defined for message type {msg_type}")]
    TagNotDefinedForMessage {
        /// Offending tag.
        tag: u32,
        /// Message type being validated.
        msg_type: String,
    },

    /// The tag is present with an empty value.
    #[error("tag specified without a value: {tag}")]
    TagSpecifiedWithoutValue {
        /// Offending tag.
        tag: u32,
    },

    /// The value does not parse as the field's type.
    #[error("incorrect data format for tag {tag}")]
    IncorrectDataFormat {
        /// Offending tag.
        tag: u32,
    },

    /// The value is not one of the field's enumerated values.
    #[error("value '{value}' is out of range for tag {tag}")]
    ValueOutOfRange {
        /// Offending tag.
        tag: u32,
        /// Received value.
        value: String,
    },

    /// A non-repeating tag occurs twice.
    #[error("tag appears more than once: {tag}")]
    TagAppearsMoreThanOnce {
        /// Offending tag.
        tag: u32,
    },
}

impl ValidationError {
    /// SessionRejectReason to report for this failure.
    #[must_use]
    pub const fn reject_reason(&self) -> SessionRejectReason {
        match self {
            Self::UnsupportedMsgType { .. } => SessionRejectReason::InvalidMsgType,
            Self::RequiredTagMissing { .. } => SessionRejectReason::RequiredTagMissing,
            Self::InvalidTagNumber { .. } => SessionRejectReason::InvalidTagNumber,
            Self::TagNotDefinedForMessage { .. } => {
                SessionRejectReason::TagNotDefinedForMessageType
            }
            Self::TagSpecifiedWithoutValue { .. } => SessionRejectReason::TagSpecifiedWithoutValue,
            Self::IncorrectDataFormat { .. } => SessionRejectReason::IncorrectDataFormat,
            Self::ValueOutOfRange { .. } => SessionRejectReason::ValueIsIncorrect,
            Self::TagAppearsMoreThanOnce { .. } => SessionRejectReason::TagAppearsMoreThanOnce,
        }
    }

    /// RefTagID to report, if any.
    #[must_use]
    pub const fn ref_tag(&self) -> Option<u32> {
        match self {
            Self::UnsupportedMsgType { .. } => None,
            Self::RequiredTagMissing { tag }
            | Self::InvalidTagNumber { tag }
            | Self::TagNotDefinedForMessage { tag, .. }
            | Self::TagSpecifiedWithoutValue { tag }
            | Self::IncorrectDataFormat { tag }
            | Self::ValueOutOfRange { tag, .. }
            | Self::TagAppearsMoreThanOnce { tag } => Some(*tag),
        }
    }
}

/// Switches for the individual checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Accept tags at or above 5000 that the dictionary does not define.
    pub allow_user_defined_fields: bool,
    /// Accept known tags in messages that do not list them.
    pub allow_unknown_message_fields: bool,
    /// Check value formats and enumerations.
    pub check_field_values: bool,
    /// Check that required fields are present.
    pub check_required_fields: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            allow_user_defined_fields: true,
            allow_unknown_message_fields: false,
            check_field_values: true,
            check_required_fields: true,
        }
    }
}

/// A dictionary paired with the checks to run against it.
#[derive(Debug, Clone)]
pub struct Validator {
    dictionary: Arc<Dictionary>,
    options: ValidationOptions,
}

#[derive(Clone, Copy)]
enum Segment {
    Header,
    Body,
    Trailer,
}

impl Validator {
    /// Creates a validator with default options.
    #[must_use]
    pub fn new(dictionary: Arc<Dictionary>) -> Self {
        Self::with_options(dictionary, ValidationOptions::default())
    }

    /// Creates a validator with explicit options.
    #[must_use]
    pub const fn with_options(dictionary: Arc<Dictionary>, options: ValidationOptions) -> Self {
        Self {
            dictionary,
            options,
        }
    }

    /// Returns the dictionary.
    #[must_use]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Returns the options.
    #[must_use]
    pub const fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validates a message.
    ///
    /// # Errors
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self, msg: &Message) -> Result<(), ValidationError> {
        let msg_type = msg
            .header
            .get_str(tags::MSG_TYPE)
            .ok_or(ValidationError::RequiredTagMissing { tag: tags::MSG_TYPE })?;
        let def = self.dictionary.get_message(msg_type).ok_or_else(|| {
            ValidationError::UnsupportedMsgType {
                msg_type: msg_type.to_string(),
            }
        })?;

        let repeatable = def.repeatable_tags();
        let mut seen = HashSet::new();
        let segments = [
            (Segment::Header, &msg.header),
            (Segment::Body, &msg.body),
            (Segment::Trailer, &msg.trailer),
        ];
        for (segment, fields) in segments {
            for field in fields.iter() {
                if !seen.insert(field.tag) && !repeatable.contains(&field.tag) {
                    return Err(ValidationError::TagAppearsMoreThanOnce { tag: field.tag });
                }
                self.check_field(field, segment, def)?;
            }
        }

        if self.options.check_required_fields {
            self.check_required(msg, def)?;
        }
        Ok(())
    }

    fn check_field(
        &self,
        field: &Field,
        segment: Segment,
        def: &MessageDef,
    ) -> Result<(), ValidationError> {
        let tag = field.tag;
        if field.value.is_empty() {
            return Err(ValidationError::TagSpecifiedWithoutValue { tag });
        }

        let Some(field_def) = self.dictionary.get_field(tag) else {
            if tag >= USER_DEFINED_TAG_MIN && self.options.allow_user_defined_fields {
                return Ok(());
            }
            return Err(ValidationError::InvalidTagNumber { tag });
        };

        let allowed = match segment {
            Segment::Header => self.dictionary.is_header_field(tag),
            Segment::Trailer => self.dictionary.is_trailer_field(tag),
            Segment::Body => def.has_field(tag) || self.options.allow_unknown_message_fields,
        };
        if !allowed {
            return Err(ValidationError::TagNotDefinedForMessage {
                tag,
                msg_type: def.msg_type.clone(),
            });
        }

        if self.options.check_field_values {
            check_value(field_def, field)?;
        }
        Ok(())
    }

    fn check_required(&self, msg: &Message, def: &MessageDef) -> Result<(), ValidationError> {
        let required = |refs: &[FieldRef], fields: &FieldMap| {
            refs.iter()
                .filter(|r| r.required)
                .find(|r| !fields.contains(r.tag))
                .map(|r| ValidationError::RequiredTagMissing { tag: r.tag })
        };
        if let Some(err) = required(&self.dictionary.header, &msg.header) {
            return Err(err);
        }
        if let Some(tag) = def.required_tags().find(|tag| !msg.body.contains(*tag)) {
            return Err(ValidationError::RequiredTagMissing { tag });
        }
        if let Some(err) = required(&self.dictionary.trailer, &msg.trailer) {
            return Err(err);
        }
        Ok(())
    }
}

fn check_value(def: &FieldDef, field: &Field) -> Result<(), ValidationError> {
    decode_typed(def.field_type, field)?;
    if def.values.is_some() {
        let value = field
            .as_str()
            .map_err(|_| ValidationError::IncorrectDataFormat { tag: field.tag })?;
        if !def.allows(value) {
            return Err(ValidationError::ValueOutOfRange {
                tag: field.tag,
                value: value.to_string(),
            });
        }
    }
    Ok(())
}

fn decode_typed(field_type: FieldType, field: &Field) -> Result<FieldValue, ValidationError> {
    let bad = || ValidationError::IncorrectDataFormat { tag: field.tag };
    let value = match field_type {
        FieldType::Length | FieldType::SeqNum | FieldType::NumInGroup | FieldType::TagNum => {
            FieldValue::UInt(field.as_u64().map_err(|_| bad())?)
        }
        FieldType::Int => FieldValue::Int(field.as_i64().map_err(|_| bad())?),
        FieldType::Float | FieldType::Qty | FieldType::Price | FieldType::Amt => {
            FieldValue::Decimal(field.parse::<Decimal>().map_err(|_| bad())?)
        }
        FieldType::Char => FieldValue::Char(field.as_char().map_err(|_| bad())?),
        FieldType::Boolean => FieldValue::Bool(field.as_bool().map_err(|_| bad())?),
        FieldType::UtcTimestamp => {
            let s = field.as_str().map_err(|_| bad())?;
            FieldValue::Timestamp(Timestamp::parse(s).ok_or_else(bad)?)
        }
        FieldType::String => FieldValue::String(field.as_str().map_err(|_| bad())?.to_string()),
        FieldType::Data => FieldValue::Data(field.value.clone()),
    };
    Ok(value)
}

impl Dictionary {
    /// Interprets a field according to its dictionary type.
    ///
    /// Tags the dictionary does not define decode as strings, or as raw
    /// data when they are not valid UTF-8.
    ///
    /// # Errors
    /// Returns `ValidationError::IncorrectDataFormat` if the value does not
    /// parse as the field's type.
    pub fn decode_value(&self, field: &Field) -> Result<FieldValue, ValidationError> {
        match self.get_field(field.tag) {
            Some(def) => decode_typed(def.field_type, field),
            None => Ok(field
                .as_str()
                .map(|s| FieldValue::String(s.to_string()))
                .unwrap_or_else(|_| FieldValue::Data(field.value.clone()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Version;
    use ferrofix_core::message::MsgType;

    fn validator() -> Validator {
        Validator::new(Arc::new(Dictionary::builtin(Version::Fix44)))
    }

    fn admin(msg_type: MsgType) -> Message {
        let mut msg = Message::new("FIX.4.4", msg_type);
        msg.header.set_u64(tags::BODY_LENGTH, 0);
        msg.header.set_str(tags::SENDER_COMP_ID, "S");
        msg.header.set_str(tags::TARGET_COMP_ID, "T");
        msg.header.set_u64(tags::MSG_SEQ_NUM, 1);
        msg.header.set_str(tags::SENDING_TIME, "20240115-10:30:00.000");
        msg.trailer.set_str(tags::CHECKSUM, "000");
        msg
    }

    #[test]
    fn test_valid_heartbeat() {
        assert_eq!(validator().validate(&admin(MsgType::Heartbeat)), Ok(()));
    }

    #[test]
    fn test_required_tag_missing() {
        let msg = admin(MsgType::TestRequest);
        let err = validator().validate(&msg).unwrap_err();
        assert_eq!(err, ValidationError::RequiredTagMissing { tag: tags::TEST_REQ_ID });
        assert_eq!(err.reject_reason(), SessionRejectReason::RequiredTagMissing);
        assert_eq!(err.ref_tag(), Some(tags::TEST_REQ_ID));
    }

    #[test]
    fn test_missing_header_field() {
        let mut msg = admin(MsgType::Heartbeat);
        msg.header.remove(tags::SENDING_TIME);
        assert_eq!(
            validator().validate(&msg),
            Err(ValidationError::RequiredTagMissing { tag: tags::SENDING_TIME })
        );
    }

    #[test]
    fn test_unsupported_msg_type() {
        let err = validator()
            .validate(&admin(MsgType::Custom("U1".to_string())))
            .unwrap_err();
        assert_eq!(err.reject_reason(), SessionRejectReason::InvalidMsgType);
        assert_eq!(err.ref_tag(), None);
    }

    #[test]
    fn test_tag_not_defined_for_message() {
        let mut msg = admin(MsgType::Heartbeat);
        msg.body.set_str(tags::CL_ORD_ID, "X");
        assert!(matches!(
            validator().validate(&msg),
            Err(ValidationError::TagNotDefinedForMessage { tag: tags::CL_ORD_ID, .. })
        ));

        let lenient = Validator::with_options(
            Arc::new(Dictionary::builtin(Version::Fix44)),
            ValidationOptions {
                allow_unknown_message_fields: true,
                ..ValidationOptions::default()
            },
        );
        assert_eq!(lenient.validate(&msg), Ok(()));
    }

    #[test]
    fn test_undefined_and_user_defined_tags() {
        let mut msg = admin(MsgType::Heartbeat);
        msg.body.set_str(4999, "x");
        assert_eq!(
            validator().validate(&msg),
            Err(ValidationError::InvalidTagNumber { tag: 4999 })
        );

        let mut custom = admin(MsgType::Heartbeat);
        custom.body.set_str(5001, "x");
        assert_eq!(validator().validate(&custom), Ok(()));
    }

    #[test]
    fn test_incorrect_format_and_range() {
        let mut msg = admin(MsgType::Logon);
        msg.body.set_str(tags::ENCRYPT_METHOD, "0");
        msg.body.set_str(tags::HEART_BT_INT, "thirty");
        assert_eq!(
            validator().validate(&msg),
            Err(ValidationError::IncorrectDataFormat { tag: tags::HEART_BT_INT })
        );

        msg.body.set_str(tags::HEART_BT_INT, "30");
        msg.body.set_str(tags::RESET_SEQ_NUM_FLAG, "X");
        assert!(matches!(
            validator().validate(&msg),
            Err(ValidationError::IncorrectDataFormat { tag: tags::RESET_SEQ_NUM_FLAG })
        ));

        msg.body.set_str(tags::RESET_SEQ_NUM_FLAG, "Y");
        msg.body.set_str(tags::ENCRYPT_METHOD, "9");
        let err = validator().validate(&msg).unwrap_err();
        assert_eq!(err.reject_reason(), SessionRejectReason::ValueIsIncorrect);
    }

    #[test]
    fn test_duplicate_tag() {
        let mut msg = admin(MsgType::Heartbeat);
        msg.body.add(Field::from_str_value(tags::TEST_REQ_ID, "a"));
        msg.body.add(Field::from_str_value(tags::TEST_REQ_ID, "b"));
        assert_eq!(
            validator().validate(&msg),
            Err(ValidationError::TagAppearsMoreThanOnce { tag: tags::TEST_REQ_ID })
        );
    }

    #[test]
    fn test_empty_value() {
        let mut msg = admin(MsgType::Heartbeat);
        msg.body.set_str(tags::TEST_REQ_ID, "");
        assert_eq!(
            validator().validate(&msg).unwrap_err().reject_reason(),
            SessionRejectReason::TagSpecifiedWithoutValue
        );
    }

    #[test]
    fn test_decode_value() {
        let dict = Dictionary::builtin(Version::Fix44);
        assert_eq!(
            dict.decode_value(&Field::from_u64(tags::HEART_BT_INT, 30)),
            Ok(FieldValue::Int(30))
        );
        assert_eq!(
            dict.decode_value(&Field::from_bool(tags::POSS_DUP_FLAG, true)),
            Ok(FieldValue::Bool(true))
        );
        assert_eq!(
            dict.decode_value(&Field::from_str_value(44, "101.25")),
            Ok(FieldValue::Decimal(Decimal::new(10125, 2)))
        );
        assert_eq!(
            dict.decode_value(&Field::from_str_value(9999, "free text")),
            Ok(FieldValue::String("free text".to_string()))
        );
        assert!(dict.decode_value(&Field::from_str_value(44, "abc")).is_err());
    }
}
