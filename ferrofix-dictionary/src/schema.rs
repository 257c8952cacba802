/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Schema definitions for FIX dictionaries.
//!
//! - [`FieldDef`]: tag, name, type and permitted values of a field
//! - [`MessageDef`]: the fields a message type may and must carry
//! - [`GroupDef`]: repeating group whose members may appear more than once
//! - [`Dictionary`]: everything known about one FIX version

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// FIX protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Version {
    /// FIX 4.0
    Fix40,
    /// FIX 4.1
    Fix41,
    /// FIX 4.2
    Fix42,
    /// FIX 4.3
    Fix43,
    /// FIX 4.4
    Fix44,
    /// FIXT 1.1 (transport layer for FIX 5.0+)
    Fixt11,
}

impl Version {
    /// Returns the BeginString value for this version.
    #[must_use]
    pub const fn begin_string(&self) -> &'static str {
        match self {
            Self::Fix40 => "FIX.4.0",
            Self::Fix41 => "FIX.4.1",
            Self::Fix42 => "FIX.4.2",
            Self::Fix43 => "FIX.4.3",
            Self::Fix44 => "FIX.4.4",
            Self::Fixt11 => "FIXT.1.1",
        }
    }

    /// Looks up a version by its BeginString.
    #[must_use]
    pub fn from_begin_string(s: &str) -> Option<Self> {
        Some(match s {
            "FIX.4.0" => Self::Fix40,
            "FIX.4.1" => Self::Fix41,
            "FIX.4.2" => Self::Fix42,
            "FIX.4.3" => Self::Fix43,
            "FIX.4.4" => Self::Fix44,
            "FIXT.1.1" => Self::Fixt11,
            _ => return None,
        })
    }

    /// Returns true if this version uses FIXT transport.
    #[must_use]
    pub const fn uses_fixt(&self) -> bool {
        matches!(self, Self::Fixt11)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.begin_string())
    }
}

/// FIX field data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Integer value.
    Int,
    /// Length field (for data fields).
    Length,
    /// Sequence number.
    SeqNum,
    /// Number of entries in a repeating group.
    NumInGroup,
    /// Tag number reference.
    TagNum,
    /// Floating point number.
    Float,
    /// Quantity.
    Qty,
    /// Price.
    Price,
    /// Amount (price * quantity).
    Amt,
    /// Single character.
    Char,
    /// Boolean (Y/N).
    Boolean,
    /// String.
    String,
    /// UTC timestamp.
    UtcTimestamp,
    /// Raw data (binary).
    Data,
}

impl FieldType {
    /// Returns true for integer-valued types.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Int | Self::Length | Self::SeqNum | Self::NumInGroup | Self::TagNum
        )
    }

    /// Returns true for decimal-valued types.
    #[must_use]
    pub const fn is_decimal(&self) -> bool {
        matches!(self, Self::Float | Self::Qty | Self::Price | Self::Amt)
    }
}

impl std::str::FromStr for FieldType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_uppercase().as_str() {
            "INT" => Self::Int,
            "LENGTH" => Self::Length,
            "SEQNUM" => Self::SeqNum,
            "NUMINGROUP" => Self::NumInGroup,
            "TAGNUM" => Self::TagNum,
            "FLOAT" => Self::Float,
            "QTY" | "QUANTITY" => Self::Qty,
            "PRICE" => Self::Price,
            "AMT" | "AMOUNT" => Self::Amt,
            "CHAR" => Self::Char,
            "BOOLEAN" => Self::Boolean,
            "UTCTIMESTAMP" => Self::UtcTimestamp,
            "DATA" | "XMLDATA" => Self::Data,
            _ => Self::String,
        })
    }
}

/// Definition of a FIX field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field tag number.
    pub tag: u32,
    /// Field name.
    pub name: String,
    /// Field data type.
    pub field_type: FieldType,
    /// Permitted values for enumerated fields, value to description.
    pub values: Option<HashMap<String, String>>,
}

impl FieldDef {
    /// Creates a new field definition.
    #[must_use]
    pub fn new(tag: u32, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            tag,
            name: name.into(),
            field_type,
            values: None,
        }
    }

    /// Restricts the field to the given values.
    #[must_use]
    pub fn with_values<I, V, D>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (V, D)>,
        V: Into<String>,
        D: Into<String>,
    {
        self.values = Some(
            values
                .into_iter()
                .map(|(v, d)| (v.into(), d.into()))
                .collect(),
        );
        self
    }

    /// Returns true if `value` is permitted; always true for non-enumerated fields.
    #[must_use]
    pub fn allows(&self, value: &str) -> bool {
        self.values.as_ref().is_none_or(|v| v.contains_key(value))
    }
}

/// Reference to a field within a message, header or trailer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRef {
    /// Field tag number.
    pub tag: u32,
    /// Whether the field is required.
    pub required: bool,
}

impl FieldRef {
    /// A required member.
    #[must_use]
    pub const fn required(tag: u32) -> Self {
        Self {
            tag,
            required: true,
        }
    }

    /// An optional member.
    #[must_use]
    pub const fn optional(tag: u32) -> Self {
        Self {
            tag,
            required: false,
        }
    }
}

/// Definition of a repeating group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDef {
    /// Tag of the count field (NumInGroup).
    pub count_tag: u32,
    /// Tag of the first field in each group entry (delimiter).
    pub delimiter_tag: u32,
    /// Fields within each group entry.
    pub fields: Vec<u32>,
    /// Whether the group is required.
    pub required: bool,
}

/// Message category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageCategory {
    /// Administrative message (session level).
    Admin,
    /// Application message.
    App,
}

/// Definition of a FIX message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDef {
    /// Message type value (tag 35).
    pub msg_type: String,
    /// Message name.
    pub name: String,
    /// Message category (admin or app).
    pub category: MessageCategory,
    /// Body fields.
    pub fields: Vec<FieldRef>,
    /// Repeating groups in the body.
    pub groups: Vec<GroupDef>,
}

impl MessageDef {
    /// Creates a message definition with no fields.
    #[must_use]
    pub fn new(msg_type: impl Into<String>, name: impl Into<String>, category: MessageCategory) -> Self {
        Self {
            msg_type: msg_type.into(),
            name: name.into(),
            category,
            fields: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Adds a required body field.
    #[must_use]
    pub fn require(mut self, tag: u32) -> Self {
        self.fields.push(FieldRef::required(tag));
        self
    }

    /// Adds an optional body field.
    #[must_use]
    pub fn allow(mut self, tag: u32) -> Self {
        self.fields.push(FieldRef::optional(tag));
        self
    }

    /// Adds a repeating group.
    #[must_use]
    pub fn group(mut self, group: GroupDef) -> Self {
        self.groups.push(group);
        self
    }

    /// Returns true if the tag may appear in this message's body.
    #[must_use]
    pub fn has_field(&self, tag: u32) -> bool {
        self.fields.iter().any(|f| f.tag == tag)
            || self
                .groups
                .iter()
                .any(|g| g.count_tag == tag || g.fields.contains(&tag))
    }

    /// Tags that may legitimately repeat, i.e. repeating group members.
    #[must_use]
    pub fn repeatable_tags(&self) -> HashSet<u32> {
        self.groups
            .iter()
            .flat_map(|g| g.fields.iter().copied())
            .collect()
    }

    /// Iterates the tags the body must carry.
    pub fn required_tags(&self) -> impl Iterator<Item = u32> + '_ {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.tag)
            .chain(self.groups.iter().filter(|g| g.required).map(|g| g.count_tag))
    }
}

/// Complete FIX dictionary for a specific version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dictionary {
    /// FIX version.
    pub version: Version,
    /// Field definitions indexed by tag.
    pub fields: HashMap<u32, FieldDef>,
    /// Field tags indexed by name.
    pub fields_by_name: HashMap<String, u32>,
    /// Message definitions indexed by msg_type.
    pub messages: HashMap<String, MessageDef>,
    /// Header fields.
    pub header: Vec<FieldRef>,
    /// Trailer fields.
    pub trailer: Vec<FieldRef>,
}

impl Dictionary {
    /// Creates a new empty dictionary for the specified version.
    #[must_use]
    pub fn new(version: Version) -> Self {
        Self {
            version,
            fields: HashMap::new(),
            fields_by_name: HashMap::new(),
            messages: HashMap::new(),
            header: Vec::new(),
            trailer: Vec::new(),
        }
    }

    /// Adds a field definition.
    pub fn add_field(&mut self, field: FieldDef) {
        self.fields_by_name.insert(field.name.clone(), field.tag);
        self.fields.insert(field.tag, field);
    }

    /// Adds a message definition.
    pub fn add_message(&mut self, message: MessageDef) {
        self.messages.insert(message.msg_type.clone(), message);
    }

    /// Gets a field definition by tag.
    #[must_use]
    pub fn get_field(&self, tag: u32) -> Option<&FieldDef> {
        self.fields.get(&tag)
    }

    /// Gets a field definition by name.
    #[must_use]
    pub fn get_field_by_name(&self, name: &str) -> Option<&FieldDef> {
        self.fields_by_name
            .get(name)
            .and_then(|tag| self.fields.get(tag))
    }

    /// Gets a message definition by type.
    #[must_use]
    pub fn get_message(&self, msg_type: &str) -> Option<&MessageDef> {
        self.messages.get(msg_type)
    }

    /// Returns true if the tag is a header member.
    #[must_use]
    pub fn is_header_field(&self, tag: u32) -> bool {
        self.header.iter().any(|f| f.tag == tag)
    }

    /// Returns true if the tag is a trailer member.
    #[must_use]
    pub fn is_trailer_field(&self, tag: u32) -> bool {
        self.trailer.iter().any(|f| f.tag == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_begin_string() {
        assert_eq!(Version::Fix42.begin_string(), "FIX.4.2");
        assert_eq!(Version::from_begin_string("FIX.4.4"), Some(Version::Fix44));
        assert_eq!(Version::from_begin_string("FIX.9.9"), None);
        assert!(Version::Fix44 > Version::Fix42);
        assert!(Version::Fixt11.uses_fixt());
    }

    #[test]
    fn test_field_type_from_str() {
        assert_eq!("INT".parse::<FieldType>().unwrap(), FieldType::Int);
        assert_eq!("utctimestamp".parse::<FieldType>().unwrap(), FieldType::UtcTimestamp);
        assert_eq!("MULTIPLEVALUESTRING".parse::<FieldType>().unwrap(), FieldType::String);
        assert!(FieldType::SeqNum.is_integer());
        assert!(FieldType::Price.is_decimal());
    }

    #[test]
    fn test_field_def_values() {
        let side = FieldDef::new(54, "Side", FieldType::Char).with_values([("1", "BUY"), ("2", "SELL")]);
        assert!(side.allows("1"));
        assert!(!side.allows("9"));
        assert!(FieldDef::new(58, "Text", FieldType::String).allows("anything"));
    }

    #[test]
    fn test_message_def_membership() {
        let def = MessageDef::new("W", "MarketDataSnapshot", MessageCategory::App)
            .require(55)
            .group(GroupDef {
                count_tag: 268,
                delimiter_tag: 269,
                fields: vec![269, 270],
                required: true,
            });
        assert!(def.has_field(55));
        assert!(def.has_field(268));
        assert!(def.has_field(270));
        assert!(!def.has_field(11));
        assert!(def.repeatable_tags().contains(&269));
        assert_eq!(def.required_tags().collect::<Vec<_>>(), vec![55, 268]);
    }

    #[test]
    fn test_dictionary_field_operations() {
        let mut dict = Dictionary::new(Version::Fix44);
        dict.add_field(FieldDef::new(35, "MsgType", FieldType::String));
        assert!(dict.get_field(35).is_some());
        assert!(dict.get_field_by_name("MsgType").is_some());
        assert!(dict.get_field(999).is_none());
    }
}
