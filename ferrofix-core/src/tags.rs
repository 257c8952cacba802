/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Tag numbers used by the session layer.

pub const ACCOUNT: u32 = 1;
pub const BEGIN_SEQ_NO: u32 = 7;
pub const BEGIN_STRING: u32 = 8;
pub const BODY_LENGTH: u32 = 9;
pub const CHECKSUM: u32 = 10;
pub const CL_ORD_ID: u32 = 11;
pub const END_SEQ_NO: u32 = 16;
pub const MSG_SEQ_NUM: u32 = 34;
pub const MSG_TYPE: u32 = 35;
pub const NEW_SEQ_NO: u32 = 36;
pub const POSS_DUP_FLAG: u32 = 43;
pub const REF_SEQ_NUM: u32 = 45;
pub const SENDER_COMP_ID: u32 = 49;
pub const SENDER_SUB_ID: u32 = 50;
pub const SENDING_TIME: u32 = 52;
pub const SYMBOL: u32 = 55;
pub const TARGET_COMP_ID: u32 = 56;
pub const TARGET_SUB_ID: u32 = 57;
pub const TEXT: u32 = 58;
pub const SIGNATURE: u32 = 89;
pub const SECURE_DATA_LEN: u32 = 90;
pub const SECURE_DATA: u32 = 91;
pub const SIGNATURE_LENGTH: u32 = 93;
pub const RAW_DATA_LENGTH: u32 = 95;
pub const RAW_DATA: u32 = 96;
pub const POSS_RESEND: u32 = 97;
pub const ENCRYPT_METHOD: u32 = 98;
pub const HEART_BT_INT: u32 = 108;
pub const TEST_REQ_ID: u32 = 112;
pub const ON_BEHALF_OF_COMP_ID: u32 = 115;
pub const DELIVER_TO_COMP_ID: u32 = 128;
pub const ORIG_SENDING_TIME: u32 = 122;
pub const GAP_FILL_FLAG: u32 = 123;
pub const RESET_SEQ_NUM_FLAG: u32 = 141;
pub const SENDER_LOCATION_ID: u32 = 142;
pub const TARGET_LOCATION_ID: u32 = 143;
pub const XML_DATA_LEN: u32 = 212;
pub const XML_DATA: u32 = 213;
pub const ENCODED_TEXT_LEN: u32 = 354;
pub const ENCODED_TEXT: u32 = 355;
pub const REF_TAG_ID: u32 = 371;
pub const REF_MSG_TYPE: u32 = 372;
pub const SESSION_REJECT_REASON: u32 = 373;
pub const BUSINESS_REJECT_REF_ID: u32 = 379;
pub const BUSINESS_REJECT_REASON: u32 = 380;
pub const NEXT_EXPECTED_MSG_SEQ_NUM: u32 = 789;
pub const APPL_VER_ID: u32 = 1128;
pub const DEFAULT_APPL_VER_ID: u32 = 1137;

const HEADER_TAGS: &[u32] = &[
    BEGIN_STRING,
    BODY_LENGTH,
    MSG_TYPE,
    SENDER_COMP_ID,
    TARGET_COMP_ID,
    ON_BEHALF_OF_COMP_ID,
    DELIVER_TO_COMP_ID,
    SECURE_DATA_LEN,
    SECURE_DATA,
    MSG_SEQ_NUM,
    SENDER_SUB_ID,
    SENDER_LOCATION_ID,
    TARGET_SUB_ID,
    TARGET_LOCATION_ID,
    116,
    144,
    129,
    145,
    POSS_DUP_FLAG,
    POSS_RESEND,
    SENDING_TIME,
    ORIG_SENDING_TIME,
    XML_DATA_LEN,
    XML_DATA,
    347,
    369,
    627,
    APPL_VER_ID,
];

/// Returns true if the tag belongs in the standard header.
#[must_use]
pub fn is_header_tag(tag: u32) -> bool {
    HEADER_TAGS.contains(&tag)
}

/// Returns true if the tag belongs in the standard trailer.
#[must_use]
pub const fn is_trailer_tag(tag: u32) -> bool {
    matches!(tag, SIGNATURE_LENGTH | SIGNATURE | CHECKSUM)
}

/// For a length field, returns the tag of the data field it prefixes.
///
/// Data field values are read by length and may contain SOH.
#[must_use]
pub const fn data_tag_for(length_tag: u32) -> Option<u32> {
    match length_tag {
        SECURE_DATA_LEN => Some(SECURE_DATA),
        SIGNATURE_LENGTH => Some(SIGNATURE),
        RAW_DATA_LENGTH => Some(RAW_DATA),
        XML_DATA_LEN => Some(XML_DATA),
        348 => Some(349),
        350 => Some(351),
        352 => Some(353),
        ENCODED_TEXT_LEN => Some(ENCODED_TEXT),
        _ => None,
    }
}

/// Returns true if the tag carries a length-prefixed data value.
#[must_use]
pub const fn is_data_tag(tag: u32) -> bool {
    matches!(
        tag,
        SECURE_DATA | SIGNATURE | RAW_DATA | XML_DATA | 349 | 351 | 353 | ENCODED_TEXT
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_classification() {
        assert!(is_header_tag(BEGIN_STRING));
        assert!(is_header_tag(MSG_SEQ_NUM));
        assert!(is_header_tag(ORIG_SENDING_TIME));
        assert!(!is_header_tag(TEXT));
        assert!(is_trailer_tag(CHECKSUM));
        assert!(!is_trailer_tag(MSG_TYPE));
    }

    #[test]
    fn test_data_tag_pairs() {
        assert_eq!(data_tag_for(RAW_DATA_LENGTH), Some(RAW_DATA));
        assert_eq!(data_tag_for(SECURE_DATA_LEN), Some(SECURE_DATA));
        assert_eq!(data_tag_for(SIGNATURE_LENGTH), Some(SIGNATURE));
        assert_eq!(data_tag_for(XML_DATA_LEN), Some(XML_DATA));
        assert_eq!(data_tag_for(MSG_TYPE), None);
        assert!(is_data_tag(RAW_DATA));
        assert!(!is_data_tag(RAW_DATA_LENGTH));
    }
}
