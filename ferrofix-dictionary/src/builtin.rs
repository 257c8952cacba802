/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Built-in dictionary covering the session layer and basic order flow.

use crate::schema::{
    Dictionary, FieldDef, FieldRef, FieldType, MessageCategory, MessageDef, Version,
};
use ferrofix_core::tags;

const YES_NO: [(&str, &str); 2] = [("Y", "YES"), ("N", "NO")];

impl Dictionary {
    /// Builds the dictionary of standard header, trailer and admin messages.
    ///
    /// Application messages are limited to the order flow that every venue
    /// supports (D, F, 8, 9, B and j); anything else is an unsupported type.
    #[must_use]
    pub fn builtin(version: Version) -> Self {
        let mut dict = Self::new(version);
        for field in session_fields() {
            dict.add_field(field);
        }
        for field in order_flow_fields() {
            dict.add_field(field);
        }

        dict.header = vec![
            FieldRef::required(tags::BEGIN_STRING),
            FieldRef::required(tags::BODY_LENGTH),
            FieldRef::required(tags::MSG_TYPE),
            FieldRef::required(tags::SENDER_COMP_ID),
            FieldRef::required(tags::TARGET_COMP_ID),
            FieldRef::optional(tags::ON_BEHALF_OF_COMP_ID),
            FieldRef::optional(tags::DELIVER_TO_COMP_ID),
            FieldRef::optional(tags::SECURE_DATA_LEN),
            FieldRef::optional(tags::SECURE_DATA),
            FieldRef::required(tags::MSG_SEQ_NUM),
            FieldRef::optional(tags::SENDER_SUB_ID),
            FieldRef::optional(tags::SENDER_LOCATION_ID),
            FieldRef::optional(tags::TARGET_SUB_ID),
            FieldRef::optional(tags::TARGET_LOCATION_ID),
            FieldRef::optional(tags::POSS_DUP_FLAG),
            FieldRef::optional(tags::POSS_RESEND),
            FieldRef::required(tags::SENDING_TIME),
            FieldRef::optional(tags::ORIG_SENDING_TIME),
            FieldRef::optional(tags::XML_DATA_LEN),
            FieldRef::optional(tags::XML_DATA),
        ];
        if version.uses_fixt() {
            dict.header.push(FieldRef::optional(tags::APPL_VER_ID));
        }
        dict.trailer = vec![
            FieldRef::optional(tags::SIGNATURE_LENGTH),
            FieldRef::optional(tags::SIGNATURE),
            FieldRef::required(tags::CHECKSUM),
        ];

        for message in admin_messages(version) {
            dict.add_message(message);
        }
        for message in order_flow_messages() {
            dict.add_message(message);
        }
        dict
    }
}

fn session_fields() -> Vec<FieldDef> {
    use FieldType::*;
    vec![
        FieldDef::new(tags::BEGIN_SEQ_NO, "BeginSeqNo", SeqNum),
        FieldDef::new(tags::BEGIN_STRING, "BeginString", String),
        FieldDef::new(tags::BODY_LENGTH, "BodyLength", Length),
        FieldDef::new(tags::CHECKSUM, "CheckSum", String),
        FieldDef::new(tags::END_SEQ_NO, "EndSeqNo", SeqNum),
        FieldDef::new(tags::MSG_SEQ_NUM, "MsgSeqNum", SeqNum),
        FieldDef::new(tags::MSG_TYPE, "MsgType", String),
        FieldDef::new(tags::NEW_SEQ_NO, "NewSeqNo", SeqNum),
        FieldDef::new(tags::POSS_DUP_FLAG, "PossDupFlag", Boolean).with_values(YES_NO),
        FieldDef::new(tags::REF_SEQ_NUM, "RefSeqNum", SeqNum),
        FieldDef::new(tags::SENDER_COMP_ID, "SenderCompID", String),
        FieldDef::new(tags::SENDER_SUB_ID, "SenderSubID", String),
        FieldDef::new(tags::SENDING_TIME, "SendingTime", UtcTimestamp),
        FieldDef::new(tags::TARGET_COMP_ID, "TargetCompID", String),
        FieldDef::new(tags::TARGET_SUB_ID, "TargetSubID", String),
        FieldDef::new(tags::TEXT, "Text", String),
        FieldDef::new(tags::SIGNATURE, "Signature", Data),
        FieldDef::new(tags::SECURE_DATA_LEN, "SecureDataLen", Length),
        FieldDef::new(tags::SECURE_DATA, "SecureData", Data),
        FieldDef::new(tags::SIGNATURE_LENGTH, "SignatureLength", Length),
        FieldDef::new(tags::RAW_DATA_LENGTH, "RawDataLength", Length),
        FieldDef::new(tags::RAW_DATA, "RawData", Data),
        FieldDef::new(tags::POSS_RESEND, "PossResend", Boolean).with_values(YES_NO),
        FieldDef::new(tags::ENCRYPT_METHOD, "EncryptMethod", Int).with_values([
            ("0", "NONE_OTHER"),
            ("1", "PKCS"),
            ("2", "DES"),
            ("3", "PKCS_DES"),
            ("4", "PGP_DES"),
            ("5", "PGP_DES_MD5"),
            ("6", "PEM_DES_MD5"),
        ]),
        FieldDef::new(tags::HEART_BT_INT, "HeartBtInt", Int),
        FieldDef::new(tags::TEST_REQ_ID, "TestReqID", String),
        FieldDef::new(tags::ON_BEHALF_OF_COMP_ID, "OnBehalfOfCompID", String),
        FieldDef::new(tags::ORIG_SENDING_TIME, "OrigSendingTime", UtcTimestamp),
        FieldDef::new(tags::GAP_FILL_FLAG, "GapFillFlag", Boolean).with_values(YES_NO),
        FieldDef::new(tags::DELIVER_TO_COMP_ID, "DeliverToCompID", String),
        FieldDef::new(tags::RESET_SEQ_NUM_FLAG, "ResetSeqNumFlag", Boolean).with_values(YES_NO),
        FieldDef::new(tags::SENDER_LOCATION_ID, "SenderLocationID", String),
        FieldDef::new(tags::TARGET_LOCATION_ID, "TargetLocationID", String),
        FieldDef::new(tags::XML_DATA_LEN, "XmlDataLen", Length),
        FieldDef::new(tags::XML_DATA, "XmlData", Data),
        FieldDef::new(tags::ENCODED_TEXT_LEN, "EncodedTextLen", Length),
        FieldDef::new(tags::ENCODED_TEXT, "EncodedText", Data),
        FieldDef::new(tags::REF_TAG_ID, "RefTagID", TagNum),
        FieldDef::new(tags::REF_MSG_TYPE, "RefMsgType", String),
        FieldDef::new(tags::SESSION_REJECT_REASON, "SessionRejectReason", Int),
        FieldDef::new(tags::BUSINESS_REJECT_REF_ID, "BusinessRejectRefID", String),
        FieldDef::new(tags::BUSINESS_REJECT_REASON, "BusinessRejectReason", Int),
        FieldDef::new(tags::NEXT_EXPECTED_MSG_SEQ_NUM, "NextExpectedMsgSeqNum", SeqNum),
        FieldDef::new(tags::APPL_VER_ID, "ApplVerID", String),
        FieldDef::new(tags::DEFAULT_APPL_VER_ID, "DefaultApplVerID", String),
    ]
}

fn order_flow_fields() -> Vec<FieldDef> {
    use FieldType::*;
    vec![
        FieldDef::new(tags::ACCOUNT, "Account", String),
        FieldDef::new(6, "AvgPx", Price),
        FieldDef::new(tags::CL_ORD_ID, "ClOrdID", String),
        FieldDef::new(14, "CumQty", Qty),
        FieldDef::new(17, "ExecID", String),
        FieldDef::new(21, "HandlInst", Char).with_values([
            ("1", "AUTOMATED_EXECUTION_NO_INTERVENTION"),
            ("2", "AUTOMATED_EXECUTION_INTERVENTION_OK"),
            ("3", "MANUAL_ORDER"),
        ]),
        FieldDef::new(37, "OrderID", String),
        FieldDef::new(38, "OrderQty", Qty),
        FieldDef::new(39, "OrdStatus", Char).with_values([
            ("0", "NEW"),
            ("1", "PARTIALLY_FILLED"),
            ("2", "FILLED"),
            ("4", "CANCELED"),
            ("6", "PENDING_CANCEL"),
            ("8", "REJECTED"),
            ("A", "PENDING_NEW"),
            ("E", "PENDING_REPLACE"),
        ]),
        FieldDef::new(40, "OrdType", Char).with_values([
            ("1", "MARKET"),
            ("2", "LIMIT"),
            ("3", "STOP"),
            ("4", "STOP_LIMIT"),
        ]),
        FieldDef::new(41, "OrigClOrdID", String),
        FieldDef::new(44, "Price", Price),
        FieldDef::new(54, "Side", Char).with_values([
            ("1", "BUY"),
            ("2", "SELL"),
            ("5", "SELL_SHORT"),
        ]),
        FieldDef::new(tags::SYMBOL, "Symbol", String),
        FieldDef::new(60, "TransactTime", UtcTimestamp),
        FieldDef::new(102, "CxlRejReason", Int),
        FieldDef::new(148, "Headline", String),
        FieldDef::new(150, "ExecType", Char),
        FieldDef::new(151, "LeavesQty", Qty),
        FieldDef::new(434, "CxlRejResponseTo", Char).with_values([
            ("1", "ORDER_CANCEL_REQUEST"),
            ("2", "ORDER_CANCEL_REPLACE_REQUEST"),
        ]),
    ]
}

fn admin_messages(version: Version) -> Vec<MessageDef> {
    use MessageCategory::Admin;

    let mut logon = MessageDef::new("A", "Logon", Admin)
        .require(tags::ENCRYPT_METHOD)
        .require(tags::HEART_BT_INT)
        .allow(tags::RAW_DATA_LENGTH)
        .allow(tags::RAW_DATA)
        .allow(tags::RESET_SEQ_NUM_FLAG)
        .allow(tags::NEXT_EXPECTED_MSG_SEQ_NUM);
    if version.uses_fixt() {
        logon = logon.require(tags::DEFAULT_APPL_VER_ID);
    }

    let reject_ref = |def: MessageDef| {
        def.require(tags::REF_SEQ_NUM)
            .allow(tags::REF_TAG_ID)
            .allow(tags::REF_MSG_TYPE)
            .allow(tags::SESSION_REJECT_REASON)
            .allow(tags::TEXT)
            .allow(tags::ENCODED_TEXT_LEN)
            .allow(tags::ENCODED_TEXT)
    };

    vec![
        MessageDef::new("0", "Heartbeat", Admin).allow(tags::TEST_REQ_ID),
        MessageDef::new("1", "TestRequest", Admin).require(tags::TEST_REQ_ID),
        MessageDef::new("2", "ResendRequest", Admin)
            .require(tags::BEGIN_SEQ_NO)
            .require(tags::END_SEQ_NO),
        reject_ref(MessageDef::new("3", "Reject", Admin)),
        MessageDef::new("4", "SequenceReset", Admin)
            .allow(tags::GAP_FILL_FLAG)
            .require(tags::NEW_SEQ_NO),
        MessageDef::new("5", "Logout", Admin)
            .allow(tags::TEXT)
            .allow(tags::ENCODED_TEXT_LEN)
            .allow(tags::ENCODED_TEXT),
        logon,
    ]
}

fn order_flow_messages() -> Vec<MessageDef> {
    use MessageCategory::App;
    vec![
        MessageDef::new("D", "NewOrderSingle", App)
            .require(tags::CL_ORD_ID)
            .allow(tags::ACCOUNT)
            .allow(21)
            .require(tags::SYMBOL)
            .require(54)
            .allow(60)
            .require(38)
            .require(40)
            .allow(44)
            .allow(tags::TEXT),
        MessageDef::new("F", "OrderCancelRequest", App)
            .require(41)
            .require(tags::CL_ORD_ID)
            .allow(37)
            .require(tags::SYMBOL)
            .require(54)
            .allow(60)
            .allow(38)
            .allow(tags::TEXT),
        MessageDef::new("8", "ExecutionReport", App)
            .require(37)
            .allow(tags::CL_ORD_ID)
            .allow(41)
            .require(17)
            .require(150)
            .require(39)
            .require(tags::SYMBOL)
            .require(54)
            .allow(38)
            .allow(44)
            .require(151)
            .require(14)
            .require(6)
            .allow(60)
            .allow(tags::TEXT),
        MessageDef::new("9", "OrderCancelReject", App)
            .require(37)
            .require(tags::CL_ORD_ID)
            .allow(41)
            .require(39)
            .require(434)
            .allow(102)
            .allow(tags::TEXT),
        MessageDef::new("B", "News", App)
            .require(148)
            .allow(tags::TEXT),
        MessageDef::new("j", "BusinessMessageReject", App)
            .allow(tags::REF_SEQ_NUM)
            .require(tags::REF_MSG_TYPE)
            .allow(tags::BUSINESS_REJECT_REF_ID)
            .require(tags::BUSINESS_REJECT_REASON)
            .allow(tags::TEXT),
    ]
}
