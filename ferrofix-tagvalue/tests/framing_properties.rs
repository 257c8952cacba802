/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Property-based tests for the framer, parser and encoder.
//!
//! - decode(encode(m)) is byte exact
//! - frame boundaries do not depend on how the stream was split
//! - garbage before a header, including cut-off headers and frames, never
//!   hides the messages after it

use bytes::BytesMut;
use ferrofix_core::field::Field;
use ferrofix_core::message::{Message, MsgType};
use ferrofix_core::tags;
use ferrofix_tagvalue::{Framer, encode, parse_message};
use proptest::prelude::*;

fn value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ._:-]{1,20}"
}

fn msg_type_strategy() -> impl Strategy<Value = MsgType> {
    prop_oneof![
        Just(MsgType::Heartbeat),
        Just(MsgType::TestRequest),
        Just(MsgType::NewOrderSingle),
        Just(MsgType::ExecutionReport),
        Just(MsgType::Custom("U7".to_string())),
    ]
}

fn message_strategy() -> impl Strategy<Value = Message> {
    (
        prop_oneof![Just("FIX.4.2"), Just("FIX.4.4"), Just("FIXT.1.1")],
        msg_type_strategy(),
        1u64..=1_000_000,
        prop::collection::vec((5001u32..6000, value_strategy()), 0..12),
    )
        .prop_map(|(begin, msg_type, seq, body)| {
            let mut msg = Message::new(begin, msg_type);
            msg.header.set_str(tags::SENDER_COMP_ID, "SENDER");
            msg.header.set_str(tags::TARGET_COMP_ID, "TARGET");
            msg.header.set_u64(tags::MSG_SEQ_NUM, seq);
            msg.header.set_str(tags::SENDING_TIME, "20240115-10:30:00.000");
            for (tag, value) in body {
                msg.body.add(Field::from_str_value(tag, &value));
            }
            msg
        })
}

fn drain(framer: &Framer, buf: &mut BytesMut) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    while let Some(frame) = framer.decode(buf).unwrap() {
        frames.push(frame.to_vec());
    }
    frames
}

#[test]
fn prop_encode_decode_is_byte_exact() {
    proptest!(|(msg in message_strategy())| {
        let frame = encode(&msg).unwrap();
        let decoded = parse_message(frame.clone()).unwrap();
        prop_assert_eq!(decoded.msg_type(), msg.msg_type());
        prop_assert_eq!(decoded.body.len(), msg.body.len());
        let again = encode(&decoded).unwrap();
        prop_assert_eq!(&again[..], &frame[..]);
    });
}

#[test]
fn prop_framing_independent_of_fragmentation() {
    proptest!(|(
        msgs in prop::collection::vec(message_strategy(), 1..5),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
    )| {
        let mut stream = Vec::new();
        let mut expected = Vec::new();
        for msg in &msgs {
            let frame = encode(msg).unwrap();
            stream.extend_from_slice(&frame);
            expected.push(frame.to_vec());
        }

        let mut points: Vec<usize> = cuts.iter().map(|i| i.index(stream.len())).collect();
        points.push(stream.len());
        points.sort_unstable();

        let framer = Framer::new();
        let mut buf = BytesMut::new();
        let mut frames = Vec::new();
        let mut start = 0;
        for end in points {
            buf.extend_from_slice(&stream[start..end]);
            frames.extend(drain(&framer, &mut buf));
            start = end;
        }
        prop_assert_eq!(frames, expected);
    });
}

#[test]
fn prop_every_split_point_gives_same_frame() {
    let mut msg = Message::new("FIX.4.2", MsgType::MarketDataIncrementalRefresh);
    msg.body.set_u64(tags::HEART_BT_INT, 30);
    let frame = encode(&msg).unwrap();
    let framer = Framer::new();

    for split in 1..frame.len() {
        let mut buf = BytesMut::from(&frame[..split]);
        assert!(framer.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&frame[split..]);
        let got = framer.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&got[..], &frame[..], "split at {}", split);
    }
}

/// Noise bytes, header fragments and cut-off frames.
fn garbage_strategy() -> impl Strategy<Value = Vec<u8>> {
    let chunk = prop_oneof![
        prop::collection::vec(any::<u8>().prop_filter("no header start", |b| *b != b'8'), 1..16),
        Just(b"8=".to_vec()),
        Just(b"8=FIX".to_vec()),
        Just(b"8=FIX.4".to_vec()),
        Just(b"8=FIX.4.2\x019=".to_vec()),
        Just(b"8=FIX.4.2\x019=40\x0135=D\x0149=A".to_vec()),
        (message_strategy(), any::<prop::sample::Index>()).prop_map(|(msg, cut)| {
            let frame = encode(&msg).unwrap();
            frame[..1 + cut.index(frame.len() - 1)].to_vec()
        }),
    ];
    prop::collection::vec(chunk, 0..4).prop_map(|chunks| chunks.concat())
}

#[test]
fn prop_garbage_prefix_skipped() {
    proptest!(|(
        garbage in garbage_strategy(),
        msgs in prop::collection::vec(message_strategy(), 1..4),
    )| {
        let mut buf = BytesMut::from(&garbage[..]);
        let mut expected = Vec::new();
        for msg in &msgs {
            let frame = encode(msg).unwrap();
            buf.extend_from_slice(&frame);
            expected.push(frame.to_vec());
        }

        let frames = drain(&Framer::new(), &mut buf);
        prop_assert_eq!(frames, expected);
    });
}
