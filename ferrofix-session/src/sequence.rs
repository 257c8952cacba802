/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Sequence number reconciliation.
//!
//! The counters themselves live in the message store. This module classifies
//! an inbound number against the expected one, tracks the outstanding resend
//! range, and holds messages that arrived ahead of a gap.

use ferrofix_core::message::Message;
use std::collections::BTreeMap;

/// Result of sequence number validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceResult {
    /// Sequence number is as expected.
    Ok,
    /// Sequence number is lower than expected (possible duplicate).
    TooLow {
        /// Expected sequence number.
        expected: u64,
        /// Received sequence number.
        received: u64,
    },
    /// Sequence number is higher than expected (gap detected).
    Gap {
        /// Expected sequence number.
        expected: u64,
        /// Received sequence number.
        received: u64,
    },
}

impl SequenceResult {
    /// Classifies `received` against `expected`.
    #[must_use]
    pub const fn check(expected: u64, received: u64) -> Self {
        if received == expected {
            Self::Ok
        } else if received < expected {
            Self::TooLow { expected, received }
        } else {
            Self::Gap { expected, received }
        }
    }
}

/// Inclusive range of inbound numbers we asked the counterparty to resend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResendRange {
    /// First missing number.
    pub begin: u64,
    /// Last missing number.
    pub end: u64,
}

impl ResendRange {
    /// Creates a range.
    #[must_use]
    pub const fn new(begin: u64, end: u64) -> Self {
        Self { begin, end }
    }

    /// Returns true once the expected number has moved past the range.
    #[must_use]
    pub const fn is_satisfied_by(&self, expected: u64) -> bool {
        expected > self.end
    }
}

/// A message held until the gap below it is filled.
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    /// The message.
    pub message: Message,
    /// Already handled on receipt; draining only advances the counter.
    pub processed: bool,
}

/// Messages that arrived ahead of the expected sequence number.
#[derive(Debug, Default)]
pub struct MessageQueue {
    entries: BTreeMap<u64, QueuedMessage>,
}

impl MessageQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds a message that still needs processing.
    pub fn push(&mut self, seq: u64, message: Message) {
        self.entries.entry(seq).or_insert(QueuedMessage {
            message,
            processed: false,
        });
    }

    /// Holds a message that was already handled on receipt.
    pub fn push_marker(&mut self, seq: u64, message: Message) {
        self.entries.insert(
            seq,
            QueuedMessage {
                message,
                processed: true,
            },
        );
    }

    /// Takes the entry for `expected`, discarding anything below it.
    pub fn pop_expected(&mut self, expected: u64) -> Option<QueuedMessage> {
        self.discard_below(expected);
        self.entries.remove(&expected)
    }

    /// Drops entries the counter has already moved past.
    pub fn discard_below(&mut self, expected: u64) {
        self.entries = self.entries.split_off(&expected);
    }

    /// Lowest queued sequence number.
    #[must_use]
    pub fn first_seq(&self) -> Option<u64> {
        self.entries.keys().next().copied()
    }

    /// Number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
