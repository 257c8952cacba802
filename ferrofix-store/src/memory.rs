/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! In-memory message store implementation.

use crate::traits::{MessageStore, MessageStoreFactory};
use async_trait::async_trait;
use bytes::Bytes;
use ferrofix_core::error::StoreError;
use ferrofix_core::session_id::SessionId;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tracing::debug;

/// In-memory message store.
///
/// Messages live in a `BTreeMap` so resend ranges are a single range scan.
#[derive(Debug)]
pub struct MemoryStore {
    messages: RwLock<BTreeMap<u64, Bytes>>,
    next_sender_seq: AtomicU64,
    next_target_seq: AtomicU64,
    creation_time: RwLock<SystemTime>,
}

impl MemoryStore {
    /// Creates a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_initial_seqs(1, 1)
    }

    /// Creates a new memory store with initial sequence numbers.
    #[must_use]
    pub fn with_initial_seqs(sender_seq: u64, target_seq: u64) -> Self {
        Self {
            messages: RwLock::new(BTreeMap::new()),
            next_sender_seq: AtomicU64::new(sender_seq),
            next_target_seq: AtomicU64::new(target_seq),
            creation_time: RwLock::new(SystemTime::now()),
        }
    }

    /// Returns the number of stored messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.read().len()
    }

    /// Checks if a message with the given sequence number exists.
    #[must_use]
    pub fn contains(&self, seq_num: u64) -> bool {
        self.messages.read().contains_key(&seq_num)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append(&self, seq_num: u64, message: Bytes) -> Result<(), StoreError> {
        self.messages.write().insert(seq_num, message);
        Ok(())
    }

    async fn fetch_range(&self, begin: u64, end: u64) -> Result<Vec<(u64, Bytes)>, StoreError> {
        let end = if end == 0 { u64::MAX } else { end };
        if begin > end {
            return Ok(Vec::new());
        }
        let messages = self.messages.read();
        Ok(messages
            .range(begin..=end)
            .map(|(seq, bytes)| (*seq, bytes.clone()))
            .collect())
    }

    fn next_sender_seq(&self) -> u64 {
        self.next_sender_seq.load(Ordering::SeqCst)
    }

    fn next_target_seq(&self) -> u64 {
        self.next_target_seq.load(Ordering::SeqCst)
    }

    fn set_next_sender_seq(&self, seq: u64) {
        self.next_sender_seq.store(seq, Ordering::SeqCst);
    }

    fn set_next_target_seq(&self, seq: u64) {
        self.next_target_seq.store(seq, Ordering::SeqCst);
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.messages.write().clear();
        self.next_sender_seq.store(1, Ordering::SeqCst);
        self.next_target_seq.store(1, Ordering::SeqCst);
        *self.creation_time.write() = SystemTime::now();
        debug!("memory store reset");
        Ok(())
    }

    fn creation_time(&self) -> SystemTime {
        *self.creation_time.read()
    }
}

/// Hands out a fresh [`MemoryStore`] per session.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryStoreFactory;

impl MemoryStoreFactory {
    /// Creates the factory.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl MessageStoreFactory for MemoryStoreFactory {
    fn create(&self, session_id: &SessionId) -> Result<Arc<dyn MessageStore>, StoreError> {
        debug!(session = %session_id, "creating memory store");
        Ok(Arc::new(MemoryStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    #[tokio::test]
    async fn test_memory_store_new() {
        let store = MemoryStore::new();
        assert_eq!(store.next_sender_seq(), 1);
        assert_eq!(store.next_target_seq(), 1);
        assert_eq!(store.message_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_range_skips_missing() {
        let store = MemoryStore::new();
        store.append(1, msg("msg1")).await.unwrap();
        store.append(2, msg("msg2")).await.unwrap();
        store.append(3, msg("msg3")).await.unwrap();
        store.append(5, msg("msg5")).await.unwrap();

        let range = store.fetch_range(2, 5).await.unwrap();
        let seqs: Vec<u64> = range.iter().map(|(seq, _)| *seq).collect();
        assert_eq!(seqs, vec![2, 3, 5]);
        assert_eq!(range[2].1, msg("msg5"));
    }

    #[tokio::test]
    async fn test_fetch_range_open_ended_and_empty() {
        let store = MemoryStore::new();
        store.append(4, msg("a")).await.unwrap();
        store.append(9, msg("b")).await.unwrap();

        assert_eq!(store.fetch_range(5, 0).await.unwrap().len(), 1);
        assert!(store.fetch_range(10, 20).await.unwrap().is_empty());
        assert!(store.fetch_range(8, 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_reset() {
        let store = MemoryStore::with_initial_seqs(10, 20);
        store.append(1, msg("msg1")).await.unwrap();
        assert_eq!(store.next_sender_seq(), 10);
        assert_eq!(store.next_target_seq(), 20);

        store.reset().await.unwrap();
        assert_eq!(store.message_count(), 0);
        assert_eq!(store.next_sender_seq(), 1);
        assert_eq!(store.next_target_seq(), 1);
    }

    #[tokio::test]
    async fn test_factory_creates_independent_stores() {
        let factory = MemoryStoreFactory::new();
        let a = factory.create(&SessionId::new("FIX.4.4", "A", "B")).unwrap();
        let b = factory.create(&SessionId::new("FIX.4.4", "A", "C")).unwrap();
        a.set_next_sender_seq(7);
        assert_eq!(b.next_sender_seq(), 1);
    }
}
