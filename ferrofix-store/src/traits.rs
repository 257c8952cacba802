/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Message store trait definitions.

use async_trait::async_trait;
use bytes::Bytes;
use ferrofix_core::error::StoreError;
use ferrofix_core::session_id::SessionId;
use std::sync::Arc;
use std::time::SystemTime;

/// Persistence for one session's outgoing messages and sequence counters.
///
/// The owning session is the only writer. Range reads for resends may run
/// while new messages are appended.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Stores an outgoing message under its sequence number.
    ///
    /// # Errors
    /// Returns `StoreError` if the message cannot be stored.
    async fn append(&self, seq_num: u64, message: Bytes) -> Result<(), StoreError>;

    /// Retrieves stored messages with `begin <= seq <= end`, ordered by seq.
    ///
    /// An `end` of 0 means "through the last stored message". Numbers that
    /// were never stored are simply absent from the result.
    ///
    /// # Errors
    /// Returns `StoreError` if the backing storage cannot be read.
    async fn fetch_range(&self, begin: u64, end: u64) -> Result<Vec<(u64, Bytes)>, StoreError>;

    /// Returns the next sender sequence number.
    fn next_sender_seq(&self) -> u64;

    /// Returns the next expected target sequence number.
    fn next_target_seq(&self) -> u64;

    /// Sets the next sender sequence number.
    fn set_next_sender_seq(&self, seq: u64);

    /// Sets the next expected target sequence number.
    fn set_next_target_seq(&self, seq: u64);

    /// Resets the store, clearing all messages and setting both counters to 1.
    ///
    /// # Errors
    /// Returns `StoreError` if the reset fails.
    async fn reset(&self) -> Result<(), StoreError>;

    /// Returns the creation time of the store/session.
    fn creation_time(&self) -> SystemTime;

    /// Reloads state from persistent storage.
    ///
    /// # Errors
    /// Returns `StoreError` if the refresh fails.
    async fn refresh(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Creates the store for a session when the session is first built.
pub trait MessageStoreFactory: Send + Sync {
    /// Creates or opens the store for `session_id`.
    ///
    /// # Errors
    /// Returns `StoreError` if the store cannot be opened.
    fn create(&self, session_id: &SessionId) -> Result<Arc<dyn MessageStore>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullStore;

    #[async_trait]
    impl MessageStore for NullStore {
        async fn append(&self, _seq_num: u64, _message: Bytes) -> Result<(), StoreError> {
            Ok(())
        }

        async fn fetch_range(
            &self,
            _begin: u64,
            _end: u64,
        ) -> Result<Vec<(u64, Bytes)>, StoreError> {
            Ok(vec![])
        }

        fn next_sender_seq(&self) -> u64 {
            1
        }

        fn next_target_seq(&self) -> u64 {
            1
        }

        fn set_next_sender_seq(&self, _seq: u64) {}

        fn set_next_target_seq(&self, _seq: u64) {}

        async fn reset(&self) -> Result<(), StoreError> {
            Ok(())
        }

        fn creation_time(&self) -> SystemTime {
            SystemTime::UNIX_EPOCH
        }
    }

    #[tokio::test]
    async fn test_trait_object_usable() {
        let store: Arc<dyn MessageStore> = Arc::new(NullStore);
        assert!(store.append(1, Bytes::from_static(b"x")).await.is_ok());
        assert!(store.fetch_range(1, 0).await.unwrap().is_empty());
        assert!(store.refresh().await.is_ok());
        assert_eq!(store.creation_time(), SystemTime::UNIX_EPOCH);
    }
}
