/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! # FerroFix Store
//!
//! Message persistence for the FerroFix FIX engine.
//!
//! - **MessageStore trait**: sent messages by sequence number plus the two
//!   sequence counters of a session
//! - **MessageStoreFactory trait**: one store per session
//! - **MemoryStore**: in-memory store, lost when the process exits

pub mod memory;
pub mod traits;

pub use memory::{MemoryStore, MemoryStoreFactory};
pub use traits::{MessageStore, MessageStoreFactory};
