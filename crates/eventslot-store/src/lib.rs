//! Slot persistence: the [`SlotStore`] trait and its in-memory backend.
//!
//! ```text
//!  Event ──expand()──▶ Vec<Slot> ──SlotService──▶ SlotStore
//!                                                  └─ MemoryStore
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use eventslot_store::{MemoryStore, SlotService};
//!
//! let service = SlotService::new(Arc::new(MemoryStore::new()));
//! let stored = service.create(&event).await?;
//! ```

pub mod error;
pub mod memory;
pub mod service;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use service::{EventUpdate, SlotService};
pub use store::{BoxFuture, SlotStore, SlotUpdate, StoredSlot};
