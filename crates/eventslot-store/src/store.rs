//! The [`SlotStore`] trait.
//!
//! A store owns materialized slots and assigns their ids. Every batch method
//! is atomic: either the whole batch is applied or the store is left
//! unchanged.

use std::future::Future;
use std::pin::Pin;

use eventslot_core::{EventDetails, Slot, SlotSpan, TimeWindow};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreResult;

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A slot as held by a store, with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSlot {
    pub id: Uuid,
    pub slot: Slot,
}

impl StoredSlot {
    /// Wraps `slot` under a fresh random id.
    pub fn assign(slot: Slot) -> Self {
        Self {
            id: Uuid::new_v4(),
            slot,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.slot.event_id
    }
}

/// Changes to a single stored slot. Absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotUpdate {
    pub span: Option<SlotSpan>,
    pub details: Option<EventDetails>,
}

impl SlotUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_span(mut self, span: SlotSpan) -> Self {
        self.span = Some(span);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: EventDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_none() && self.details.is_none()
    }

    /// Applies the update to `slot` in place.
    pub fn apply(self, slot: &mut Slot) {
        if let Some(span) = self.span {
            slot.span = span;
        }
        if let Some(details) = self.details {
            slot.details = details;
        }
    }
}

/// Persistence for materialized slots.
///
/// Slot lists returned by a store are ordered by
/// [`SlotSpan::start_instant`] ascending.
pub trait SlotStore: Send + Sync {
    /// Returns the backend name, for logging.
    fn name(&self) -> &str;

    /// Stores `slots` for `event_id` as one batch and returns them with
    /// their assigned ids.
    ///
    /// # Errors
    ///
    /// Fails without storing anything if a slot belongs to another event.
    fn persist_slots(
        &self,
        event_id: Uuid,
        slots: Vec<Slot>,
    ) -> BoxFuture<'_, StoreResult<Vec<StoredSlot>>>;

    /// Removes every slot of `event_id` and returns how many were removed.
    fn delete_slots_for_event(&self, event_id: Uuid) -> BoxFuture<'_, StoreResult<usize>>;

    /// Deletes every slot of `event_id` and stores `slots` in their place, as
    /// one batch.
    fn replace_slots(
        &self,
        event_id: Uuid,
        slots: Vec<Slot>,
    ) -> BoxFuture<'_, StoreResult<Vec<StoredSlot>>>;

    /// Overwrites the details of every slot of `event_id` and returns how
    /// many slots changed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EventNotFound`](crate::StoreError::EventNotFound)
    /// if the event has no slots.
    fn update_details_for_event(
        &self,
        event_id: Uuid,
        details: EventDetails,
    ) -> BoxFuture<'_, StoreResult<usize>>;

    /// Returns the slots of `event_id`; empty if there are none.
    fn slots_for_event(&self, event_id: Uuid) -> BoxFuture<'_, StoreResult<Vec<StoredSlot>>>;

    /// Returns every slot whose start instant falls inside `window`.
    fn slots_in_range(&self, window: TimeWindow) -> BoxFuture<'_, StoreResult<Vec<StoredSlot>>>;

    /// Applies `update` to one slot and returns the result.
    fn update_slot(
        &self,
        slot_id: Uuid,
        update: SlotUpdate,
    ) -> BoxFuture<'_, StoreResult<StoredSlot>>;

    /// Removes one slot.
    fn delete_slot(&self, slot_id: Uuid) -> BoxFuture<'_, StoreResult<()>>;
}
