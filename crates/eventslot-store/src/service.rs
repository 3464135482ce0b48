//! Slot lifecycle on top of a [`SlotStore`].
//!
//! [`SlotService`] is the only place where expansion and persistence meet:
//! it expands an event completely before handing the batch to the store, so
//! a failed expansion never leaves partial slots behind.

use std::sync::Arc;

use chrono::NaiveDateTime;
use chrono_tz::Tz;
use eventslot_core::{Event, TimeWindow, expand};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::store::{SlotStore, SlotUpdate, StoredSlot};

/// What [`SlotService::update_event`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventUpdate {
    /// Nothing differed.
    Unchanged,
    /// Only details differed; they were written to this many slots.
    DetailsPropagated { count: usize },
    /// The schedule differed; the event's slots were rebuilt.
    Regenerated { slots: Vec<StoredSlot> },
}

/// Creates, rebuilds and queries the slots of events.
#[derive(Clone)]
pub struct SlotService {
    store: Arc<dyn SlotStore>,
}

impl std::fmt::Debug for SlotService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotService")
            .field("store", &self.store.name())
            .finish()
    }
}

impl SlotService {
    pub fn new(store: Arc<dyn SlotStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SlotStore> {
        &self.store
    }

    /// Expands `event` and stores its slots as one batch.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Expansion`](crate::StoreError::Expansion) if any
    /// occurrence fails to materialize; nothing is stored in that case.
    pub async fn create(&self, event: &Event) -> StoreResult<Vec<StoredSlot>> {
        let slots = expand(event)?;
        let stored = self.store.persist_slots(event.id, slots).await?;
        info!(
            event_id = %event.id,
            count = stored.len(),
            store = self.store.name(),
            "created slots"
        );
        Ok(stored)
    }

    /// Replaces the stored slots of `event` with a fresh expansion.
    pub async fn regenerate(&self, event: &Event) -> StoreResult<Vec<StoredSlot>> {
        let slots = expand(event)?;
        let stored = self.store.replace_slots(event.id, slots).await?;
        info!(event_id = %event.id, count = stored.len(), "regenerated slots");
        Ok(stored)
    }

    /// Brings stored slots in line with an edited event.
    ///
    /// A changed span or rule rebuilds every slot. Changed details alone are
    /// written over the existing slots, keeping their ids and any per-slot
    /// span edits.
    ///
    /// # Panics
    ///
    /// Panics if `previous` and `updated` are different events.
    pub async fn update_event(
        &self,
        previous: &Event,
        updated: &Event,
    ) -> StoreResult<EventUpdate> {
        assert_eq!(
            previous.id, updated.id,
            "update_event needs two versions of the same event"
        );

        if !previous.same_schedule(updated) {
            let slots = self.regenerate(updated).await?;
            return Ok(EventUpdate::Regenerated { slots });
        }
        if previous.details == updated.details {
            debug!(event_id = %updated.id, "event unchanged");
            return Ok(EventUpdate::Unchanged);
        }

        let count = self
            .store
            .update_details_for_event(updated.id, updated.details.clone())
            .await?;
        info!(event_id = %updated.id, count, "propagated event details");
        Ok(EventUpdate::DetailsPropagated { count })
    }

    /// Removes every slot of an event.
    pub async fn delete_event(&self, event_id: Uuid) -> StoreResult<usize> {
        let removed = self.store.delete_slots_for_event(event_id).await?;
        info!(%event_id, removed, "deleted event slots");
        Ok(removed)
    }

    /// Slots of one event in ascending start order.
    pub async fn slots_for_event(&self, event_id: Uuid) -> StoreResult<Vec<StoredSlot>> {
        self.store.slots_for_event(event_id).await
    }

    /// Slots starting inside `window`, across all events.
    pub async fn slots_in_range(&self, window: TimeWindow) -> StoreResult<Vec<StoredSlot>> {
        self.store.slots_in_range(window).await
    }

    /// Slots starting between two wall-clock times, each read in its own
    /// zone.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRange`] if a bound cannot be converted
    /// to UTC or the start falls after the end.
    pub async fn slots_between(
        &self,
        start: NaiveDateTime,
        start_zone: Tz,
        end: NaiveDateTime,
        end_zone: Tz,
    ) -> StoreResult<Vec<StoredSlot>> {
        let window = TimeWindow::from_zoned(start, start_zone, end, end_zone)
            .map_err(StoreError::InvalidRange)?;
        debug!(start = %window.start, end = %window.end, "querying slots");
        self.store.slots_in_range(window).await
    }

    pub async fn update_slot(&self, slot_id: Uuid, update: SlotUpdate) -> StoreResult<StoredSlot> {
        self.store.update_slot(slot_id, update).await
    }

    pub async fn delete_slot(&self, slot_id: Uuid) -> StoreResult<()> {
        self.store.delete_slot(slot_id).await
    }
}
