//! In-memory [`SlotStore`].

use std::collections::HashMap;

use eventslot_core::{EventDetails, Slot, TimeWindow};
use tokio::sync::RwLock;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::store::{BoxFuture, SlotStore, SlotUpdate, StoredSlot};

#[derive(Debug, Default)]
struct Tables {
    /// Slots per event, sorted by start instant.
    by_event: HashMap<Uuid, Vec<StoredSlot>>,
    /// Owning event of each slot id.
    owner: HashMap<Uuid, Uuid>,
}

impl Tables {
    fn insert_batch(&mut self, event_id: Uuid, slots: Vec<Slot>) -> Vec<StoredSlot> {
        let stored: Vec<StoredSlot> = slots.into_iter().map(StoredSlot::assign).collect();
        for slot in &stored {
            self.owner.insert(slot.id, event_id);
        }

        let entry = self.by_event.entry(event_id).or_default();
        entry.extend(stored.iter().cloned());
        sort_by_start(entry);
        stored
    }

    fn remove_event(&mut self, event_id: Uuid) -> usize {
        let Some(removed) = self.by_event.remove(&event_id) else {
            return 0;
        };
        for slot in &removed {
            self.owner.remove(&slot.id);
        }
        removed.len()
    }

    fn locate(&self, slot_id: Uuid) -> StoreResult<(Uuid, usize)> {
        let event_id = *self
            .owner
            .get(&slot_id)
            .ok_or_else(|| StoreError::slot_not_found(slot_id))?;
        let position = self
            .by_event
            .get(&event_id)
            .and_then(|slots| slots.iter().position(|s| s.id == slot_id))
            .ok_or_else(|| StoreError::backend(format!("slot index out of sync for {slot_id}")))?;
        Ok((event_id, position))
    }
}

fn sort_by_start(slots: &mut [StoredSlot]) {
    slots.sort_by_key(|stored| stored.slot.span.start_instant());
}

fn check_ownership(event_id: Uuid, slots: &[Slot]) -> StoreResult<()> {
    match slots.iter().find(|slot| slot.event_id != event_id) {
        Some(slot) => Err(StoreError::backend(format!(
            "slot of event {} cannot be stored under event {event_id}",
            slot.event_id
        ))),
        None => Ok(()),
    }
}

/// A [`SlotStore`] kept in process memory.
///
/// Each operation takes the lock once, so concurrent readers never observe a
/// half-applied batch.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored slots.
    pub async fn len(&self) -> usize {
        self.tables.read().await.owner.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl SlotStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn persist_slots(
        &self,
        event_id: Uuid,
        slots: Vec<Slot>,
    ) -> BoxFuture<'_, StoreResult<Vec<StoredSlot>>> {
        Box::pin(async move {
            check_ownership(event_id, &slots)?;
            let mut tables = self.tables.write().await;
            let stored = tables.insert_batch(event_id, slots);
            debug!(%event_id, count = stored.len(), "persisted slots");
            Ok(stored)
        })
    }

    fn delete_slots_for_event(&self, event_id: Uuid) -> BoxFuture<'_, StoreResult<usize>> {
        Box::pin(async move {
            let removed = self.tables.write().await.remove_event(event_id);
            debug!(%event_id, removed, "deleted slots for event");
            Ok(removed)
        })
    }

    fn replace_slots(
        &self,
        event_id: Uuid,
        slots: Vec<Slot>,
    ) -> BoxFuture<'_, StoreResult<Vec<StoredSlot>>> {
        Box::pin(async move {
            check_ownership(event_id, &slots)?;
            let mut tables = self.tables.write().await;
            let removed = tables.remove_event(event_id);
            let stored = tables.insert_batch(event_id, slots);
            debug!(%event_id, removed, inserted = stored.len(), "replaced slots");
            Ok(stored)
        })
    }

    fn update_details_for_event(
        &self,
        event_id: Uuid,
        details: EventDetails,
    ) -> BoxFuture<'_, StoreResult<usize>> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let slots = tables
                .by_event
                .get_mut(&event_id)
                .filter(|slots| !slots.is_empty())
                .ok_or_else(|| StoreError::event_not_found(event_id))?;
            for stored in slots.iter_mut() {
                stored.slot.details = details.clone();
            }
            debug!(%event_id, count = slots.len(), "updated slot details");
            Ok(slots.len())
        })
    }

    fn slots_for_event(&self, event_id: Uuid) -> BoxFuture<'_, StoreResult<Vec<StoredSlot>>> {
        Box::pin(async move {
            let tables = self.tables.read().await;
            Ok(tables.by_event.get(&event_id).cloned().unwrap_or_default())
        })
    }

    fn slots_in_range(&self, window: TimeWindow) -> BoxFuture<'_, StoreResult<Vec<StoredSlot>>> {
        Box::pin(async move {
            let tables = self.tables.read().await;
            let mut found: Vec<StoredSlot> = tables
                .by_event
                .values()
                .flatten()
                .filter(|stored| stored.slot.span.starts_within(&window))
                .cloned()
                .collect();
            sort_by_start(&mut found);
            trace!(start = %window.start, end = %window.end, count = found.len(), "range query");
            Ok(found)
        })
    }

    fn update_slot(
        &self,
        slot_id: Uuid,
        update: SlotUpdate,
    ) -> BoxFuture<'_, StoreResult<StoredSlot>> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let (event_id, position) = tables.locate(slot_id)?;
            let slots = tables
                .by_event
                .get_mut(&event_id)
                .ok_or_else(|| StoreError::event_not_found(event_id))?;

            update.apply(&mut slots[position].slot);
            let updated = slots[position].clone();
            sort_by_start(slots);
            debug!(%slot_id, %event_id, "updated slot");
            Ok(updated)
        })
    }

    fn delete_slot(&self, slot_id: Uuid) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let (event_id, position) = tables.locate(slot_id)?;
            let emptied = match tables.by_event.get_mut(&event_id) {
                Some(slots) => {
                    slots.remove(position);
                    slots.is_empty()
                }
                None => false,
            };
            if emptied {
                tables.by_event.remove(&event_id);
            }
            tables.owner.remove(&slot_id);
            debug!(%slot_id, %event_id, "deleted slot");
            Ok(())
        })
    }
}
