//! Store error types.

use eventslot_core::CoreError;
use thiserror::Error;
use uuid::Uuid;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by slot stores and the slot service.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No slots are stored for the event.
    #[error("event not found: {event_id}")]
    EventNotFound { event_id: Uuid },

    /// No slot has this id.
    #[error("slot not found: {slot_id}")]
    SlotNotFound { slot_id: Uuid },

    /// The event could not be expanded; nothing was stored.
    #[error("expansion failed: {0}")]
    Expansion(#[from] CoreError),

    /// A range query's bounds could not form a window.
    #[error("invalid range: {0}")]
    InvalidRange(#[source] CoreError),

    /// The storage backend rejected the operation.
    #[error("storage backend error: {message}")]
    Backend { message: String },
}

impl StoreError {
    pub fn event_not_found(event_id: Uuid) -> Self {
        Self::EventNotFound { event_id }
    }

    pub fn slot_not_found(slot_id: Uuid) -> Self {
        Self::SlotNotFound { slot_id }
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Returns true for the not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EventNotFound { .. } | Self::SlotNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = StoreError::slot_not_found(Uuid::nil());
        assert_eq!(
            err.to_string(),
            "slot not found: 00000000-0000-0000-0000-000000000000"
        );
        assert!(err.is_not_found());

        let err = StoreError::from(CoreError::unknown_zone("Nowhere/City"));
        assert_eq!(err.to_string(), "expansion failed: unknown timezone: Nowhere/City");
        assert!(!err.is_not_found());
    }
}
