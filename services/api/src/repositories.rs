//! Persistence ports and their implementations
//!
//! The reservation service talks to storage only through [`ReservationStore`]
//! and [`RoomDirectory`]. Every call returns a [`StorageResult`]; deciding
//! what to do when storage is unreachable is left to the service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Reservation, ReservationFilter, ReservationStatus, Room, TimeSlot};

pub mod memory;
pub mod reservation;
pub mod room;
#[cfg(test)]
pub mod unreachable;

pub use memory::MemoryStore;
pub use reservation::PgReservationStore;
pub use room::PgRoomDirectory;

/// SQLSTATE raised by the overlap exclusion constraint
const EXCLUSION_VIOLATION: &str = "23P01";
/// SQLSTATE raised when a serializable transaction loses a race
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE raised while the schema has not been migrated yet
const UNDEFINED_TABLE: &str = "42P01";

/// Errors returned by the persistence ports
#[derive(Error, Debug)]
pub enum StorageError {
    /// The datastore could not be reached
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// An active reservation already holds the slot
    ///
    /// Carries the conflicting reservation when the store found it itself;
    /// `None` when the conflict surfaced as a constraint violation.
    #[error("Room already booked in this interval")]
    Conflict(Option<Box<Reservation>>),

    /// A concurrent transaction won; the write may be retried
    #[error("Concurrent write: {0}")]
    Contention(String),

    /// Any other storage failure
    #[error("Storage error: {0}")]
    Backend(String),
}

/// Type alias for Result with StorageError
pub type StorageResult<T> = Result<T, StorageError>;

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StorageError::Unavailable(err.to_string()),
            sqlx::Error::Database(db) => match db.code().as_deref() {
                Some(EXCLUSION_VIOLATION) => StorageError::Conflict(None),
                Some(SERIALIZATION_FAILURE) => StorageError::Contention(err.to_string()),
                Some(UNDEFINED_TABLE) => StorageError::Unavailable(err.to_string()),
                _ => StorageError::Backend(err.to_string()),
            },
            _ => StorageError::Backend(err.to_string()),
        }
    }
}

impl StorageError {
    /// Contention on a write that checked for overlaps means the slot was taken
    pub(crate) fn after_overlap_check(self) -> Self {
        match self {
            StorageError::Contention(_) => StorageError::Conflict(None),
            other => other,
        }
    }
}

/// The state of a reservation row when it was read
///
/// Updates carry the version they were computed from and only apply while
/// the stored row still matches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowVersion {
    pub updated_at: DateTime<Utc>,
    pub status: ReservationStatus,
}

impl RowVersion {
    pub fn of(reservation: &Reservation) -> Self {
        Self {
            updated_at: reservation.updated_at,
            status: reservation.status,
        }
    }

    pub fn matches(&self, reservation: &Reservation) -> bool {
        *self == Self::of(reservation)
    }
}

/// Reservation persistence port
///
/// `insert` and `update` perform the overlap check and the write atomically.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Short backend name reported by the health endpoint
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> StorageResult<()>;

    async fn find(&self, id: Uuid) -> StorageResult<Option<Reservation>>;

    /// Matching reservations ordered by start time
    async fn list(&self, filter: &ReservationFilter) -> StorageResult<Vec<Reservation>>;

    /// Persist a new reservation unless an active one in the same room overlaps
    async fn insert(&self, reservation: &Reservation) -> StorageResult<Reservation>;

    /// Overwrite a reservation, re-probing for overlaps first when `recheck`
    ///
    /// The write only applies while the stored row is still at `expected`.
    /// Returns `None` when the reservation no longer exists or has changed
    /// since it was read.
    async fn update(
        &self,
        reservation: &Reservation,
        expected: RowVersion,
        recheck: bool,
    ) -> StorageResult<Option<Reservation>>;

    /// Returns whether a row was removed
    async fn delete(&self, id: Uuid) -> StorageResult<bool>;

    /// Rooms holding an active reservation overlapping `slot`
    async fn busy_rooms(&self, slot: &TimeSlot) -> StorageResult<Vec<i32>>;
}

/// Read-only room directory port
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    async fn find(&self, id: i32) -> StorageResult<Option<Room>>;

    /// Active rooms ordered by name
    async fn list_active(&self) -> StorageResult<Vec<Room>>;
}
