//! Store double that behaves like a database that cannot be reached

use async_trait::async_trait;
use uuid::Uuid;

use super::{ReservationStore, RoomDirectory, RowVersion, StorageError, StorageResult};
use crate::models::{Reservation, ReservationFilter, Room, TimeSlot};

pub struct UnreachableStore;

fn down<T>() -> StorageResult<T> {
    Err(StorageError::Unavailable("connection refused".to_string()))
}

#[async_trait]
impl ReservationStore for UnreachableStore {
    fn backend(&self) -> &'static str {
        "unreachable"
    }
    async fn ping(&self) -> StorageResult<()> {
        down()
    }
    async fn find(&self, _id: Uuid) -> StorageResult<Option<Reservation>> {
        down()
    }
    async fn list(&self, _filter: &ReservationFilter) -> StorageResult<Vec<Reservation>> {
        down()
    }
    async fn insert(&self, _reservation: &Reservation) -> StorageResult<Reservation> {
        down()
    }
    async fn update(
        &self,
        _reservation: &Reservation,
        _expected: RowVersion,
        _recheck: bool,
    ) -> StorageResult<Option<Reservation>> {
        down()
    }
    async fn delete(&self, _id: Uuid) -> StorageResult<bool> {
        down()
    }
    async fn busy_rooms(&self, _slot: &TimeSlot) -> StorageResult<Vec<i32>> {
        down()
    }
}

#[async_trait]
impl RoomDirectory for UnreachableStore {
    async fn find(&self, _id: i32) -> StorageResult<Option<Room>> {
        down()
    }
    async fn list_active(&self) -> StorageResult<Vec<Room>> {
        down()
    }
}
