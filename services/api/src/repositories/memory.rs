//! In-memory storage backend
//!
//! Used when the service runs without a database and by the tests. A single
//! mutex guards the reservations, so the overlap check and the write of
//! `insert`/`update` cannot interleave with another writer.

use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};
use uuid::Uuid;

use super::{ReservationStore, RoomDirectory, RowVersion, StorageError, StorageResult};
use crate::models::{Reservation, ReservationFilter, Room, TimeSlot, reservation::sort_by_start};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    reservations: Arc<Mutex<HashMap<Uuid, Reservation>>>,
    rooms: Arc<Vec<Room>>,
}

impl MemoryStore {
    pub fn with_rooms(rooms: Vec<Room>) -> Self {
        Self {
            reservations: Arc::default(),
            rooms: Arc::new(rooms),
        }
    }

    fn reservations(&self) -> StorageResult<MutexGuard<'_, HashMap<Uuid, Reservation>>> {
        self.reservations
            .lock()
            .map_err(|_| StorageError::Backend("reservation map lock poisoned".to_string()))
    }

    fn conflict_in(
        reservations: &HashMap<Uuid, Reservation>,
        candidate: &Reservation,
        exclude: Option<Uuid>,
    ) -> Option<Reservation> {
        let slot = candidate.slot();
        reservations
            .values()
            .filter(|existing| existing.blocks(candidate.room_id, &slot, exclude))
            .min_by_key(|existing| existing.start_time)
            .cloned()
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StorageResult<()> {
        self.reservations().map(|_| ())
    }

    async fn find(&self, id: Uuid) -> StorageResult<Option<Reservation>> {
        Ok(self.reservations()?.get(&id).cloned())
    }

    async fn list(&self, filter: &ReservationFilter) -> StorageResult<Vec<Reservation>> {
        let mut found: Vec<Reservation> = self
            .reservations()?
            .values()
            .filter(|reservation| filter.matches(reservation))
            .cloned()
            .collect();
        sort_by_start(&mut found);
        Ok(found)
    }

    async fn insert(&self, reservation: &Reservation) -> StorageResult<Reservation> {
        let mut reservations = self.reservations()?;

        if reservation.is_active() {
            if let Some(existing) = Self::conflict_in(&reservations, reservation, None) {
                return Err(StorageError::Conflict(Some(Box::new(existing))));
            }
        }

        reservations.insert(reservation.id, reservation.clone());
        Ok(reservation.clone())
    }

    async fn update(
        &self,
        reservation: &Reservation,
        expected: RowVersion,
        recheck: bool,
    ) -> StorageResult<Option<Reservation>> {
        let mut reservations = self.reservations()?;

        match reservations.get(&reservation.id) {
            Some(stored) if expected.matches(stored) => {}
            _ => return Ok(None),
        }

        if recheck && reservation.is_active() {
            if let Some(existing) =
                Self::conflict_in(&reservations, reservation, Some(reservation.id))
            {
                return Err(StorageError::Conflict(Some(Box::new(existing))));
            }
        }

        reservations.insert(reservation.id, reservation.clone());
        Ok(Some(reservation.clone()))
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.reservations()?.remove(&id).is_some())
    }

    async fn busy_rooms(&self, slot: &TimeSlot) -> StorageResult<Vec<i32>> {
        let mut rooms: Vec<i32> = self
            .reservations()?
            .values()
            .filter(|reservation| reservation.is_active() && reservation.slot().overlaps(slot))
            .map(|reservation| reservation.room_id)
            .collect();
        rooms.sort_unstable();
        rooms.dedup();
        Ok(rooms)
    }
}

#[async_trait]
impl RoomDirectory for MemoryStore {
    async fn find(&self, id: i32) -> StorageResult<Option<Room>> {
        Ok(self.rooms.iter().find(|room| room.id == id).cloned())
    }

    async fn list_active(&self) -> StorageResult<Vec<Room>> {
        let mut rooms: Vec<Room> = self.rooms.iter().filter(|room| room.active).cloned().collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rooms)
    }
}
