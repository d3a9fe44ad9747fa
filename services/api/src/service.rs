//! Reservation lifecycle and conflict rules
//!
//! [`ReservationService`] validates requests, enforces ownership and keeps
//! active reservations of a room from overlapping. Storage outages are
//! handled here, once: reads fall back to the fixed dataset in
//! [`crate::fallback`] when the [`DegradePolicy`] allows it, writes always
//! fail with [`ReservationError::TransientStorage`].

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    fallback,
    models::{
        ANONYMOUS_OWNER, AvailabilityQuery, CreateReservationRequest, Reservation,
        ReservationFilter, ReservationStatus, Room, TimeSlot, UpdateReservationRequest,
        reservation::sort_by_start,
    },
    repositories::{ReservationStore, RoomDirectory, RowVersion, StorageError},
    validation::{self, Patched},
};

const DEFAULT_AGENDA_DAYS: i64 = 7;

/// Reservation that blocked a create or update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictInfo {
    #[serde(rename = "id")]
    pub reservation_id: Uuid,
    pub room_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl From<&Reservation> for ConflictInfo {
    fn from(reservation: &Reservation) -> Self {
        Self {
            reservation_id: reservation.id,
            room_id: reservation.room_id,
            start_time: reservation.start_time,
            end_time: reservation.end_time,
        }
    }
}

/// Errors returned by the reservation service
#[derive(Error, Debug)]
pub enum ReservationError {
    /// Bad or missing input
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// The room is already booked in the requested interval
    #[error("Room already booked in this interval")]
    Conflict(Option<ConflictInfo>),

    #[error("Reservation not found")]
    NotFound,

    /// The reservation changed between reading and writing it
    #[error("Reservation was modified concurrently; reload and retry")]
    Stale,

    #[error("Room {0} not found")]
    RoomNotFound(i32),

    /// The caller does not own the reservation
    #[error("Not allowed to modify this reservation")]
    Authorization,

    /// The datastore is unreachable
    #[error("Storage temporarily unavailable")]
    TransientStorage,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for ReservationError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable(_) => ReservationError::TransientStorage,
            StorageError::Conflict(existing) => {
                ReservationError::Conflict(existing.as_deref().map(ConflictInfo::from))
            }
            StorageError::Contention(_) => ReservationError::Stale,
            StorageError::Backend(message) => ReservationError::Storage(message),
        }
    }
}

/// How reads behave while storage is unreachable
#[derive(Debug, Clone, Copy)]
pub struct DegradePolicy {
    /// Serve the fallback dataset instead of failing
    pub fallback_reads: bool,
}

/// A read result, flagged when it came from the fallback dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Served<T> {
    pub value: T,
    pub degraded: bool,
}

impl<T> Served<T> {
    fn fresh(value: T) -> Self {
        Self {
            value,
            degraded: false,
        }
    }

    fn degraded(value: T) -> Self {
        Self {
            value,
            degraded: true,
        }
    }
}

/// Outcome of a successful create
#[derive(Debug, Clone)]
pub struct Created {
    pub reservation: Reservation,
    /// Non-fatal remarks, such as a capacity overrun
    pub warnings: Vec<String>,
}

/// Outcome of an update
#[derive(Debug, Clone)]
pub struct Updated {
    pub reservation: Reservation,
    /// True when this update moved a confirmed reservation to cancelled
    pub cancelled: bool,
}

/// Outcome of a cancel
#[derive(Debug, Clone)]
pub struct Cancellation {
    pub reservation: Reservation,
    /// False when the reservation was already cancelled
    pub changed: bool,
}

#[derive(Clone)]
pub struct ReservationService {
    store: Arc<dyn ReservationStore>,
    rooms: Arc<dyn RoomDirectory>,
    policy: DegradePolicy,
}

impl ReservationService {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        rooms: Arc<dyn RoomDirectory>,
        policy: DegradePolicy,
    ) -> Self {
        Self {
            store,
            rooms,
            policy,
        }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub async fn storage_healthy(&self) -> bool {
        self.store.ping().await.is_ok()
    }

    fn degrade<T>(
        &self,
        operation: &'static str,
        err: StorageError,
        fallback: impl FnOnce() -> Option<T>,
    ) -> Result<Served<T>, ReservationError> {
        if let StorageError::Unavailable(reason) = &err {
            if self.policy.fallback_reads {
                if let Some(value) = fallback() {
                    warn!(operation, %reason, "Storage unavailable, serving fallback data");
                    return Ok(Served::degraded(value));
                }
            }
        }
        error!(operation, error = %err, "Read failed");
        Err(err.into())
    }

    fn write_failed(&self, operation: &'static str, err: StorageError) -> ReservationError {
        match &err {
            StorageError::Conflict(_) => info!(operation, "Rejected overlapping reservation"),
            StorageError::Contention(reason) => info!(operation, %reason, "Write lost a race"),
            _ => error!(operation, error = %err, "Write failed"),
        }
        err.into()
    }

    fn authorize(
        &self,
        reservation: &Reservation,
        caller: Option<Uuid>,
    ) -> Result<(), ReservationError> {
        match caller {
            Some(caller) if caller != reservation.owner_id => {
                warn!(reservation_id = %reservation.id, %caller, "Rejected mutation by non-owner");
                Err(ReservationError::Authorization)
            }
            _ => Ok(()),
        }
    }

    async fn load_for_write(&self, id: Uuid) -> Result<Reservation, ReservationError> {
        self.store
            .find(id)
            .await
            .map_err(|err| self.write_failed("load", err))?
            .ok_or(ReservationError::NotFound)
    }

    /// Write `next` over `current`
    ///
    /// `Ok(None)` means the row changed or vanished since `current` was read.
    async fn write_over(
        &self,
        operation: &'static str,
        current: &Reservation,
        next: &Reservation,
        recheck: bool,
    ) -> Result<Option<Reservation>, ReservationError> {
        self.store
            .update(next, RowVersion::of(current), recheck)
            .await
            .map_err(|err| self.write_failed(operation, err))
    }

    /// Explain a write that found its row changed or gone
    async fn lost_write(&self, operation: &'static str, id: Uuid) -> ReservationError {
        match self.store.find(id).await {
            Ok(None) => ReservationError::NotFound,
            _ => {
                info!(operation, reservation_id = %id, "Rejected write from a stale read");
                ReservationError::Stale
            }
        }
    }

    async fn capacity_warnings(&self, room_id: i32, participants: i32) -> Vec<String> {
        match self.rooms.find(room_id).await {
            Ok(Some(room)) => {
                let mut warnings = Vec::new();
                if !room.active {
                    warnings.push(format!("Room {} is currently inactive", room.name));
                }
                if participants > room.capacity {
                    warnings.push(format!(
                        "{participants} participants exceed the capacity of {} ({})",
                        room.name, room.capacity
                    ));
                }
                warnings
            }
            Ok(None) => vec![format!("Room {room_id} is not listed in the room directory")],
            Err(err) => {
                warn!(room_id, error = %err, "Room lookup failed, skipping capacity check");
                Vec::new()
            }
        }
    }

    /// Create a confirmed reservation owned by `caller`
    pub async fn create(
        &self,
        request: CreateReservationRequest,
        caller: Option<Uuid>,
    ) -> Result<Created, ReservationError> {
        let draft = validation::validate_create(request)?;
        let now = Utc::now();

        let reservation = Reservation {
            id: Uuid::new_v4(),
            room_id: draft.room_id,
            title: draft.title,
            description: draft.description,
            participants: draft.participants,
            start_time: draft.slot.start,
            end_time: draft.slot.end,
            owner_id: caller.unwrap_or(ANONYMOUS_OWNER),
            status: ReservationStatus::Confirmed,
            created_at: now,
            updated_at: now,
        };

        let warnings = self
            .capacity_warnings(reservation.room_id, reservation.participants)
            .await;

        let reservation = self
            .store
            .insert(&reservation)
            .await
            .map_err(|err| self.write_failed("create", err))?;

        info!(
            reservation_id = %reservation.id,
            room_id = reservation.room_id,
            owner_id = %reservation.owner_id,
            "Reservation created"
        );

        Ok(Created {
            reservation,
            warnings,
        })
    }

    pub async fn read(&self, id: Uuid) -> Result<Served<Reservation>, ReservationError> {
        match self.store.find(id).await {
            Ok(Some(reservation)) => Ok(Served::fresh(reservation)),
            Ok(None) => Err(ReservationError::NotFound),
            Err(err) => self.degrade("read", err, || {
                fallback::reservations()
                    .into_iter()
                    .find(|reservation| reservation.id == id)
            }),
        }
    }

    /// Reservations matching `filter`, ordered by start time
    pub async fn list(
        &self,
        filter: ReservationFilter,
    ) -> Result<Served<Vec<Reservation>>, ReservationError> {
        validation::validate_window(filter.from, filter.to)?;

        match self.store.list(&filter).await {
            Ok(reservations) => Ok(Served::fresh(reservations)),
            Err(err) => self.degrade("list", err, || {
                let mut reservations: Vec<Reservation> = fallback::reservations()
                    .into_iter()
                    .filter(|reservation| filter.matches(reservation))
                    .collect();
                sort_by_start(&mut reservations);
                Some(reservations)
            }),
        }
    }

    /// Apply a partial update
    ///
    /// The overlap check runs again only when the room or the interval
    /// changes, and never against the reservation itself. The write only
    /// lands if the reservation is unchanged since it was read; a patch that
    /// leaves it as it is writes nothing.
    pub async fn update(
        &self,
        id: Uuid,
        patch: UpdateReservationRequest,
        caller: Option<Uuid>,
    ) -> Result<Updated, ReservationError> {
        let current = self.load_for_write(id).await?;
        self.authorize(&current, caller)?;

        let Patched {
            mut reservation,
            moved,
        } = validation::apply_patch(&current, patch)?;
        if reservation == current {
            debug!(reservation_id = %id, "Update changes nothing");
            return Ok(Updated {
                reservation: current,
                cancelled: false,
            });
        }

        reservation.updated_at = touched(&current);
        let recheck = moved && reservation.is_active();

        let Some(updated) = self
            .write_over("update", &current, &reservation, recheck)
            .await?
        else {
            return Err(self.lost_write("update", id).await);
        };

        let cancelled = current.is_active() && !updated.is_active();
        info!(reservation_id = %id, recheck, cancelled, "Reservation updated");
        Ok(Updated {
            reservation: updated,
            cancelled,
        })
    }

    /// Cancel a reservation; cancelling twice is not an error
    pub async fn cancel(
        &self,
        id: Uuid,
        caller: Option<Uuid>,
    ) -> Result<Cancellation, ReservationError> {
        let current = self.load_for_write(id).await?;
        self.authorize(&current, caller)?;

        if current.status == ReservationStatus::Cancelled {
            debug!(reservation_id = %id, "Reservation already cancelled");
            return Ok(Cancellation {
                reservation: current,
                changed: false,
            });
        }

        let mut next = current.clone();
        next.status = ReservationStatus::Cancelled;
        next.updated_at = touched(&current);

        match self.write_over("cancel", &current, &next, false).await {
            Ok(Some(cancelled)) => {
                info!(reservation_id = %id, "Reservation cancelled");
                Ok(Cancellation {
                    reservation: cancelled,
                    changed: true,
                })
            }
            Ok(None) | Err(ReservationError::Stale) => {
                // Someone else may have cancelled it first
                match self.store.find(id).await {
                    Ok(Some(latest)) if !latest.is_active() => Ok(Cancellation {
                        reservation: latest,
                        changed: false,
                    }),
                    Ok(None) => Err(ReservationError::NotFound),
                    _ => Err(ReservationError::Stale),
                }
            }
            Err(err) => Err(err),
        }
    }

    pub async fn delete(&self, id: Uuid, caller: Option<Uuid>) -> Result<(), ReservationError> {
        let reservation = self.load_for_write(id).await?;
        self.authorize(&reservation, caller)?;

        let removed = self
            .store
            .delete(id)
            .await
            .map_err(|err| self.write_failed("delete", err))?;
        if !removed {
            return Err(ReservationError::NotFound);
        }

        info!(reservation_id = %id, "Reservation deleted");
        Ok(())
    }

    pub async fn rooms(&self) -> Result<Served<Vec<Room>>, ReservationError> {
        match self.rooms.list_active().await {
            Ok(rooms) => Ok(Served::fresh(rooms)),
            Err(err) => self.degrade("rooms", err, || Some(fallback::rooms())),
        }
    }

    pub async fn room(&self, id: i32) -> Result<Served<Room>, ReservationError> {
        match self.rooms.find(id).await {
            Ok(Some(room)) => Ok(Served::fresh(room)),
            Ok(None) => Err(ReservationError::RoomNotFound(id)),
            Err(err) => self.degrade("room", err, || {
                fallback::rooms().into_iter().find(|room| room.id == id)
            }),
        }
    }

    /// Confirmed reservations of a room within a window
    ///
    /// The window defaults to the next seven days.
    pub async fn room_agenda(
        &self,
        room_id: i32,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Served<Vec<Reservation>>, ReservationError> {
        let from = from.unwrap_or_else(Utc::now);
        let to = to.unwrap_or(from + Duration::days(DEFAULT_AGENDA_DAYS));
        validation::validate_window(Some(from), Some(to))?;

        let room = self.room(room_id).await?;
        let agenda = self
            .list(ReservationFilter {
                room_id: Some(room_id),
                from: Some(from),
                to: Some(to),
                owner_id: None,
                include_cancelled: false,
            })
            .await?;

        Ok(Served {
            value: agenda.value,
            degraded: room.degraded || agenda.degraded,
        })
    }

    /// Active rooms large enough and free for the whole window
    pub async fn available_rooms(
        &self,
        query: AvailabilityQuery,
    ) -> Result<Served<Vec<Room>>, ReservationError> {
        let from = query.from.ok_or(ReservationError::Validation {
            field: "from",
            message: "from is required".to_string(),
        })?;
        let to = query.to.ok_or(ReservationError::Validation {
            field: "to",
            message: "to is required".to_string(),
        })?;
        let slot = validation::validate_slot(from, to)?;
        let min_capacity = query.min_capacity.unwrap_or(1);

        let rooms = self.rooms().await?;
        let busy = match self.store.busy_rooms(&slot).await {
            Ok(busy) => Served::fresh(busy),
            Err(err) => self.degrade("availability", err, || {
                Some(fallback_busy_rooms(&slot))
            })?,
        };

        let available = rooms
            .value
            .into_iter()
            .filter(|room| room.capacity >= min_capacity && !busy.value.contains(&room.id))
            .collect();

        Ok(Served {
            value: available,
            degraded: rooms.degraded || busy.degraded,
        })
    }
}

/// A modification time strictly after the one `current` carries
fn touched(current: &Reservation) -> DateTime<Utc> {
    Utc::now().max(current.updated_at + Duration::microseconds(1))
}

fn fallback_busy_rooms(slot: &TimeSlot) -> Vec<i32> {
    fallback::reservations()
        .iter()
        .filter(|reservation| reservation.is_active() && reservation.slot().overlaps(slot))
        .map(|reservation| reservation.room_id)
        .collect()
}
