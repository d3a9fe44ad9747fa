//! Input validation for reservation requests

use chrono::{DateTime, Utc};

use crate::models::{
    CreateReservationRequest, Reservation, ReservationStatus, TimeSlot, UpdateReservationRequest,
};
use crate::service::ReservationError;

const MAX_TITLE_LEN: usize = 200;

/// A create request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub room_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub participants: i32,
    pub slot: TimeSlot,
}

fn invalid(field: &'static str, message: impl Into<String>) -> ReservationError {
    ReservationError::Validation {
        field,
        message: message.into(),
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ReservationError> {
    value.ok_or_else(|| invalid(field, format!("{field} is required")))
}

fn validate_title(title: &str) -> Result<String, ReservationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(invalid("title", "title must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(invalid(
            "title",
            format!("title must be at most {MAX_TITLE_LEN} characters long"),
        ));
    }
    Ok(title.to_string())
}

fn validate_room(room_id: i32) -> Result<i32, ReservationError> {
    if room_id <= 0 {
        return Err(invalid("room_id", "room_id must be a positive integer"));
    }
    Ok(room_id)
}

fn validate_participants(participants: i32) -> Result<i32, ReservationError> {
    if participants < 1 {
        return Err(invalid("participants", "participants must be at least 1"));
    }
    Ok(participants)
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Build a time slot, requiring `start < end`
pub fn validate_slot(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<TimeSlot, ReservationError> {
    TimeSlot::new(start, end)
        .ok_or_else(|| invalid("end_time", "end_time must be after start_time"))
}

/// Validate a create request before any storage access
pub fn validate_create(
    request: CreateReservationRequest,
) -> Result<NewReservation, ReservationError> {
    let title = validate_title(&required(request.title, "title")?)?;
    let start = required(request.start_time, "start_time")?;
    let end = required(request.end_time, "end_time")?;
    let room_id = validate_room(required(request.room_id, "room_id")?)?;
    let participants = validate_participants(request.participants.unwrap_or(1))?;
    let slot = validate_slot(start, end)?;

    Ok(NewReservation {
        room_id,
        title,
        description: normalize_description(request.description),
        participants,
        slot,
    })
}

/// Result of merging a patch into a stored reservation
#[derive(Debug, Clone)]
pub struct Patched {
    pub reservation: Reservation,
    /// Room or interval changed, so the overlap check must run again
    pub moved: bool,
}

/// Merge `patch` into `current` and validate the result
pub fn apply_patch(
    current: &Reservation,
    patch: UpdateReservationRequest,
) -> Result<Patched, ReservationError> {
    if patch.is_empty() {
        return Err(invalid("body", "no fields to update"));
    }

    let mut next = current.clone();

    if let Some(title) = patch.title {
        next.title = validate_title(&title)?;
    }
    if let Some(description) = patch.description {
        next.description = normalize_description(Some(description));
    }
    if let Some(participants) = patch.participants {
        next.participants = validate_participants(participants)?;
    }
    if let Some(room_id) = patch.room_id {
        next.room_id = validate_room(room_id)?;
    }
    if let Some(start) = patch.start_time {
        next.start_time = start;
    }
    if let Some(end) = patch.end_time {
        next.end_time = end;
    }
    validate_slot(next.start_time, next.end_time)?;

    if let Some(status) = patch.status {
        if current.status == ReservationStatus::Cancelled
            && status == ReservationStatus::Confirmed
        {
            return Err(invalid(
                "status",
                "a cancelled reservation cannot be confirmed again; create a new one",
            ));
        }
        next.status = status;
    }

    let moved = next.room_id != current.room_id
        || next.start_time != current.start_time
        || next.end_time != current.end_time;

    Ok(Patched {
        reservation: next,
        moved,
    })
}

/// Validate an optional query window
pub fn validate_window(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<(), ReservationError> {
    if let (Some(from), Some(to)) = (from, to) {
        if from >= to {
            return Err(invalid("to", "to must be after from"));
        }
    }
    Ok(())
}
