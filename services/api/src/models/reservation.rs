//! Reservation models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Owner recorded when a reservation is made without an authenticated caller
pub const ANONYMOUS_OWNER: Uuid = Uuid::nil();

/// Reservation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            other => Err(format!("unknown reservation status: {other}")),
        }
    }
}

/// Half-open time interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSlot {
    /// Returns `None` unless `start < end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Abutting slots do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Reservation entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub room_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub participants: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub owner_id: Uuid,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn slot(&self) -> TimeSlot {
        TimeSlot {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Confirmed
    }

    /// Whether this reservation prevents booking `slot` in `room_id`
    ///
    /// `exclude` skips the reservation being rescheduled.
    pub fn blocks(&self, room_id: i32, slot: &TimeSlot, exclude: Option<Uuid>) -> bool {
        self.is_active()
            && self.room_id == room_id
            && exclude != Some(self.id)
            && self.slot().overlaps(slot)
    }
}

/// Request for reservation creation
///
/// Every field is optional at the wire level so missing fields are reported
/// by name instead of as a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateReservationRequest {
    pub room_id: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub participants: Option<i32>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Partial update payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReservationRequest {
    pub room_id: Option<i32>,
    pub title: Option<String>,
    /// An empty string clears the description
    pub description: Option<String>,
    pub participants: Option<i32>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: Option<ReservationStatus>,
}

impl UpdateReservationRequest {
    pub fn is_empty(&self) -> bool {
        self.room_id.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.participants.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.status.is_none()
    }
}

/// Query parameters for reservation listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationQuery {
    /// Filter by room
    pub room_id: Option<i32>,
    /// Only reservations starting at or after this instant
    pub from: Option<DateTime<Utc>>,
    /// Only reservations ending at or before this instant
    pub to: Option<DateTime<Utc>>,
    /// Only the caller's own reservations
    pub mine: Option<bool>,
    /// Include cancelled reservations (default: true)
    pub include_cancelled: Option<bool>,
}

/// Storage-level reservation filter
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationFilter {
    pub room_id: Option<i32>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub owner_id: Option<Uuid>,
    pub include_cancelled: bool,
}

impl Default for ReservationFilter {
    fn default() -> Self {
        Self {
            room_id: None,
            from: None,
            to: None,
            owner_id: None,
            include_cancelled: true,
        }
    }
}

impl ReservationFilter {
    pub fn matches(&self, reservation: &Reservation) -> bool {
        self.room_id.is_none_or(|room| reservation.room_id == room)
            && self.from.is_none_or(|from| reservation.start_time >= from)
            && self.to.is_none_or(|to| reservation.end_time <= to)
            && self.owner_id.is_none_or(|owner| reservation.owner_id == owner)
            && (self.include_cancelled || reservation.is_active())
    }
}

/// Calendar order: start time, then creation time
pub fn sort_by_start(reservations: &mut [Reservation]) {
    reservations.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then(a.created_at.cmp(&b.created_at))
    });
}

/// Response for a single reservation
#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub degraded: bool,
}

/// Response for reservation creation
#[derive(Debug, Serialize)]
pub struct CreatedReservationResponse {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub warnings: Vec<String>,
}

/// Response for reservation listing
#[derive(Debug, Serialize)]
pub struct ReservationListResponse {
    pub items: Vec<Reservation>,
    pub total: usize,
    pub degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, hour, minute, 0).unwrap()
    }

    fn slot(start: (u32, u32), end: (u32, u32)) -> TimeSlot {
        TimeSlot::new(at(start.0, start.1), at(end.0, end.1)).unwrap()
    }

    #[test]
    fn test_slot_requires_start_before_end() {
        assert!(TimeSlot::new(at(15, 0), at(14, 0)).is_none());
        assert!(TimeSlot::new(at(14, 0), at(14, 0)).is_none());
    }

    #[test]
    fn test_overlap_is_half_open() {
        let booked = slot((14, 0), (15, 0));

        assert!(booked.overlaps(&slot((14, 30), (15, 30))));
        assert!(booked.overlaps(&slot((13, 0), (14, 1))));
        assert!(booked.overlaps(&slot((13, 0), (16, 0))));
        assert!(booked.overlaps(&slot((14, 15), (14, 45))));
        assert!(!booked.overlaps(&slot((15, 0), (16, 0))));
        assert!(!booked.overlaps(&slot((13, 0), (14, 0))));
    }

    #[test]
    fn test_cancelled_reservation_does_not_block() {
        let mut reservation = Reservation {
            id: Uuid::new_v4(),
            room_id: 1,
            title: "Sync".to_string(),
            description: None,
            participants: 1,
            start_time: at(14, 0),
            end_time: at(15, 0),
            owner_id: ANONYMOUS_OWNER,
            status: ReservationStatus::Confirmed,
            created_at: at(9, 0),
            updated_at: at(9, 0),
        };
        let requested = slot((14, 0), (15, 0));

        assert!(reservation.blocks(1, &requested, None));
        assert!(!reservation.blocks(2, &requested, None));
        assert!(!reservation.blocks(1, &requested, Some(reservation.id)));

        reservation.status = ReservationStatus::Cancelled;
        assert!(!reservation.blocks(1, &requested, None));
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&ReservationStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(
            "confirmed".parse::<ReservationStatus>().unwrap(),
            ReservationStatus::Confirmed
        );
        assert!("agendada".parse::<ReservationStatus>().is_err());
    }
}
