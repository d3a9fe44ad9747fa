//! Room models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Room entity, read-only for the reservation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Room {
    pub id: i32,
    pub name: String,
    pub capacity: i32,
    pub resources: Vec<String>,
    pub location: Option<String>,
    pub active: bool,
}

/// Query parameters for a room agenda
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgendaQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Query parameters for room availability
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub min_capacity: Option<i32>,
}

/// Response for a single room
#[derive(Debug, Serialize)]
pub struct RoomResponse {
    #[serde(flatten)]
    pub room: Room,
    pub degraded: bool,
}

/// Response for room listings
#[derive(Debug, Serialize)]
pub struct RoomListResponse {
    pub items: Vec<Room>,
    pub degraded: bool,
}
