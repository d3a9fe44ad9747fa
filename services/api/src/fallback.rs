//! Fixed dataset served by reads while storage is unreachable
//!
//! Every fallback reservation belongs to [`ANONYMOUS_OWNER`] and is labelled
//! in its description. Responses built from this data carry
//! `"degraded": true`.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::models::{ANONYMOUS_OWNER, Reservation, ReservationStatus, Room};

pub const FALLBACK_LABEL: &str = "Demonstration data: storage is currently unavailable";

/// The standard room catalogue
///
/// Matches the rows seeded by the rooms migration; the memory backend starts
/// from it as well.
pub fn rooms() -> Vec<Room> {
    let room = |id: i32, name: &str, capacity: i32, resources: &[&str], location: &str| Room {
        id,
        name: name.to_string(),
        capacity,
        resources: resources.iter().map(|r| r.to_string()).collect(),
        location: Some(location.to_string()),
        active: true,
    };

    vec![
        room(
            1,
            "Sala de Reunião A",
            12,
            &["Projetor", "TV", "Lousa", "Mesa de reunião"],
            "Andar 1",
        ),
        room(2, "Sala de Reunião B", 8, &["TV", "Lousa", "Mesa redonda"], "Andar 2"),
        room(
            3,
            "Auditório",
            50,
            &["Projetor", "Sistema de som", "Microfone", "Palco"],
            "Térreo",
        ),
        room(
            4,
            "Sala de Videoconferência",
            6,
            &["Sistema de videoconferência", "TV 4K", "Microfone"],
            "Andar 3",
        ),
        room(
            5,
            "Lab de Informática",
            20,
            &["Computadores", "Projetor", "Lousa digital"],
            "Andar 2",
        ),
    ]
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, day, hour, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Sample reservations with stable ids
pub fn reservations() -> Vec<Reservation> {
    let reservation = |n: u128, room_id: i32, title: &str, day: u32, start: u32, end: u32| {
        Reservation {
            id: Uuid::from_u128(0x5a1a_fac1_0000_0000_0000_0000_0000_0000 | n),
            room_id,
            title: title.to_string(),
            description: Some(FALLBACK_LABEL.to_string()),
            participants: 1,
            start_time: at(day, start),
            end_time: at(day, end),
            owner_id: ANONYMOUS_OWNER,
            status: ReservationStatus::Confirmed,
            created_at: at(1, 8),
            updated_at: at(1, 8),
        }
    };

    vec![
        reservation(1, 1, "Planejamento semanal", 6, 9, 10),
        reservation(2, 2, "Entrevista de candidato", 6, 14, 15),
        reservation(3, 3, "Apresentação trimestral", 7, 10, 12),
        reservation(4, 4, "Call com fornecedor", 8, 16, 17),
        reservation(5, 5, "Treinamento interno", 9, 13, 17),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_reservations_reference_catalogue_rooms() {
        let rooms = rooms();
        for reservation in reservations() {
            assert!(rooms.iter().any(|room| room.id == reservation.room_id));
            assert!(reservation.start_time < reservation.end_time);
            assert_eq!(reservation.description.as_deref(), Some(FALLBACK_LABEL));
        }
    }
}
