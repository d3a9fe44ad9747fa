//! API models for domain entities and request/response payloads

pub mod reservation;
pub mod room;

pub use reservation::{
    ANONYMOUS_OWNER, CreateReservationRequest, Reservation, ReservationFilter, ReservationQuery,
    ReservationStatus, TimeSlot, UpdateReservationRequest,
};
pub use room::{AgendaQuery, AvailabilityQuery, Room};
