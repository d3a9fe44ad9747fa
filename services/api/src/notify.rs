//! Booking notifications
//!
//! Owners are notified when one of their reservations is created or
//! cancelled. Delivery runs off the request path and its failures are only
//! logged.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::Reservation;

/// Something that happened to a reservation
#[derive(Debug, Clone)]
pub enum BookingEvent {
    Created(Reservation),
    Cancelled(Reservation),
}

impl BookingEvent {
    pub fn reservation(&self) -> &Reservation {
        match self {
            BookingEvent::Created(r) | BookingEvent::Cancelled(r) => r,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BookingEvent::Created(_) => "reservation_created",
            BookingEvent::Cancelled(_) => "reservation_cancelled",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            BookingEvent::Created(_) => "Reservation confirmed",
            BookingEvent::Cancelled(_) => "Reservation cancelled",
        }
    }

    pub fn message(&self) -> String {
        let r = self.reservation();
        let when = format!(
            "{} to {}",
            r.start_time.format("%Y-%m-%d %H:%M"),
            r.end_time.format("%H:%M")
        );
        match self {
            BookingEvent::Created(_) => {
                format!("\"{}\" is booked in room {} from {when}", r.title, r.room_id)
            }
            BookingEvent::Cancelled(_) => {
                format!("\"{}\" in room {} from {when} was cancelled", r.title, r.room_id)
            }
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &BookingEvent) -> anyhow::Result<()>;
}

/// Stores notifications in the `notifications` table
#[derive(Clone)]
pub struct PgNotifier {
    pool: PgPool,
}

impl PgNotifier {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Notifier for PgNotifier {
    async fn notify(&self, event: &BookingEvent) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, recipient_id, title, message, kind, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.reservation().owner_id)
        .bind(event.title())
        .bind(event.message())
        .bind(event.kind())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Writes notifications to the log only
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &BookingEvent) -> anyhow::Result<()> {
        let reservation = event.reservation();
        info!(
            kind = event.kind(),
            reservation_id = %reservation.id,
            recipient_id = %reservation.owner_id,
            "{}",
            event.message()
        );
        Ok(())
    }
}

/// Deliver `event` in the background
pub fn dispatch(notifier: Arc<dyn Notifier>, event: BookingEvent) {
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&event).await {
            warn!(
                kind = event.kind(),
                reservation_id = %event.reservation().id,
                "Failed to deliver notification: {}",
                e
            );
        }
    });
}
