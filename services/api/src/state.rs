//! Application state shared across handlers

use std::sync::Arc;

use crate::{middleware::Identity, notify::Notifier, service::ReservationService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: ReservationService,
    pub identity: Identity,
    pub notifier: Arc<dyn Notifier>,
}
