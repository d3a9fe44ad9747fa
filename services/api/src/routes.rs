//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::{Caller, resolve_caller},
    models::{
        ANONYMOUS_OWNER, AgendaQuery, AvailabilityQuery, CreateReservationRequest,
        ReservationFilter, ReservationQuery, UpdateReservationRequest,
        reservation::{CreatedReservationResponse, ReservationListResponse, ReservationResponse},
        room::{RoomListResponse, RoomResponse},
    },
    notify::{BookingEvent, dispatch},
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/reservations",
            get(list_reservations).post(create_reservation),
        )
        .route(
            "/reservations/:id",
            get(get_reservation)
                .patch(update_reservation)
                .delete(delete_reservation),
        )
        .route("/reservations/:id/cancel", post(cancel_reservation))
        .route("/rooms", get(list_rooms))
        .route("/rooms/available", get(available_rooms))
        .route("/rooms/:id", get(get_room))
        .route("/rooms/:id/agenda", get(room_agenda))
        .layer(middleware::from_fn_with_state(state.clone(), resolve_caller))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest {
            field: "body",
            message: rejection.body_text(),
        })
}

fn path_param<T>(param: Result<Path<T>, PathRejection>) -> ApiResult<T> {
    param
        .map(|Path(value)| value)
        .map_err(|rejection| ApiError::BadRequest {
            field: "id",
            message: rejection.body_text(),
        })
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| ApiError::BadRequest {
            field: "query",
            message: rejection.body_text(),
        })
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage = if state.service.storage_healthy().await {
        "up"
    } else {
        "down"
    };

    Json(json!({
        "status": "ok",
        "service": "api",
        "backend": state.service.backend(),
        "storage": storage,
    }))
}

/// List reservations
pub async fn list_reservations(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    query: Result<Query<ReservationQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let query = query_params(query)?;
    let filter = ReservationFilter {
        room_id: query.room_id,
        from: query.from,
        to: query.to,
        owner_id: query
            .mine
            .unwrap_or(false)
            .then(|| caller.unwrap_or(ANONYMOUS_OWNER)),
        include_cancelled: query.include_cancelled.unwrap_or(true),
    };

    let served = state.service.list(filter).await?;

    Ok(Json(ReservationListResponse {
        total: served.value.len(),
        items: served.value,
        degraded: served.degraded,
    }))
}

/// Create a reservation
pub async fn create_reservation(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    payload: Result<Json<CreateReservationRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let created = state.service.create(json_body(payload)?, caller).await?;

    dispatch(
        state.notifier.clone(),
        BookingEvent::Created(created.reservation.clone()),
    );

    Ok((
        StatusCode::CREATED,
        Json(CreatedReservationResponse {
            reservation: created.reservation,
            warnings: created.warnings,
        }),
    ))
}

/// Get a reservation by ID
pub async fn get_reservation(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let served = state.service.read(path_param(id)?).await?;

    Ok(Json(ReservationResponse {
        reservation: served.value,
        degraded: served.degraded,
    }))
}

/// Partially update a reservation
pub async fn update_reservation(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateReservationRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = path_param(id)?;
    let updated = state
        .service
        .update(id, json_body(payload)?, caller)
        .await?;

    if updated.cancelled {
        dispatch(
            state.notifier.clone(),
            BookingEvent::Cancelled(updated.reservation.clone()),
        );
    }

    Ok(Json(updated.reservation))
}

/// Cancel a reservation
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let cancellation = state.service.cancel(path_param(id)?, caller).await?;

    if cancellation.changed {
        dispatch(
            state.notifier.clone(),
            BookingEvent::Cancelled(cancellation.reservation.clone()),
        );
    }

    Ok(Json(cancellation.reservation))
}

/// Delete a reservation
pub async fn delete_reservation(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    state.service.delete(path_param(id)?, caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List active rooms
pub async fn list_rooms(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let served = state.service.rooms().await?;

    Ok(Json(RoomListResponse {
        items: served.value,
        degraded: served.degraded,
    }))
}

/// Get a room by ID
pub async fn get_room(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let served = state.service.room(path_param(id)?).await?;

    Ok(Json(RoomResponse {
        room: served.value,
        degraded: served.degraded,
    }))
}

/// Confirmed reservations of a room
pub async fn room_agenda(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    query: Result<Query<AgendaQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = path_param(id)?;
    let query = query_params(query)?;
    let served = state.service.room_agenda(id, query.from, query.to).await?;

    Ok(Json(ReservationListResponse {
        total: served.value.len(),
        items: served.value,
        degraded: served.degraded,
    }))
}

/// Rooms free for a whole interval
pub async fn available_rooms(
    State(state): State<AppState>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let served = state.service.available_rooms(query_params(query)?).await?;

    Ok(Json(RoomListResponse {
        items: served.value,
        degraded: served.degraded,
    }))
}
