//! Community event routes. Anyone may read; only the host may change an
//! event.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;
use uuid::Uuid;

use super::helpers::{ApiJson, require_owner};
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::{Event, EventUpdate, NewEvent};
use crate::state::AppState;
use crate::store::EventStore;

/// Create the event router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/events", get(list_events).post(create_event))
        .route(
            "/api/events/{id}",
            get(get_event).patch(update_event).delete(delete_event),
        )
}

async fn find(state: &AppState, id: Uuid) -> AppResult<Event> {
    state
        .store()
        .find_event(id)
        .await?
        .ok_or_else(|| AppError::not_found(format_args!("event {id}")))
}

async fn list_events(State(state): State<AppState>) -> AppResult<Json<Vec<Event>>> {
    Ok(Json(state.store().list_events().await?))
}

async fn get_event(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<Event>> {
    Ok(Json(find(&state, id).await?))
}

async fn create_event(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(input): ApiJson<NewEvent>,
) -> AppResult<(StatusCode, Json<Event>)> {
    input.validate()?;
    let event = input.into_event(user.id);
    state.store().create_event(&event).await?;

    info!(event_id = %event.id, host = %user.id, "event created");
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_event(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(update): ApiJson<EventUpdate>,
) -> AppResult<Json<Event>> {
    let existing = find(&state, id).await?;
    require_owner(existing.host_id, user.id, "event")?;

    let updated = update.apply(&existing)?;
    if !state.store().update_event(&updated).await? {
        return Err(AppError::not_found(format_args!("event {id}")));
    }
    Ok(Json(updated))
}

async fn delete_event(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let existing = find(&state, id).await?;
    require_owner(existing.host_id, user.id, "event")?;

    if !state.store().delete_event(id).await? {
        return Err(AppError::not_found(format_args!("event {id}")));
    }
    info!(event_id = %id, "event deleted");
    Ok(StatusCode::NO_CONTENT)
}
