//! Wishlist routes. Callers only ever see and modify their own entries.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use chrono::Utc;
use uuid::Uuid;

use super::helpers::{ApiJson, require_owner};
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::{NewWishlistEntry, WishlistEntry};
use crate::state::AppState;
use crate::store::{ListingStore, WishlistStore};

/// Create the wishlist router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/wishlists", get(list_entries).post(add_entry))
        .route("/api/wishlists/{id}", delete(remove_entry))
}

async fn list_entries(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<WishlistEntry>>> {
    Ok(Json(state.store().list_wishlist(user.id).await?))
}

async fn add_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(input): ApiJson<NewWishlistEntry>,
) -> AppResult<(StatusCode, Json<WishlistEntry>)> {
    if state.store().fetch_listing(input.ad).await?.is_none() {
        return Err(AppError::not_found(format_args!("listing {}", input.ad)));
    }

    let entry = WishlistEntry::new(user.id, input.ad, Utc::now());
    if !state.store().add_wishlist_entry(&entry).await? {
        return Err(AppError::Conflict(
            "listing is already in your wishlist".to_string(),
        ));
    }

    Ok((StatusCode::CREATED, Json(entry)))
}

async fn remove_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let entry = state
        .store()
        .find_wishlist_entry(id)
        .await?
        .ok_or_else(|| AppError::not_found("wishlist entry"))?;
    require_owner(entry.user_id, user.id, "wishlist entry")?;

    state.store().remove_wishlist_entry(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
