//! Listing routes: search, CRUD, the caller's own listings and choice sets.

use std::collections::HashMap;

use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::helpers::{ApiJson, request_url, require_owner};
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::{ChoiceSets, Listing, ListingUpdate, NewListing};
use crate::query::{ListingQuery, PageResponse};
use crate::state::AppState;
use crate::store::ListingStore;

/// Create the listing router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/ads", get(search_listings).post(create_listing))
        .route(
            "/api/ads/{id}",
            get(get_listing).patch(update_listing).delete(delete_listing),
        )
        .route("/api/my-ads", get(my_listings))
        .route("/api/choices", get(choices))
}

async fn search_listings(
    State(state): State<AppState>,
    uri: OriginalUri,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<PageResponse<Listing>>> {
    let query = ListingQuery::from_params(&params, state.pager())?;
    run_search(&state, &uri, &query).await
}

async fn my_listings(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    uri: OriginalUri,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<PageResponse<Listing>>> {
    let query = ListingQuery::from_params(&params, state.pager())?.owned_by(user.id);
    run_search(&state, &uri, &query).await
}

async fn run_search(
    state: &AppState,
    uri: &OriginalUri,
    query: &ListingQuery,
) -> AppResult<Json<PageResponse<Listing>>> {
    let url = request_url(state, uri)?;
    let page = state.listings().search(query).await?;
    Ok(Json(page.into_response(&url)))
}

async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Listing>> {
    Ok(Json(state.listings().get(id).await?))
}

async fn create_listing(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(input): ApiJson<NewListing>,
) -> AppResult<(StatusCode, Json<Listing>)> {
    let now = Utc::now();
    input.validate(now)?;

    let record = input.into_record(Uuid::now_v7(), user.id, now);
    let listing = Listing::from_record(record).map_err(|e| AppError::Internal(e.into()))?;
    state.store().insert_listing(&listing).await?;

    info!(listing_id = %listing.id(), category = %listing.category(), owner = %user.id, "listing created");
    Ok((StatusCode::CREATED, Json(listing)))
}

async fn update_listing(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(update): ApiJson<ListingUpdate>,
) -> AppResult<Json<Listing>> {
    let existing = state.listings().get(id).await?;
    require_owner(existing.base.owner_id, user.id, "listing")?;

    let updated = update.apply(&existing, Utc::now())?;
    if !state.store().update_listing(&updated).await? {
        return Err(AppError::not_found(format_args!("listing {id}")));
    }

    Ok(Json(updated))
}

async fn delete_listing(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let record = state
        .store()
        .fetch_listing(id)
        .await?
        .ok_or_else(|| AppError::not_found(format_args!("listing {id}")))?;
    require_owner(record.base.owner_id, user.id, "listing")?;

    if !state.store().delete_listing(id).await? {
        return Err(AppError::not_found(format_args!("listing {id}")));
    }

    info!(listing_id = %id, "listing deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn choices() -> Json<ChoiceSets> {
    Json(ChoiceSets::collect())
}
