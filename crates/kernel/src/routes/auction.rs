//! Auction and bid routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::helpers::{ApiJson, require_owner};
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::{Auction, Bid, NewAuction, NewBid};
use crate::state::AppState;
use crate::store::{AuctionOutcome, AuctionStore, ListingStore};

/// Create the auction router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auctions", get(list_auctions).post(create_auction))
        .route("/api/auctions/{id}", get(get_auction))
        .route("/api/auctions/{id}/bids", get(list_bids))
        .route("/api/auctions/{id}/close", post(close_auction))
        .route("/api/bids", post(place_bid))
}

fn auction_not_found(id: Uuid) -> AppError {
    AppError::not_found(format_args!("auction {id}"))
}

async fn list_auctions(State(state): State<AppState>) -> AppResult<Json<Vec<Auction>>> {
    Ok(Json(state.store().list_auctions().await?))
}

async fn get_auction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Auction>> {
    let auction = state
        .store()
        .find_auction(id)
        .await?
        .ok_or_else(|| auction_not_found(id))?;
    Ok(Json(auction))
}

async fn create_auction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(input): ApiJson<NewAuction>,
) -> AppResult<(StatusCode, Json<Auction>)> {
    let now = Utc::now();
    input.validate(now)?;

    let listing = state
        .store()
        .fetch_listing(input.ad)
        .await?
        .ok_or_else(|| AppError::not_found(format_args!("listing {}", input.ad)))?;
    require_owner(listing.base.owner_id, user.id, "listing")?;

    let auction = input.into_auction(user.id, now);
    if !state.store().create_auction(&auction).await? {
        return Err(AppError::Conflict(
            "listing already has an auction".to_string(),
        ));
    }

    info!(auction_id = %auction.id, listing_id = %auction.ad_id, "auction created");
    Ok((StatusCode::CREATED, Json(auction)))
}

async fn list_bids(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Bid>>> {
    if state.store().find_auction(id).await?.is_none() {
        return Err(auction_not_found(id));
    }
    Ok(Json(state.store().list_bids(id).await?))
}

async fn place_bid(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(input): ApiJson<NewBid>,
) -> AppResult<(StatusCode, Json<Bid>)> {
    let outcome = state
        .store()
        .place_bid(input.auction, user.id, input.amount, Utc::now())
        .await?;

    match outcome {
        AuctionOutcome::Done(bid) => {
            info!(auction_id = %bid.auction_id, amount = %bid.amount, "bid placed");
            Ok((StatusCode::CREATED, Json(bid)))
        }
        AuctionOutcome::NotFound => Err(auction_not_found(input.auction)),
        AuctionOutcome::Rejected(rejection) => Err(rejection.into()),
    }
}

async fn close_auction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Auction>> {
    match state.store().close_auction(id, user.id, Utc::now()).await? {
        AuctionOutcome::Done(auction) => {
            info!(auction_id = %id, winner = ?auction.winner, "auction closed");
            Ok(Json(auction))
        }
        AuctionOutcome::NotFound => Err(auction_not_found(id)),
        AuctionOutcome::Rejected(rejection) => Err(rejection.into()),
    }
}
