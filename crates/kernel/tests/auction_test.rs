#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for auctions and bidding.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use oglas_kernel::models::{Auction, Money};
use oglas_kernel::store::{AuctionOutcome, AuctionStore};
use oglas_test_utils::{assert, auction_payload, test_listing};
use serde_json::json;
use uuid::Uuid;

use common::{TestApp, TestUser};

async fn open_auction(app: &TestApp, seller: &TestUser) -> (String, String) {
    let ad = app.create_listing(seller, test_listing("Painting").to_json()).await;
    let response = app
        .post_as(
            "/api/auctions",
            seller,
            auction_payload(&ad, "100.00", Duration::days(3)),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    (ad, response.body["id"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn create_auction_for_own_listing() {
    let app = TestApp::new();
    let seller = app.user("seller@example.com").await;
    let (ad, id) = open_auction(&app, &seller).await;

    let fetched = app.get(&format!("/api/auctions/{id}")).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["ad"], ad);
    assert_eq!(fetched.body["starting_price"], "100.00");
    assert_eq!(fetched.body["current_price"], "0.00");
    assert!(fetched.body["winner"].is_null());

    let all = app.get("/api/auctions").await;
    assert_eq!(all.body.as_array().unwrap().len(), 1);

    let second = app
        .post_as(
            "/api/auctions",
            &seller,
            auction_payload(&ad, "50.00", Duration::days(1)),
        )
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn auction_creation_checks() {
    let app = TestApp::new();
    let seller = app.user("seller@example.com").await;
    let stranger = app.user("stranger@example.com").await;
    let ad = app.create_listing(&seller, test_listing("Vase").to_json()).await;

    let not_owner = app
        .post_as(
            "/api/auctions",
            &stranger,
            auction_payload(&ad, "10.00", Duration::days(1)),
        )
        .await;
    assert_eq!(not_owner.status, StatusCode::FORBIDDEN);

    let in_past = app
        .post_as(
            "/api/auctions",
            &seller,
            auction_payload(&ad, "10.00", -Duration::hours(1)),
        )
        .await;
    assert_eq!(in_past.status, StatusCode::BAD_REQUEST);

    let no_listing = app
        .post_as(
            "/api/auctions",
            &seller,
            auction_payload(&Uuid::now_v7().to_string(), "10.00", Duration::days(1)),
        )
        .await;
    assert_eq!(no_listing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bids_raise_the_current_price() {
    let app = TestApp::new();
    let seller = app.user("seller@example.com").await;
    let ana = app.user("ana@example.com").await;
    let marko = app.user("marko@example.com").await;
    let (_, id) = open_auction(&app, &seller).await;

    let below_start = app
        .post_as("/api/bids", &ana, json!({ "auction": id, "amount": "99.99" }))
        .await;
    assert_eq!(below_start.status, StatusCode::CONFLICT);
    assert::error_contains(&below_start.body, "starting price");

    let first = app
        .post_as("/api/bids", &ana, json!({ "auction": id, "amount": "100.00" }))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["is_highest"], true);

    let equal = app
        .post_as("/api/bids", &marko, json!({ "auction": id, "amount": "100.00" }))
        .await;
    assert_eq!(equal.status, StatusCode::CONFLICT);

    let higher = app
        .post_as("/api/bids", &marko, json!({ "auction": id, "amount": 150 }))
        .await;
    assert_eq!(higher.status, StatusCode::CREATED);

    let auction = app.get(&format!("/api/auctions/{id}")).await.body;
    assert_eq!(auction["current_price"], "150.00");

    let bids = app.get(&format!("/api/auctions/{id}/bids")).await.body;
    let bids = bids.as_array().unwrap();
    assert_eq!(bids.len(), 2);
    assert_eq!(bids[0]["amount"], "150.00");
    assert_eq!(bids[0]["bidder"], marko.user.id.to_string());
    let highest: Vec<_> = bids.iter().filter(|b| b["is_highest"] == true).collect();
    assert_eq!(highest.len(), 1);

    let own = app
        .post_as("/api/bids", &seller, json!({ "auction": id, "amount": "500.00" }))
        .await;
    assert_eq!(own.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn close_only_after_end_time() {
    let app = TestApp::new();
    let seller = app.user("seller@example.com").await;
    let stranger = app.user("stranger@example.com").await;
    let (_, id) = open_auction(&app, &seller).await;

    let early = app
        .post_as(&format!("/api/auctions/{id}/close"), &seller, json!({}))
        .await;
    assert_eq!(early.status, StatusCode::CONFLICT);

    let not_seller = app
        .post_as(&format!("/api/auctions/{id}/close"), &stranger, json!({}))
        .await;
    assert_eq!(not_seller.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn closing_an_ended_auction_picks_the_winner() {
    let app = TestApp::new();
    let seller = app.user("seller@example.com").await;
    let ana = app.user("ana@example.com").await;
    let marko = app.user("marko@example.com").await;
    let ad = app.create_listing(&seller, test_listing("Clock").to_json()).await;

    let started = Utc::now() - Duration::days(2);
    let auction = Auction {
        id: Uuid::now_v7(),
        ad_id: Uuid::parse_str(&ad).unwrap(),
        seller_id: seller.user.id,
        starting_price: Money::from_major(20).unwrap(),
        current_price: Money::default(),
        end_time: Utc::now() - Duration::hours(1),
        winner: None,
        closed_at: None,
        created: started,
    };
    let store = app.state.store();
    assert!(store.create_auction(&auction).await.unwrap());

    let bid_time = started + Duration::hours(1);
    for (bidder, amount) in [(&ana, 25), (&marko, 40)] {
        let outcome = store
            .place_bid(auction.id, bidder.user.id, Money::from_major(amount).unwrap(), bid_time)
            .await
            .unwrap();
        assert!(matches!(outcome, AuctionOutcome::Done(_)));
    }

    let late_bid = app
        .post_as("/api/bids", &ana, json!({ "auction": auction.id, "amount": "100.00" }))
        .await;
    assert_eq!(late_bid.status, StatusCode::CONFLICT);

    let closed = app
        .post_as(&format!("/api/auctions/{}/close", auction.id), &seller, json!({}))
        .await;
    assert_eq!(closed.status, StatusCode::OK);
    assert_eq!(closed.body["winner"], marko.user.id.to_string());
    assert!(!closed.body["closed_at"].is_null());

    let twice = app
        .post_as(&format!("/api/auctions/{}/close", auction.id), &seller, json!({}))
        .await;
    assert_eq!(twice.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_auction_is_not_found() {
    let app = TestApp::new();
    let ana = app.user("ana@example.com").await;
    let id = Uuid::now_v7();

    assert_eq!(app.get(&format!("/api/auctions/{id}")).await.status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.get(&format!("/api/auctions/{id}/bids")).await.status,
        StatusCode::NOT_FOUND
    );
    let bid = app
        .post_as("/api/bids", &ana, json!({ "auction": id, "amount": "1.00" }))
        .await;
    assert_eq!(bid.status, StatusCode::NOT_FOUND);
}
