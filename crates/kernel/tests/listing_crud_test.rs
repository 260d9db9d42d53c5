#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for listing create, read, update and delete.

mod common;

use axum::http::{Method, StatusCode};
use oglas_test_utils::{assert, test_listing, test_vehicle, test_vehicle_listing};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn create_requires_authentication() {
    let app = TestApp::new();
    let response = app
        .request(
            Method::POST,
            "/api/ads",
            None,
            Some(test_listing("Sofa").to_json()),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let bad_token = app
        .request(
            Method::POST,
            "/api/ads",
            Some("not-a-token"),
            Some(test_listing("Sofa").to_json()),
        )
        .await;
    assert_eq!(bad_token.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_and_fetch_vehicle_listing() {
    let app = TestApp::new();
    let owner = app.user("seller@example.com").await;

    let payload = test_vehicle_listing("Golf VII", "volkswagen", 2017)
        .with_price("11500.50")
        .in_city("novi_sad")
        .with_image("https://img.example.com/golf.jpg")
        .to_json();
    let created = app.post_as("/api/ads", &owner, payload).await;
    assert_eq!(created.status, StatusCode::CREATED);

    let id = created.body["id"].as_str().unwrap();
    let fetched = app.get(&format!("/api/ads/{id}")).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body, created.body);

    let body = &fetched.body;
    assert_eq!(body["category"], "vehicle");
    assert_eq!(body["price"], "11500.50");
    assert_eq!(body["location"], "novi_sad");
    assert_eq!(body["manufacturer"], "volkswagen");
    assert_eq!(body["year"], 2017);
    assert_eq!(body["fuel_type"], "diesel");
    assert_eq!(body["body_type"], "sedan");
    assert_eq!(body["owner_id"], owner.user.id.to_string());
    assert_eq!(body["image_urls"][0], "https://img.example.com/golf.jpg");
}

#[tokio::test]
async fn general_listing_has_no_vehicle_fields() {
    let app = TestApp::new();
    let owner = app.user("seller@example.com").await;
    let id = app.create_listing(&owner, test_listing("Chair").to_json()).await;

    let body = app.get(&format!("/api/ads/{id}")).await.body;
    assert_eq!(body["category"], "general");
    assert!(body.get("manufacturer").is_none());
}

#[tokio::test]
async fn invalid_payloads_are_rejected() {
    let app = TestApp::new();
    let owner = app.user("seller@example.com").await;

    let cases = [
        test_listing("  ").to_json(),
        test_listing("Car without details").with_category("vehicle").to_json(),
        test_listing("Chair").with_vehicle(test_vehicle("toyota", 1850)).to_json(),
        test_listing("Chair")
            .with_vehicle(test_vehicle("toyota", 2010).with_mileage(-5))
            .to_json(),
        test_listing("Chair").with_image("ftp://example.com/a.jpg").to_json(),
        test_listing("Chair").with_price("-3").to_json(),
        test_listing("Chair").in_city("paris").to_json(),
        json!({ "title": "Missing everything" }),
    ];

    for payload in cases {
        let response = app.post_as("/api/ads", &owner, payload.clone()).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{payload}");
        assert::has_key(&response.body, "error");
    }

    let general_with_vehicle = test_listing("Chair")
        .with_vehicle(test_vehicle("toyota", 2010))
        .with_category("house")
        .to_json();
    let response = app.post_as("/api/ads", &owner, general_with_vehicle).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_listing_is_not_found() {
    let app = TestApp::new();
    let response = app
        .get("/api/ads/0190a4b2-0000-7000-8000-000000000000")
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert::error_contains(&response.body, "not found");

    let malformed = app.get("/api/ads/not-a-uuid").await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn owner_can_patch_listing() {
    let app = TestApp::new();
    let owner = app.user("seller@example.com").await;
    let id = app
        .create_listing(&owner, test_vehicle_listing("Clio", "renault", 2012).to_json())
        .await;
    let before = app.get(&format!("/api/ads/{id}")).await.body;

    let response = app
        .patch_as(
            &format!("/api/ads/{id}"),
            &owner,
            json!({ "price": "4200.00", "vehicle": { "mileage": 180000, "color": "red" } }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["price"], "4200.00");
    assert_eq!(response.body["mileage"], 180000);
    assert_eq!(response.body["color"], "red");
    assert_eq!(response.body["title"], "Clio");
    assert_ne!(response.body["updated_at"], before["updated_at"]);
    assert_eq!(response.body["created_at"], before["created_at"]);

    let fetched = app.get(&format!("/api/ads/{id}")).await.body;
    assert_eq!(fetched, response.body);
}

#[tokio::test]
async fn patch_rejects_vehicle_fields_on_general_listing() {
    let app = TestApp::new();
    let owner = app.user("seller@example.com").await;
    let id = app.create_listing(&owner, test_listing("Desk").to_json()).await;

    let response = app
        .patch_as(&format!("/api/ads/{id}"), &owner, json!({ "vehicle": { "year": 2010 } }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let unknown_field = app
        .patch_as(&format!("/api/ads/{id}"), &owner, json!({ "owner_id": "x" }))
        .await;
    assert_eq!(unknown_field.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_owner_may_modify() {
    let app = TestApp::new();
    let owner = app.user("seller@example.com").await;
    let stranger = app.user("stranger@example.com").await;
    let id = app.create_listing(&owner, test_listing("Desk").to_json()).await;

    let patch = app
        .patch_as(&format!("/api/ads/{id}"), &stranger, json!({ "title": "Mine now" }))
        .await;
    assert_eq!(patch.status, StatusCode::FORBIDDEN);

    let delete = app.delete_as(&format!("/api/ads/{id}"), &stranger).await;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);

    let still_there = app.get(&format!("/api/ads/{id}")).await;
    assert_eq!(still_there.body["title"], "Desk");
}

#[tokio::test]
async fn delete_cascades_to_wishlists() {
    let app = TestApp::new();
    let owner = app.user("seller@example.com").await;
    let fan = app.user("fan@example.com").await;
    let id = app.create_listing(&owner, test_listing("Lamp").to_json()).await;

    let saved = app.post_as("/api/wishlists", &fan, json!({ "ad": id })).await;
    assert_eq!(saved.status, StatusCode::CREATED);

    let deleted = app.delete_as(&format!("/api/ads/{id}"), &owner).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    assert_eq!(app.get(&format!("/api/ads/{id}")).await.status, StatusCode::NOT_FOUND);
    let wishlist = app.get_as("/api/wishlists", &fan).await;
    assert_eq!(wishlist.body, json!([]));

    let again = app.delete_as(&format!("/api/ads/{id}"), &owner).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn choices_list_token_label_pairs() {
    let app = TestApp::new();
    let response = app.get("/api/choices").await;
    assert_eq!(response.status, StatusCode::OK);

    let manufacturers = response.body["manufacturers"].as_array().unwrap();
    assert!(manufacturers.contains(&json!(["toyota", "Toyota"])));
    let categories = response.body["categories"].as_array().unwrap();
    assert!(categories.contains(&json!(["vehicle", "Vehicle"])));
}
