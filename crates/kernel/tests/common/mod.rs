#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Every test builds its own [`TestApp`] over a fresh in-memory store, so
//! tests are isolated and need no database. Requests go through the real
//! router, middleware included.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use oglas_kernel::models::{NewUser, User};
use oglas_kernel::store::{MemoryStore, UserStore};
use oglas_kernel::{AppState, Config, routes};

/// Test application wrapper using the real kernel routes and state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

/// A registered user together with a bearer token.
pub struct TestUser {
    pub user: User,
    pub token: String,
}

/// Status and decoded JSON body of a response.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    /// Build around a pre-seeded store.
    pub fn with_store(store: MemoryStore) -> Self {
        let site_url = Url::parse("http://localhost:3000").expect("valid site url");
        let config = Config::with_site_url(site_url);
        let state = AppState::with_store(store, &config);
        let router = routes::app(state.clone(), &config);
        Self { router, state }
    }

    /// Register a user and issue a token for them.
    pub async fn user(&self, email: &str) -> TestUser {
        let input = NewUser {
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            ..Default::default()
        };
        let user = self
            .state
            .store()
            .create_user(input)
            .await
            .expect("create user")
            .expect("email is unique");
        let token = self
            .state
            .store()
            .issue_token(user.id)
            .await
            .expect("issue token");
        TestUser { user, token }
    }

    /// Send a request with an optional bearer token and JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn get_as(&self, uri: &str, user: &TestUser) -> TestResponse {
        self.request(Method::GET, uri, Some(&user.token), None).await
    }

    pub async fn post_as(&self, uri: &str, user: &TestUser, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(&user.token), Some(body))
            .await
    }

    pub async fn patch_as(&self, uri: &str, user: &TestUser, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, Some(&user.token), Some(body))
            .await
    }

    pub async fn delete_as(&self, uri: &str, user: &TestUser) -> TestResponse {
        self.request(Method::DELETE, uri, Some(&user.token), None)
            .await
    }

    /// Create a listing through the API and return its id.
    pub async fn create_listing(&self, owner: &TestUser, payload: Value) -> String {
        let response = self.post_as("/api/ads", owner, payload).await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "listing creation failed: {}",
            response.body
        );
        response.body["id"].as_str().unwrap().to_string()
    }
}

/// Ids of the listings in a page response, in order.
pub fn result_ids(body: &Value) -> Vec<String> {
    body["results"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
