//! Current-user routes.

use axum::routing::get;
use axum::{Json, Router};

use crate::auth::AuthUser;
use crate::models::User;
use crate::state::AppState;

/// Create the user router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/user-info", get(user_info))
}

async fn user_info(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}
