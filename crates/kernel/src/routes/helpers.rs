//! Shared route helpers.

use axum::Json;
use axum::extract::{FromRequest, OriginalUri, Request};
use axum::extract::rejection::JsonRejection;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// JSON body extractor whose rejections use the API error format.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

/// Absolute URL of the current request, resolved against the site URL.
pub fn request_url(state: &AppState, uri: &OriginalUri) -> AppResult<Url> {
    let path_and_query = uri
        .0
        .path_and_query()
        .map_or_else(|| uri.0.path().to_string(), |pq| pq.as_str().to_string());

    state
        .site_url()
        .join(&path_and_query)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("cannot build request URL: {e}")))
}

/// Require that `caller` owns a resource.
pub fn require_owner(owner: uuid::Uuid, caller: uuid::Uuid, what: &str) -> AppResult<()> {
    if owner == caller {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("you do not own this {what}")))
    }
}
