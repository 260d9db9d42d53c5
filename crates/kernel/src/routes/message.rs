//! Direct message routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::helpers::ApiJson;
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::{Mailbox, Message, NewMessage, User};
use crate::state::AppState;
use crate::store::{MessageStore, UserStore};

/// Create the message router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/messages", get(list_messages).post(send_message))
        .route(
            "/api/messages/{id}",
            get(get_message).patch(mark_message).delete(delete_message),
        )
}

#[derive(Deserialize)]
struct MailboxParams {
    #[serde(rename = "box")]
    mailbox: Option<String>,
}

#[derive(Deserialize)]
struct MessageUpdate {
    read: bool,
}

fn parse_mailbox(raw: Option<&str>) -> AppResult<Mailbox> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Mailbox::default()),
        Some(s) if s.eq_ignore_ascii_case("inbox") => Ok(Mailbox::Inbox),
        Some(s) if s.eq_ignore_ascii_case("sent") => Ok(Mailbox::Sent),
        Some(other) => Err(AppError::BadRequest(format!(
            "invalid value '{other}' for 'box': expected inbox or sent"
        ))),
    }
}

async fn list_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<MailboxParams>,
) -> AppResult<Json<Vec<Message>>> {
    let mailbox = parse_mailbox(params.mailbox.as_deref())?;
    Ok(Json(state.store().list_messages(user.id, mailbox).await?))
}

async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(input): ApiJson<NewMessage>,
) -> AppResult<(StatusCode, Json<Message>)> {
    input.validate(user.id)?;

    if state.store().find_user(input.receiver).await?.is_none() {
        return Err(AppError::not_found(format_args!("user {}", input.receiver)));
    }

    let message = input.into_message(user.id, Utc::now());
    state.store().send_message(&message).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Load a message the caller sent or received.
async fn own_message(state: &AppState, id: Uuid, user: &User) -> AppResult<Message> {
    let message = state
        .store()
        .find_message(id)
        .await?
        .ok_or_else(|| AppError::not_found("message"))?;
    if !message.involves(user.id) {
        return Err(AppError::Forbidden(
            "only the sender or receiver can access a message".to_string(),
        ));
    }
    Ok(message)
}

async fn get_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Message>> {
    Ok(Json(own_message(&state, id, &user).await?))
}

async fn delete_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    own_message(&state, id, &user).await?;
    if !state.store().delete_message(id).await? {
        return Err(AppError::not_found("message"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn mark_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(update): ApiJson<MessageUpdate>,
) -> AppResult<Json<Message>> {
    let message = state
        .store()
        .find_message(id)
        .await?
        .ok_or_else(|| AppError::not_found("message"))?;
    if message.receiver_id != user.id {
        return Err(AppError::Forbidden(
            "only the receiver can mark a message".to_string(),
        ));
    }

    let message = state
        .store()
        .set_message_read(id, update.read)
        .await?
        .ok_or_else(|| AppError::not_found("message"))?;
    Ok(Json(message))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn mailbox_parsing() {
        assert_eq!(parse_mailbox(None).unwrap(), Mailbox::Inbox);
        assert_eq!(parse_mailbox(Some("")).unwrap(), Mailbox::Inbox);
        assert_eq!(parse_mailbox(Some("Sent")).unwrap(), Mailbox::Sent);
        assert!(parse_mailbox(Some("trash")).is_err());
    }
}
