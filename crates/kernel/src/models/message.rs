//! Direct messages between users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::listing::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: Uuid,
    #[serde(rename = "sender")]
    pub sender_id: Uuid,
    #[serde(rename = "receiver")]
    pub receiver_id: Uuid,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    #[serde(alias = "receiver_id")]
    pub receiver: Uuid,
    pub content: String,
}

/// Which side of the conversation to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mailbox {
    #[default]
    Inbox,
    Sent,
}

impl NewMessage {
    pub fn validate(&self, sender_id: Uuid) -> Result<(), ValidationError> {
        if self.content.trim().is_empty() {
            return Err(ValidationError::new("content", "must not be empty"));
        }
        if self.receiver == sender_id {
            return Err(ValidationError::new("receiver", "cannot message yourself"));
        }
        Ok(())
    }

    pub fn into_message(self, sender_id: Uuid, now: DateTime<Utc>) -> Message {
        Message {
            id: Uuid::now_v7(),
            sender_id,
            receiver_id: self.receiver,
            content: self.content,
            timestamp: now,
            read: false,
        }
    }
}

impl Message {
    /// Whether the message belongs in `user_id`'s view of `mailbox`.
    pub fn in_mailbox(&self, user_id: Uuid, mailbox: Mailbox) -> bool {
        match mailbox {
            Mailbox::Inbox => self.receiver_id == user_id,
            Mailbox::Sent => self.sender_id == user_id,
        }
    }

    /// Whether `user_id` sent or received the message.
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }
}
