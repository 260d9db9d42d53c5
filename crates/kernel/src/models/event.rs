//! Community events hosted by users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::listing::{ValidationError, validate_description, validate_title};

const MAX_LOCATION_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    /// Free-text venue.
    pub location: String,
    #[serde(rename = "host")]
    pub host_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
}

/// Partial update of an event. The host is immutable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

fn validate_location(location: &str) -> Result<(), ValidationError> {
    let location = location.trim();
    if location.is_empty() {
        return Err(ValidationError::new("location", "must not be empty"));
    }
    if location.chars().count() > MAX_LOCATION_LEN {
        return Err(ValidationError::new(
            "location",
            format!("must be at most {MAX_LOCATION_LEN} characters"),
        ));
    }
    Ok(())
}

impl NewEvent {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_description(&self.description)?;
        validate_location(&self.location)
    }

    pub fn into_event(self, host_id: Uuid) -> Event {
        Event {
            id: Uuid::now_v7(),
            title: self.title.trim().to_string(),
            description: self.description,
            date: self.date,
            location: self.location.trim().to_string(),
            host_id,
        }
    }
}

impl EventUpdate {
    pub fn apply(self, event: &Event) -> Result<Event, ValidationError> {
        let mut updated = event.clone();
        if let Some(title) = self.title {
            validate_title(&title)?;
            updated.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            validate_description(&description)?;
            updated.description = description;
        }
        if let Some(date) = self.date {
            updated.date = date;
        }
        if let Some(location) = self.location {
            validate_location(&location)?;
            updated.location = location.trim().to_string();
        }
        Ok(updated)
    }
}
