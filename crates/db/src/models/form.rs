//! Form model.

use formkit_core::form::{FormDefinition, NewForm};
use formkit_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `forms` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Form {
    pub id: DbId,
    pub site_id: DbId,
    pub channel_id: DbId,
    pub content_id: DbId,
    pub title: String,
    pub description: String,
    pub taxis: i32,
    pub is_timeout: bool,
    pub time_to_start: Timestamp,
    pub time_to_end: Timestamp,
    pub settings: String,
    pub total_count: i64,
    pub replied_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Form> for FormDefinition {
    fn from(row: Form) -> Self {
        Self {
            id: row.id,
            site_id: row.site_id,
            channel_id: row.channel_id,
            content_id: row.content_id,
            title: row.title,
            description: row.description,
            taxis: row.taxis,
            is_timeout: row.is_timeout,
            time_to_start: row.time_to_start,
            time_to_end: row.time_to_end,
            settings: row.settings,
            total_count: row.total_count,
            replied_count: row.replied_count,
        }
    }
}

/// DTO for patching a form. Taxis and counters are managed separately.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_timeout: Option<bool>,
    pub time_to_start: Option<Timestamp>,
    pub time_to_end: Option<Timestamp>,
    pub settings: Option<String>,
}

/// DTO for creating a form within a site. Omitted bindings mean unbound;
/// an omitted window defaults to now through three months ahead.
#[derive(Debug, Deserialize)]
pub struct CreateForm {
    pub channel_id: Option<DbId>,
    pub content_id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    pub is_timeout: Option<bool>,
    pub time_to_start: Option<Timestamp>,
    pub time_to_end: Option<Timestamp>,
    pub settings: Option<String>,
}

impl CreateForm {
    /// The insert for `site_id`, filling defaults relative to `now`.
    pub fn into_new_form(self, site_id: DbId, now: Timestamp) -> NewForm {
        let defaults = NewForm::for_content(
            site_id,
            self.channel_id.unwrap_or(0),
            self.content_id.unwrap_or(0),
            now,
        );
        NewForm {
            title: self.title,
            description: self.description.unwrap_or_default(),
            is_timeout: self.is_timeout.unwrap_or(defaults.is_timeout),
            time_to_start: self.time_to_start.unwrap_or(defaults.time_to_start),
            time_to_end: self.time_to_end.unwrap_or(defaults.time_to_end),
            settings: self.settings.unwrap_or_default(),
            ..defaults
        }
    }
}
