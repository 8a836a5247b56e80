//! Form field model.

use formkit_core::form::DefaultField;
use formkit_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `form_fields` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FormField {
    pub id: DbId,
    pub form_id: DbId,
    pub taxis: i32,
    pub title: String,
    pub description: String,
    pub placeholder: String,
    pub field_type: String,
    pub settings: String,
    pub items: Vec<String>,
    pub created_at: Timestamp,
}

/// DTO for creating a form field.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFormField {
    pub form_id: DbId,
    pub taxis: i32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub placeholder: String,
    pub field_type: String,
    #[serde(default)]
    pub settings: String,
    #[serde(default)]
    pub items: Vec<String>,
}

impl CreateFormField {
    /// A seeded default field at position `taxis`.
    pub fn from_default(form_id: DbId, taxis: i32, field: &DefaultField) -> Self {
        Self {
            form_id,
            taxis,
            title: field.title.to_string(),
            description: String::new(),
            placeholder: field.placeholder.to_string(),
            field_type: field.field_type.to_string(),
            settings: field.settings_json(),
            items: field.items.iter().map(|s| s.to_string()).collect(),
        }
    }
}
