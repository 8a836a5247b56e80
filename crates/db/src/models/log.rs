//! Submission log model.

use formkit_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `form_logs` table: one submission of a form.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FormLog {
    pub id: DbId,
    pub form_id: DbId,
    pub payload: String,
    pub is_replied: bool,
    pub reply: Option<String>,
    pub created_at: Timestamp,
    pub replied_at: Option<Timestamp>,
}

/// DTO for recording a submission.
#[derive(Debug, Deserialize)]
pub struct CreateFormLog {
    pub form_id: DbId,
    pub payload: String,
}
