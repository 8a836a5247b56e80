//! Repository for the `form_logs` table.

use formkit_core::types::DbId;
use sqlx::PgPool;

use crate::models::log::{CreateFormLog, FormLog};

/// Column list for form_logs queries.
const COLUMNS: &str = "id, form_id, payload, is_replied, reply, created_at, replied_at";

pub struct LogRepo;

impl LogRepo {
    /// Record a submission, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateFormLog) -> Result<FormLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO form_logs (form_id, payload) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormLog>(&query)
            .bind(input.form_id)
            .bind(&input.payload)
            .fetch_one(pool)
            .await
    }

    /// Store a reply to a submission, returning the updated row.
    pub async fn reply(pool: &PgPool, id: DbId, reply: &str) -> Result<Option<FormLog>, sqlx::Error> {
        let query = format!(
            "UPDATE form_logs SET is_replied = true, reply = $2, replied_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormLog>(&query)
            .bind(id)
            .bind(reply)
            .fetch_optional(pool)
            .await
    }

    /// Number of submissions of a form.
    pub async fn count_by_form(pool: &PgPool, form_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM form_logs WHERE form_id = $1")
            .bind(form_id)
            .fetch_one(pool)
            .await
    }

    /// Number of replied submissions of a form.
    pub async fn count_replied(pool: &PgPool, form_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM form_logs WHERE form_id = $1 AND is_replied")
            .bind(form_id)
            .fetch_one(pool)
            .await
    }

    /// Delete every submission of a form. Returns the number of rows removed.
    pub async fn delete_by_form<'e, E>(executor: E, form_id: DbId) -> Result<u64, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM form_logs WHERE form_id = $1")
            .bind(form_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
