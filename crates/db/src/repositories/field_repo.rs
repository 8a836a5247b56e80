//! Repository for the `form_fields` table.

use formkit_core::types::DbId;
use sqlx::PgPool;

use crate::models::field::{CreateFormField, FormField};

/// Column list for form_fields queries.
const COLUMNS: &str =
    "id, form_id, taxis, title, description, placeholder, field_type, settings, items, created_at";

pub struct FieldRepo;

impl FieldRepo {
    /// Fields of a form in display order.
    pub async fn list_by_form(pool: &PgPool, form_id: DbId) -> Result<Vec<FormField>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM form_fields WHERE form_id = $1 ORDER BY taxis ASC, id ASC"
        );
        sqlx::query_as::<_, FormField>(&query)
            .bind(form_id)
            .fetch_all(pool)
            .await
    }

    pub async fn create<'e, E>(executor: E, input: &CreateFormField) -> Result<FormField, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO form_fields
                (form_id, taxis, title, description, placeholder, field_type, settings, items)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormField>(&query)
            .bind(input.form_id)
            .bind(input.taxis)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.placeholder)
            .bind(&input.field_type)
            .bind(&input.settings)
            .bind(&input.items)
            .fetch_one(executor)
            .await
    }

    /// Delete every field of a form. Returns the number of rows removed.
    pub async fn delete_by_form<'e, E>(executor: E, form_id: DbId) -> Result<u64, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM form_fields WHERE form_id = $1")
            .bind(form_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
