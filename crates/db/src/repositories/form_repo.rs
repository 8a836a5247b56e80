//! Repository for the `forms` table.

use formkit_core::form::{default_fields, next_taxis, NewForm};
use formkit_core::ordering::{Direction, TaxisSlot};
use formkit_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::field::CreateFormField;
use crate::models::form::{Form, UpdateForm};
use crate::repositories::{FieldRepo, LogRepo};

/// Column list for forms queries.
const COLUMNS: &str = "id, site_id, channel_id, content_id, title, description, taxis, \
    is_timeout, time_to_start, time_to_end, settings, total_count, replied_count, \
    created_at, updated_at";

/// Provides CRUD, lookup and ordering operations for forms.
pub struct FormRepo;

impl FormRepo {
    /// All forms of a site, highest taxis first.
    pub async fn list_by_site(pool: &PgPool, site_id: DbId) -> Result<Vec<Form>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM forms WHERE site_id = $1 ORDER BY taxis DESC, id ASC"
        );
        sqlx::query_as::<_, Form>(&query)
            .bind(site_id)
            .fetch_all(pool)
            .await
    }

    /// Forms of a site bound to neither a channel nor a content item,
    /// highest taxis first.
    pub async fn list_unbound(pool: &PgPool, site_id: DbId) -> Result<Vec<Form>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM forms
             WHERE site_id = $1 AND channel_id = 0 AND content_id = 0
             ORDER BY taxis DESC, id ASC"
        );
        sqlx::query_as::<_, Form>(&query)
            .bind(site_id)
            .fetch_all(pool)
            .await
    }

    /// Find a form of a site by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        site_id: DbId,
        id: DbId,
    ) -> Result<Option<Form>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM forms WHERE site_id = $1 AND id = $2");
        sqlx::query_as::<_, Form>(&query)
            .bind(site_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a form, returning the created row.
    ///
    /// Forms not bound to a content item are appended to the site order:
    /// their taxis is the site maximum plus one, read and written in one
    /// transaction.
    pub async fn create(pool: &PgPool, input: &NewForm) -> Result<Form, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let form = Self::create_in(&mut *tx, input).await?;
        tx.commit().await?;
        Ok(form)
    }

    /// [`FormRepo::create`] on an open connection or transaction.
    pub async fn create_in(conn: &mut PgConnection, input: &NewForm) -> Result<Form, sqlx::Error> {
        let taxis = if input.is_ordered() {
            next_taxis(Self::max_taxis(&mut *conn, input.site_id).await?)
        } else {
            0
        };

        let query = format!(
            "INSERT INTO forms
                (site_id, channel_id, content_id, title, description, taxis,
                 is_timeout, time_to_start, time_to_end, settings)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Form>(&query)
            .bind(input.site_id)
            .bind(input.channel_id)
            .bind(input.content_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(taxis)
            .bind(input.is_timeout)
            .bind(input.time_to_start)
            .bind(input.time_to_end)
            .bind(&input.settings)
            .fetch_one(&mut *conn)
            .await
    }

    /// Insert the site default form together with its default fields.
    pub async fn create_site_default(
        pool: &PgPool,
        site_id: DbId,
    ) -> Result<Form, sqlx::Error> {
        let input = NewForm::site_default(site_id, chrono::Utc::now());
        let mut tx = pool.begin().await?;

        let form = Self::create_in(&mut *tx, &input).await?;
        for (position, field) in default_fields().iter().enumerate() {
            let taxis = i32::try_from(position).unwrap_or(i32::MAX) + 1;
            let field = CreateFormField::from_default(form.id, taxis, field);
            FieldRepo::create(&mut *tx, &field).await?;
        }

        tx.commit().await?;
        tracing::info!(site_id, form_id = form.id, "Seeded default form");
        Ok(form)
    }

    /// Update a form by ID, returning the updated row.
    pub async fn update(
        pool: &PgPool,
        site_id: DbId,
        id: DbId,
        input: &UpdateForm,
    ) -> Result<Option<Form>, sqlx::Error> {
        let query = format!(
            "UPDATE forms SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                is_timeout = COALESCE($5, is_timeout),
                time_to_start = COALESCE($6, time_to_start),
                time_to_end = COALESCE($7, time_to_end),
                settings = COALESCE($8, settings),
                updated_at = now()
             WHERE site_id = $1 AND id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Form>(&query)
            .bind(site_id)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.is_timeout)
            .bind(input.time_to_start)
            .bind(input.time_to_end)
            .bind(&input.settings)
            .fetch_optional(pool)
            .await
    }

    /// Persist submission counters, returning the updated row.
    pub async fn update_counts(
        pool: &PgPool,
        id: DbId,
        total_count: i64,
        replied_count: i64,
    ) -> Result<Option<Form>, sqlx::Error> {
        let query = format!(
            "UPDATE forms SET total_count = $2, replied_count = $3, updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Form>(&query)
            .bind(id)
            .bind(total_count)
            .bind(replied_count)
            .fetch_optional(pool)
            .await
    }

    /// Delete a form with its fields and submission logs in one transaction.
    /// Returns `true` if the form existed.
    pub async fn delete(pool: &PgPool, site_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let fields = FieldRepo::delete_by_form(&mut *tx, id).await?;
        let logs = LogRepo::delete_by_form(&mut *tx, id).await?;
        let result = sqlx::query("DELETE FROM forms WHERE site_id = $1 AND id = $2")
            .bind(site_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        tracing::info!(site_id, form_id = id, fields, logs, "Deleted form");
        Ok(true)
    }

    // -- lookups --------------------------------------------------------------

    /// Whether a form with exactly this title exists in the site.
    pub async fn title_exists(
        pool: &PgPool,
        site_id: DbId,
        title: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM forms WHERE site_id = $1 AND title = $2)")
            .bind(site_id)
            .bind(title)
            .fetch_one(pool)
            .await
    }

    /// ID of the first form with this title in the site.
    pub async fn id_by_title(
        pool: &PgPool,
        site_id: DbId,
        title: &str,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM forms WHERE site_id = $1 AND title = $2 ORDER BY id LIMIT 1")
            .bind(site_id)
            .bind(title)
            .fetch_optional(pool)
            .await
    }

    /// ID of the form bound to a content item. Only fully specified triples
    /// (all ids positive) can match.
    pub async fn id_by_content(
        pool: &PgPool,
        site_id: DbId,
        channel_id: DbId,
        content_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        if site_id <= 0 || channel_id <= 0 || content_id <= 0 {
            return Ok(None);
        }
        sqlx::query_scalar(
            "SELECT id FROM forms WHERE site_id = $1 AND channel_id = $2 AND content_id = $3",
        )
        .bind(site_id)
        .bind(channel_id)
        .bind(content_id)
        .fetch_optional(pool)
        .await
    }

    // -- ordering -------------------------------------------------------------

    /// Highest taxis in the site, if it has any forms.
    pub async fn max_taxis<'e, E>(executor: E, site_id: DbId) -> Result<Option<i32>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT MAX(taxis) FROM forms WHERE site_id = $1")
            .bind(site_id)
            .fetch_one(executor)
            .await
    }

    /// Current taxis of a form of the site.
    pub async fn taxis_slot(
        pool: &PgPool,
        site_id: DbId,
        id: DbId,
    ) -> Result<Option<TaxisSlot>, sqlx::Error> {
        let row: Option<(DbId, i32)> =
            sqlx::query_as("SELECT id, taxis FROM forms WHERE site_id = $1 AND id = $2")
                .bind(site_id)
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(row.map(|(id, taxis)| TaxisSlot { id, taxis }))
    }

    /// The adjacent form from `taxis` in `direction`: the smallest greater
    /// taxis going up, the largest smaller one going down, ties to the
    /// lowest id.
    pub async fn neighbor_slot(
        pool: &PgPool,
        site_id: DbId,
        taxis: i32,
        direction: Direction,
    ) -> Result<Option<TaxisSlot>, sqlx::Error> {
        let query = match direction {
            Direction::Up => {
                "SELECT id, taxis FROM forms WHERE site_id = $1 AND taxis > $2
                 ORDER BY taxis ASC, id ASC LIMIT 1"
            }
            Direction::Down => {
                "SELECT id, taxis FROM forms WHERE site_id = $1 AND taxis < $2
                 ORDER BY taxis DESC, id ASC LIMIT 1"
            }
        };
        let row: Option<(DbId, i32)> = sqlx::query_as(query)
            .bind(site_id)
            .bind(taxis)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|(id, taxis)| TaxisSlot { id, taxis }))
    }

    /// Set a form's taxis.
    pub async fn set_taxis<'e, E>(executor: E, id: DbId, taxis: i32) -> Result<(), sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query("UPDATE forms SET taxis = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(taxis)
            .execute(executor)
            .await?;
        Ok(())
    }
}
