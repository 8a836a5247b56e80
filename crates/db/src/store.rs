//! Store adapter connecting the core caches to PostgreSQL.

use async_trait::async_trait;
use formkit_core::definition_cache::FormStore;
use formkit_core::form::{FormDefinition, NewForm};
use formkit_core::ordering::{Direction, SwapMode, TaxisSlot, TaxisStore};
use formkit_core::types::DbId;

use crate::repositories::FormRepo;
use crate::DbPool;

/// [`FormStore`] and [`TaxisStore`] backed by the `forms` table.
#[derive(Clone)]
pub struct PgFormStore {
    pool: DbPool,
}

impl PgFormStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl FormStore for PgFormStore {
    type Error = sqlx::Error;

    async fn load_site_forms(&self, site_id: DbId) -> Result<Vec<FormDefinition>, sqlx::Error> {
        let rows = FormRepo::list_by_site(&self.pool, site_id).await?;
        Ok(rows.into_iter().map(FormDefinition::from).collect())
    }

    async fn insert_form(&self, input: &NewForm) -> Result<FormDefinition, sqlx::Error> {
        FormRepo::create(&self.pool, input).await.map(Into::into)
    }
}

#[async_trait]
impl TaxisStore for PgFormStore {
    type Error = sqlx::Error;

    async fn taxis_slot(
        &self,
        site_id: DbId,
        form_id: DbId,
    ) -> Result<Option<TaxisSlot>, sqlx::Error> {
        FormRepo::taxis_slot(&self.pool, site_id, form_id).await
    }

    async fn neighbor_slot(
        &self,
        site_id: DbId,
        taxis: i32,
        direction: Direction,
    ) -> Result<Option<TaxisSlot>, sqlx::Error> {
        FormRepo::neighbor_slot(&self.pool, site_id, taxis, direction).await
    }

    async fn swap_taxis(
        &self,
        a: TaxisSlot,
        b: TaxisSlot,
        mode: SwapMode,
    ) -> Result<(), sqlx::Error> {
        match mode {
            SwapMode::Transactional => {
                let mut tx = self.pool.begin().await?;
                FormRepo::set_taxis(&mut *tx, a.id, b.taxis).await?;
                FormRepo::set_taxis(&mut *tx, b.id, a.taxis).await?;
                tx.commit().await
            }
            SwapMode::Sequential => {
                FormRepo::set_taxis(&self.pool, a.id, b.taxis).await?;
                FormRepo::set_taxis(&self.pool, b.id, a.taxis).await
            }
        }
    }
}
