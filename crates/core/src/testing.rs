//! In-memory store double shared by the core unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::definition_cache::FormStore;
use crate::form::{next_taxis, FormDefinition, NewForm};
use crate::ordering::{nearest_neighbor, Direction, SwapMode, TaxisSlot, TaxisStore};
use crate::types::DbId;

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("store unavailable")]
pub struct StoreFailure;

/// A form with only the identifying and ordering fields set.
pub fn form(id: DbId, site_id: DbId, channel_id: DbId, taxis: i32) -> FormDefinition {
    let now = chrono::Utc::now();
    FormDefinition {
        id,
        site_id,
        channel_id,
        content_id: 0,
        title: format!("Form {id}"),
        description: String::new(),
        taxis,
        is_timeout: false,
        time_to_start: now,
        time_to_end: now,
        settings: String::new(),
        total_count: 0,
        replied_count: 0,
    }
}

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<FormDefinition>>,
    pub loads: AtomicUsize,
    pub inserts: AtomicUsize,
    pub fail_loads: AtomicBool,
}

impl MemoryStore {
    pub fn with_forms(forms: Vec<FormDefinition>) -> Self {
        Self {
            rows: Mutex::new(forms),
            ..Self::default()
        }
    }

    pub async fn snapshot(&self) -> Vec<FormDefinition> {
        self.rows.lock().await.clone()
    }
}

#[async_trait]
impl FormStore for MemoryStore {
    type Error = StoreFailure;

    async fn load_site_forms(&self, site_id: DbId) -> Result<Vec<FormDefinition>, StoreFailure> {
        // Give concurrent callers a chance to interleave.
        tokio::task::yield_now().await;
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StoreFailure);
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .filter(|f| f.site_id == site_id)
            .cloned()
            .collect())
    }

    async fn insert_form(&self, input: &NewForm) -> Result<FormDefinition, StoreFailure> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().await;
        let id = rows.iter().map(|f| f.id).max().unwrap_or(0) + 1;
        let taxis = if input.is_ordered() {
            next_taxis(
                rows.iter()
                    .filter(|f| f.site_id == input.site_id)
                    .map(|f| f.taxis)
                    .max(),
            )
        } else {
            0
        };
        let created = FormDefinition {
            id,
            site_id: input.site_id,
            channel_id: input.channel_id,
            content_id: input.content_id,
            title: input.title.clone(),
            description: input.description.clone(),
            taxis,
            is_timeout: input.is_timeout,
            time_to_start: input.time_to_start,
            time_to_end: input.time_to_end,
            settings: input.settings.clone(),
            total_count: 0,
            replied_count: 0,
        };
        rows.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl TaxisStore for MemoryStore {
    type Error = StoreFailure;

    async fn taxis_slot(
        &self,
        site_id: DbId,
        form_id: DbId,
    ) -> Result<Option<TaxisSlot>, StoreFailure> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .find(|f| f.id == form_id && f.site_id == site_id)
            .map(|f| TaxisSlot {
                id: f.id,
                taxis: f.taxis,
            }))
    }

    async fn neighbor_slot(
        &self,
        site_id: DbId,
        taxis: i32,
        direction: Direction,
    ) -> Result<Option<TaxisSlot>, StoreFailure> {
        let rows = self.rows.lock().await;
        let slots = rows.iter().filter(|f| f.site_id == site_id).map(|f| TaxisSlot {
            id: f.id,
            taxis: f.taxis,
        });
        Ok(nearest_neighbor(slots, taxis, direction))
    }

    async fn swap_taxis(
        &self,
        a: TaxisSlot,
        b: TaxisSlot,
        _mode: SwapMode,
    ) -> Result<(), StoreFailure> {
        let mut rows = self.rows.lock().await;
        for row in rows.iter_mut() {
            if row.id == a.id {
                row.taxis = b.taxis;
            } else if row.id == b.id {
                row.taxis = a.taxis;
            }
        }
        Ok(())
    }
}
