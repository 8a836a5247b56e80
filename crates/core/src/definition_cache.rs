//! Per-site cache of form definitions.
//!
//! Each site's full form list is loaded from the store on first access and
//! kept for a fixed TTL. Population is double-checked: warm reads only take
//! the map's shared read guard, while misses serialize on one population
//! lock and re-check before loading, so concurrent first readers of a site
//! cause exactly one store round-trip.
//!
//! [`DefinitionCache::upsert`] and [`DefinitionCache::invalidate`] hold the
//! same lock, so a population in flight can never overwrite a mutation.
//!
//! Readers receive `Arc<Vec<FormDefinition>>` snapshots. Mutation is
//! copy-on-write: a snapshot obtained before an upsert keeps its old
//! contents, and the next [`DefinitionCache::get_all`] observes the change.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::form::{channel_view, FormDefinition, NewForm};
use crate::ttl_cache::TtlCache;
use crate::types::DbId;

/// Default lifetime of a cached site list.
pub const DEFAULT_TTL: Duration = Duration::from_secs(12 * 3600);

/// Backing store for form definitions.
#[async_trait]
pub trait FormStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load every form of a site.
    async fn load_site_forms(&self, site_id: DbId) -> Result<Vec<FormDefinition>, Self::Error>;

    /// Insert a form and return the stored row.
    async fn insert_form(&self, input: &NewForm) -> Result<FormDefinition, Self::Error>;
}

/// Snapshot of one site's forms.
pub type FormList = Arc<Vec<FormDefinition>>;

pub struct DefinitionCache<S> {
    store: S,
    entries: TtlCache<DbId, FormList>,
    populate: Mutex<()>,
    ttl: Duration,
}

impl<S: FormStore> DefinitionCache<S> {
    pub fn new(store: S, ttl: Duration) -> Self {
        Self {
            store,
            entries: TtlCache::new(),
            populate: Mutex::new(()),
            ttl,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// All forms of a site, loading them on a cache miss.
    pub async fn get_all(&self, site_id: DbId) -> Result<FormList, S::Error> {
        if let Some(list) = self.entries.get(&site_id).await {
            return Ok(list);
        }

        let _guard = self.populate.lock().await;
        self.get_or_load_locked(site_id).await
    }

    /// Replace the cached entry with the same id, or append it.
    ///
    /// Loads the site list first if it is not cached, so the update is
    /// never lost to a later population.
    pub async fn upsert(&self, form: FormDefinition) -> Result<(), S::Error> {
        let _guard = self.populate.lock().await;
        self.get_or_load_locked(form.site_id).await?;
        self.apply_upsert(form).await;
        Ok(())
    }

    /// Drop a site's cached list; the next read reloads it.
    pub async fn invalidate(&self, site_id: DbId) {
        let _guard = self.populate.lock().await;
        if self.entries.remove(&site_id).await {
            tracing::debug!(site_id, "Form cache invalidated");
        }
    }

    /// Number of sites with a cached list, counting expired ones not yet
    /// dropped.
    pub async fn cached_sites(&self) -> usize {
        self.entries.len().await
    }

    /// Forms of one channel, zero-taxis forms first, then by taxis descending.
    pub async fn list_for_channel(
        &self,
        site_id: DbId,
        channel_id: DbId,
    ) -> Result<Vec<FormDefinition>, S::Error> {
        let forms = self.get_all(site_id).await?;
        Ok(channel_view(&forms, channel_id))
    }

    pub async fn find(&self, site_id: DbId, id: DbId) -> Result<Option<FormDefinition>, S::Error> {
        let forms = self.get_all(site_id).await?;
        Ok(forms.iter().find(|f| f.id == id).cloned())
    }

    pub async fn find_by_content(
        &self,
        site_id: DbId,
        channel_id: DbId,
        content_id: DbId,
    ) -> Result<Option<FormDefinition>, S::Error> {
        let forms = self.get_all(site_id).await?;
        Ok(find_bound(&forms, channel_id, content_id).cloned())
    }

    pub async fn find_by_title(
        &self,
        site_id: DbId,
        title: &str,
    ) -> Result<Option<FormDefinition>, S::Error> {
        let forms = self.get_all(site_id).await?;
        Ok(forms.iter().find(|f| f.title == title).cloned())
    }

    /// The form bound to `(site, channel, content)`, inserting a new one when
    /// none exists. Creation is serialized with population, so concurrent
    /// callers in this process never insert twice.
    pub async fn get_or_create(
        &self,
        site_id: DbId,
        channel_id: DbId,
        content_id: DbId,
    ) -> Result<FormDefinition, S::Error> {
        if let Some(form) = self.find_by_content(site_id, channel_id, content_id).await? {
            return Ok(form);
        }

        let _guard = self.populate.lock().await;
        let forms = self.get_or_load_locked(site_id).await?;
        if let Some(form) = find_bound(&forms, channel_id, content_id) {
            return Ok(form.clone());
        }

        let input = NewForm::for_content(site_id, channel_id, content_id, chrono::Utc::now());
        let form = self.store.insert_form(&input).await?;
        tracing::info!(
            site_id,
            channel_id,
            content_id,
            form_id = form.id,
            "Created form for content"
        );
        self.apply_upsert(form.clone()).await;
        Ok(form)
    }

    /// Cached list or a fresh load. Caller must hold `populate`.
    async fn get_or_load_locked(&self, site_id: DbId) -> Result<FormList, S::Error> {
        if let Some(list) = self.entries.get(&site_id).await {
            return Ok(list);
        }

        let forms = self.store.load_site_forms(site_id).await?;
        tracing::debug!(site_id, count = forms.len(), "Form cache populated");
        let list = Arc::new(forms);
        self.entries
            .insert(site_id, Arc::clone(&list), self.ttl)
            .await;
        Ok(list)
    }

    /// Caller must hold `populate`.
    async fn apply_upsert(&self, form: FormDefinition) {
        let site_id = form.site_id;
        let form_id = form.id;
        let applied = self
            .entries
            .update(&site_id, |list| {
                let list = Arc::make_mut(list);
                match list.iter().position(|f| f.id == form.id) {
                    Some(index) => list[index] = form,
                    None => list.push(form),
                }
            })
            .await;

        if !applied {
            // Expired between load and update; the next read reloads from the store.
            tracing::debug!(site_id, form_id, "Form cache entry gone before upsert");
        }
    }
}

fn find_bound(forms: &[FormDefinition], channel_id: DbId, content_id: DbId) -> Option<&FormDefinition> {
    forms
        .iter()
        .find(|f| f.channel_id == channel_id && f.content_id == content_id)
}
