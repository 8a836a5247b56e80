//! Site-wide display order ("taxis") of forms.
//!
//! Moving a form swaps its taxis with the immediately adjacent form of the
//! same site: the smallest strictly greater taxis when moving up, the largest
//! strictly smaller one when moving down. A form already at the edge stays
//! put and the move reports `false`; [`OrderManager::shift`] also tells an
//! edge apart from a form the site does not have.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Direction of a reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards higher taxis (earlier in descending listings).
    Up,
    /// Towards lower taxis.
    Down,
}

/// How the two writes of a swap are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapMode {
    /// Both updates in one transaction.
    #[default]
    Transactional,
    /// Two independent updates, for stores without transactions. A failure
    /// between them can leave two forms sharing a taxis.
    Sequential,
}

impl FromStr for SwapMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transactional" => Ok(Self::Transactional),
            "sequential" => Ok(Self::Sequential),
            other => Err(CoreError::Validation(format!(
                "Unknown taxis swap mode '{other}' (expected 'transactional' or 'sequential')"
            ))),
        }
    }
}

impl fmt::Display for SwapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transactional => f.write_str("transactional"),
            Self::Sequential => f.write_str("sequential"),
        }
    }
}

/// Result of [`OrderManager::shift`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// No neighbour in that direction.
    AtEdge,
    /// The form does not exist in the site.
    UnknownForm,
}

impl MoveOutcome {
    pub fn is_moved(self) -> bool {
        self == Self::Moved
    }
}

/// A form id with its current taxis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxisSlot {
    pub id: DbId,
    pub taxis: i32,
}

/// Store operations needed to reorder forms.
#[async_trait]
pub trait TaxisStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Current slot of a form, if it belongs to `site_id`.
    async fn taxis_slot(&self, site_id: DbId, form_id: DbId)
        -> Result<Option<TaxisSlot>, Self::Error>;

    /// The adjacent slot in `direction` from `taxis` within the site.
    /// Must follow [`nearest_neighbor`].
    async fn neighbor_slot(
        &self,
        site_id: DbId,
        taxis: i32,
        direction: Direction,
    ) -> Result<Option<TaxisSlot>, Self::Error>;

    /// Give `a` the taxis of `b` and `b` the taxis of `a`.
    async fn swap_taxis(
        &self,
        a: TaxisSlot,
        b: TaxisSlot,
        mode: SwapMode,
    ) -> Result<(), Self::Error>;
}

/// Pick the adjacent slot: smallest taxis above `taxis` for [`Direction::Up`],
/// largest below it for [`Direction::Down`]. Ties go to the lowest id.
pub fn nearest_neighbor<I>(slots: I, taxis: i32, direction: Direction) -> Option<TaxisSlot>
where
    I: IntoIterator<Item = TaxisSlot>,
{
    let candidates = slots.into_iter();
    match direction {
        Direction::Up => candidates
            .filter(|s| s.taxis > taxis)
            .min_by_key(|s| (s.taxis, s.id)),
        Direction::Down => candidates
            .filter(|s| s.taxis < taxis)
            .min_by_key(|s| (Reverse(s.taxis), s.id)),
    }
}

pub struct OrderManager<S> {
    store: S,
    mode: SwapMode,
}

impl<S: TaxisStore> OrderManager<S> {
    pub fn new(store: S, mode: SwapMode) -> Self {
        Self { store, mode }
    }

    pub fn mode(&self) -> SwapMode {
        self.mode
    }

    /// `false` when the form is unknown or already at the edge.
    pub async fn move_up(&self, site_id: DbId, form_id: DbId) -> Result<bool, S::Error> {
        Ok(self.shift(site_id, form_id, Direction::Up).await?.is_moved())
    }

    pub async fn move_down(&self, site_id: DbId, form_id: DbId) -> Result<bool, S::Error> {
        Ok(self.shift(site_id, form_id, Direction::Down).await?.is_moved())
    }

    /// Swap with the adjacent form in `direction`.
    pub async fn shift(
        &self,
        site_id: DbId,
        form_id: DbId,
        direction: Direction,
    ) -> Result<MoveOutcome, S::Error> {
        let Some(target) = self.store.taxis_slot(site_id, form_id).await? else {
            return Ok(MoveOutcome::UnknownForm);
        };
        let Some(neighbor) = self
            .store
            .neighbor_slot(site_id, target.taxis, direction)
            .await?
        else {
            return Ok(MoveOutcome::AtEdge);
        };

        self.store.swap_taxis(target, neighbor, self.mode).await?;
        tracing::debug!(
            site_id,
            form_id,
            neighbor_id = neighbor.id,
            from = target.taxis,
            to = neighbor.taxis,
            ?direction,
            "Form taxis swapped"
        );
        Ok(MoveOutcome::Moved)
    }
}
