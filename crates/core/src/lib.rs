//! Form-builder core.
//!
//! Hosts the stateful caches (form definitions, template fragments), the
//! display-order manager, and the markup pipeline that turns authored form
//! HTML into submit-wired markup. Persistence is reached through the store
//! traits in [`definition_cache`] and [`ordering`].

pub mod definition_cache;
pub mod error;
pub mod form;
pub mod markup;
pub mod ordering;
pub mod render;
pub mod template;
pub mod ttl_cache;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;
