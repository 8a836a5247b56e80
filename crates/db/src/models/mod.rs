//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the table row
//! and the DTOs used to insert or patch it.

pub mod field;
pub mod form;
pub mod log;
