//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (or a connection inside a transaction) as the first
//! argument.

pub mod field_repo;
pub mod form_repo;
pub mod log_repo;

pub use field_repo::FieldRepo;
pub use form_repo::FormRepo;
pub use log_repo::LogRepo;
