//! Casedesk database layer
//!
//! sqlx/Postgres repositories for the client registry and promoted-file
//! metadata, plus the traits services depend on so they can run against
//! in-memory doubles.

pub mod db;
pub mod traits;

pub use db::{ClientFileRepository, ClientRepository};
pub use traits::{ClientDirectory, FileRecordStore};
