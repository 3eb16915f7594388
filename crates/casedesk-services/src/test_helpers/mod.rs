//! Test helpers for service and API tests
//!
//! In-memory stand-ins for the registry, the file metadata store, the blob
//! store and the language model. No database or network is needed.

pub mod fixtures;
pub mod mock_model;
pub mod mock_repositories;
pub mod mock_storage;

pub use fixtures::*;
pub use mock_model::ScriptedModel;
pub use mock_repositories::{MockClientDirectory, MockFileRecordStore};
pub use mock_storage::MockStorage;
