//! Database repositories for data access layer
//
// Client registry (exact and similarity lookups)
pub mod client;
//
// Promoted file metadata
pub mod client_file;

pub use client::ClientRepository;
pub use client_file::ClientFileRepository;
