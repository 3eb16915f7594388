pub mod chat;
pub mod files;
