pub mod client;
pub mod file;
pub mod outcome;
pub mod staged;

pub use client::*;
pub use file::*;
pub use outcome::*;
pub use staged::*;
