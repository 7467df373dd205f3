//! Shared types for the lunch client: entities, wire protocol and errors.

pub mod models;
pub mod protocol;
pub mod error;

pub use models::*;
pub use protocol::*;
pub use error::*;
