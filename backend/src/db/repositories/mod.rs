//! Repository implementations module.
//!
//! - `local`: In-memory implementation for unit testing, local development
//!   and the report binary
pub mod local;

pub use local::{validate_game, LocalRepository};
