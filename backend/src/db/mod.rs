//! Storage collaborator for game records.
//!
//! The statistics engine never touches storage directly. It asks a
//! [`GameRepository`](repository::GameRepository) for the records matching a
//! selection and works on the returned copies.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Report binary / tests                                  │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  services::StatsService - fetch, filter, assemble       │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Trait (repository/mod.rs)                   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────▼──────────────────────────────┐
//!     │             Local Repository                  │
//!     │               (in-memory)                     │
//!     └──────────────────────────────────────────────┘
//! ```

pub mod checksum;
pub mod repositories;
pub mod repository;

pub use checksum::{calculate_checksum, snapshot_checksum};
pub use repositories::LocalRepository;
pub use repository::{GameRepository, RepositoryError, RepositoryResult};
