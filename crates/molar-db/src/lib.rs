//! Database layer for the Molar clinic platform.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! the shared [`Database`] resource, idempotent schema creation, and
//! file-level backup and restore.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: a clinic installation is a single box with no
//!   external database process. WAL mode allows concurrent readers with a
//!   single writer, which matches the front-desk access pattern.
//! - **`r2d2` connection pool**: bounded connection reuse without manual
//!   lifetime management.
//! - **One explicit resource**: nothing in the workspace holds a global
//!   connection. A [`Database`] is constructed at startup and passed to the
//!   components that need it, so tests can run several isolated stores in
//!   one process and restore can take the whole resource offline through a
//!   single lock.
//! - **Embedded declarative schema**: table definitions are SQL files
//!   compiled into the binary via `include_str!` and applied idempotently on
//!   every startup, so the schema ships with the server and cannot drift
//!   from the code that depends on it.

mod backup;
mod database;
mod pool;
mod schema;

pub use backup::{BackupEntry, BackupError};
pub use database::{Database, DbError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
pub use schema::{create_schema, SchemaDefaults, SchemaError};
