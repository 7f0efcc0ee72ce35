//! The shared database resource handed to every component.
//!
//! A [`Database`] owns the live connection pool behind an `RwLock`. Request
//! paths take the lock for read, so they run concurrently; restore takes it
//! for write, which drains in-flight work and blocks new checkouts until the
//! pool has been rebuilt over the restored file. The same mechanism gives
//! `get` a definite answer before `open` has run: the slot is simply empty.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rusqlite::Connection;
use thiserror::Error;

use crate::pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};

/// Errors produced by the database resource.
#[derive(Debug, Error)]
pub enum DbError {
    /// `open` has not succeeded yet (or `close` has run since).
    #[error("database not initialized")]
    NotInitialized,

    /// The pool could not be created.
    #[error(transparent)]
    Init(#[from] PoolError),

    /// No connection could be checked out of the pool.
    #[error("failed to check out a database connection: {0}")]
    Checkout(#[from] r2d2::Error),

    /// A query run through the resource failed.
    #[error("database query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// Filesystem work around the database file failed.
    #[error("database io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Owns the SQLite store for the process.
///
/// Constructed once at startup and shared via `Arc`. `new` only records
/// paths; nothing touches the filesystem until [`Database::open`].
pub struct Database {
    path: PathBuf,
    backup_dir: PathBuf,
    settings: DbRuntimeSettings,
    pool: RwLock<Option<DbPool>>,
}

impl Database {
    /// Records where the store and its backups live. No files are created.
    pub fn new(
        path: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
        settings: DbRuntimeSettings,
    ) -> Self {
        Self {
            path: path.into(),
            backup_dir: backup_dir.into(),
            settings,
            pool: RwLock::new(None),
        }
    }

    /// Path of the live database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory that holds backup snapshots.
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn settings(&self) -> DbRuntimeSettings {
        self.settings
    }

    /// Creates the store's parent directory and the backup directory, then
    /// builds the connection pool.
    ///
    /// Calling `open` on an already-open resource is a logged no-op.
    pub fn open(&self) -> Result<(), DbError> {
        let mut slot = self.write_slot();
        if slot.is_some() {
            tracing::debug!(path = %self.path.display(), "database already open");
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::create_dir_all(&self.backup_dir)?;
        let pool = create_pool(&self.path, self.settings)?;
        *slot = Some(pool);
        tracing::info!(path = %self.path.display(), "database opened");
        Ok(())
    }

    /// Returns a handle to the pool, or `DbError::NotInitialized` when the
    /// resource is closed.
    ///
    /// The returned pool is a clone and is not covered by the restore gate;
    /// request paths should prefer [`Database::with_conn`].
    pub fn get(&self) -> Result<DbPool, DbError> {
        match self.read_slot().as_ref() {
            Some(pool) => Ok(pool.clone()),
            None => Err(DbError::NotInitialized),
        }
    }

    /// Runs `f` with a pooled connection while holding the resource for
    /// read.
    ///
    /// Every caller of `with_conn` proceeds concurrently with the others,
    /// but none can overlap a restore: the write half of the lock waits for
    /// all of them and holds off new ones until the pool is rebuilt.
    pub fn with_conn<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<DbError>,
    {
        let slot = self.read_slot();
        let pool = slot.as_ref().ok_or(DbError::NotInitialized)?;
        let conn = pool.get().map_err(DbError::from)?;
        f(&conn)
    }

    /// Drops the pool. Outstanding connections finish their work and close
    /// as they are returned. Calling `close` when already closed is a no-op.
    pub fn close(&self) {
        let mut slot = self.write_slot();
        if slot.take().is_some() {
            tracing::info!(path = %self.path.display(), "database closed");
        } else {
            tracing::debug!("database already closed");
        }
    }

    pub(crate) fn read_slot(&self) -> RwLockReadGuard<'_, Option<DbPool>> {
        // A poisoned lock only means some holder panicked; the slot itself
        // is always a plain Option and stays consistent.
        self.pool.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write_slot(&self) -> RwLockWriteGuard<'_, Option<DbPool>> {
        self.pool.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("backup_dir", &self.backup_dir)
            .field("open", &self.read_slot().is_some())
            .finish()
    }
}
