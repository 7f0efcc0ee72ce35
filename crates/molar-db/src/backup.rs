//! Snapshot, restore, and retention for the on-disk store.
//!
//! A backup is a plain file copy taken after folding the WAL into the main
//! database file, so a snapshot is a complete, self-contained image of the
//! store at that moment. Restore runs entirely under the resource's write
//! lock: the pool is dropped, the snapshot is copied over the live file,
//! stale WAL sidecars are cleared, and a fresh pool is built. If anything
//! fails after the pool has been dropped the resource stays offline and the
//! error says which stage gave out.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::database::{Database, DbError};
use crate::pool::create_pool;

/// Errors produced by backup, restore, and retention operations.
#[derive(Debug, Error)]
pub enum BackupError {
    /// The snapshot file to restore from does not exist.
    #[error("backup snapshot not found: {}", .0.display())]
    SnapshotNotFound(PathBuf),

    /// No backup with the given filename exists in the backup directory.
    #[error("backup not found: {0}")]
    NotFound(String),

    /// The filename names a path outside the backup directory.
    #[error("invalid backup filename: {0:?}")]
    InvalidFilename(String),

    /// The underlying resource was closed or unreachable.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Filesystem work on a snapshot failed.
    #[error("backup io error: {0}")]
    Io(#[from] std::io::Error),

    /// Restore failed after the live pool was already dropped. The resource
    /// is offline until a later restore or `open` succeeds.
    #[error("restore failed at stage '{stage}', database left offline: {source}")]
    RestoreInconsistent {
        stage: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// One snapshot file in the backup directory.
#[derive(Debug, Clone, Serialize)]
pub struct BackupEntry {
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Database {
    /// Copies the live store into the backup directory and returns the
    /// absolute path of the new snapshot.
    ///
    /// The WAL is checkpointed first so the copied file carries every
    /// committed write; a failed checkpoint is logged and the copy proceeds
    /// with whatever the main file holds. The resource is held for read for
    /// the duration, so a backup never overlaps a restore.
    pub fn backup(&self) -> Result<PathBuf, BackupError> {
        let slot = self.read_slot();
        let pool = slot.as_ref().ok_or(DbError::NotInitialized)?;
        {
            let conn = pool.get().map_err(DbError::from)?;
            if let Err(e) = conn.query_row("PRAGMA wal_checkpoint(TRUNCATE);", [], |_row| Ok(())) {
                tracing::warn!(error = %e, "wal checkpoint before snapshot failed");
            }
        }

        std::fs::create_dir_all(self.backup_dir())?;
        let stem = self
            .path()
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("clinic");
        let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ");
        let dest = self.backup_dir().join(format!("{stem}-{stamp}.db"));
        std::fs::copy(self.path(), &dest)?;
        let dest = dest.canonicalize().unwrap_or(dest);
        tracing::info!(snapshot = %dest.display(), "database backed up");
        Ok(dest)
    }

    /// Lists snapshots in the backup directory, newest first by modification
    /// time.
    ///
    /// A missing backup directory is treated as empty. Entries that vanish
    /// or turn unreadable mid-listing are skipped with a warning.
    pub fn list_backups(&self) -> Result<Vec<BackupEntry>, BackupError> {
        let dir = match std::fs::read_dir(self.backup_dir()) {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for dirent in dir {
            let dirent = dirent?;
            let path = dirent.path();
            if path.extension().and_then(|e| e.to_str()) != Some("db") {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let meta = match dirent.metadata() {
                Ok(meta) => meta,
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "skipping unreadable backup entry");
                    continue;
                }
            };
            if !meta.is_file() {
                continue;
            }
            let modified_at = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            // Creation time is not available on every filesystem.
            let created_at = meta
                .created()
                .map(DateTime::<Utc>::from)
                .unwrap_or(modified_at);
            entries.push(BackupEntry {
                filename: filename.to_string(),
                path: path.clone(),
                size_bytes: meta.len(),
                created_at,
                modified_at,
            });
        }

        entries.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        Ok(entries)
    }

    /// Deletes a snapshot by filename.
    ///
    /// The name must be a bare filename; anything that could escape the
    /// backup directory is rejected before touching the filesystem.
    pub fn delete_backup(&self, filename: &str) -> Result<(), BackupError> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(BackupError::InvalidFilename(filename.to_string()));
        }
        let path = self.backup_dir().join(filename);
        if !path.is_file() {
            return Err(BackupError::NotFound(filename.to_string()));
        }
        std::fs::remove_file(&path)?;
        tracing::info!(file = filename, "backup deleted");
        Ok(())
    }

    /// Replaces the live store with the given snapshot.
    ///
    /// The snapshot is checked for existence before the live pool is
    /// touched, so a bad path leaves the running database untouched. From
    /// the moment the pool is dropped until the new pool is up the resource
    /// is exclusively held; any failure in that window returns
    /// `RestoreInconsistent` and leaves the resource closed rather than
    /// serving a half-restored store.
    pub fn restore(&self, snapshot: &Path) -> Result<(), BackupError> {
        if !snapshot.is_file() {
            return Err(BackupError::SnapshotNotFound(snapshot.to_path_buf()));
        }

        let mut slot = self.write_slot();
        if slot.take().is_some() {
            tracing::info!(path = %self.path().display(), "database taken offline for restore");
        }

        if let Err(e) = std::fs::copy(snapshot, self.path()) {
            return Err(BackupError::RestoreInconsistent {
                stage: "overwrite",
                source: Box::new(e),
            });
        }

        // Sidecars belong to the pre-restore store; left in place they
        // would overlay the restored image on reopen.
        for suffix in ["-wal", "-shm"] {
            let sidecar = append_suffix(self.path(), suffix);
            match std::fs::remove_file(&sidecar) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(BackupError::RestoreInconsistent {
                        stage: "clear-sidecars",
                        source: Box::new(e),
                    });
                }
            }
        }

        match create_pool(self.path(), self.settings()) {
            Ok(pool) => {
                *slot = Some(pool);
                tracing::info!(snapshot = %snapshot.display(), "database restored from snapshot");
                Ok(())
            }
            Err(e) => Err(BackupError::RestoreInconsistent {
                stage: "reopen",
                source: Box::new(e),
            }),
        }
    }
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
