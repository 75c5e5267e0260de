//! Persisted query snapshots for last-known-good data across restarts.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, OptionalExtension};
use serde_json::Value;

use super::descriptor::Descriptor;
use crate::db::{parse_datetime, Database};

/// A payload loaded from storage.
#[derive(Debug, Clone)]
pub struct StoredSnapshot {
  pub data: Value,
  pub cached_at: DateTime<Utc>,
}

/// Trait for snapshot storage backends.
pub trait SnapshotStorage: Send + Sync {
  /// Get the stored payload for a descriptor.
  fn load(&self, descriptor: &Descriptor) -> Result<Option<StoredSnapshot>>;

  /// Store the latest successful payload for a descriptor.
  fn store(&self, descriptor: &Descriptor, data: &Value) -> Result<()>;

  /// Forget every stored payload.
  fn clear(&self) -> Result<()>;
}

/// Storage implementation that doesn't persist anything.
/// Used when persistence is disabled - all operations are no-ops.
pub struct NoopStorage;

impl SnapshotStorage for NoopStorage {
  fn load(&self, _descriptor: &Descriptor) -> Result<Option<StoredSnapshot>> {
    Ok(None) // Always miss
  }

  fn store(&self, _descriptor: &Descriptor, _data: &Value) -> Result<()> {
    Ok(()) // Discard
  }

  fn clear(&self) -> Result<()> {
    Ok(())
  }
}

/// SQLite-backed snapshot storage.
pub struct SqliteSnapshots {
  db: Database,
}

impl SqliteSnapshots {
  pub fn new(db: Database) -> Self {
    Self { db }
  }
}

impl SnapshotStorage for SqliteSnapshots {
  fn load(&self, descriptor: &Descriptor) -> Result<Option<StoredSnapshot>> {
    let row: Option<(Vec<u8>, String)> = self.db.with_conn(|conn| {
      conn
        .query_row(
          "SELECT data, cached_at FROM query_snapshots WHERE query_hash = ?",
          params![descriptor.hash()],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
    })?;

    match row {
      Some((data, cached_at)) => {
        let data = serde_json::from_slice(&data)
          .map_err(|e| eyre!("Failed to deserialize snapshot for {}: {}", descriptor, e))?;
        Ok(Some(StoredSnapshot {
          data,
          cached_at: parse_datetime(&cached_at)?,
        }))
      }
      None => Ok(None),
    }
  }

  fn store(&self, descriptor: &Descriptor, data: &Value) -> Result<()> {
    let bytes =
      serde_json::to_vec(data).map_err(|e| eyre!("Failed to serialize snapshot: {}", e))?;
    self.db.with_conn(|conn| {
      conn.execute(
        "INSERT OR REPLACE INTO query_snapshots (query_hash, description, category, data, cached_at)
         VALUES (?, ?, ?, ?, datetime('now'))",
        params![
          descriptor.hash(),
          descriptor.to_string(),
          descriptor.category(),
          bytes
        ],
      )
    })?;
    Ok(())
  }

  fn clear(&self) -> Result<()> {
    self
      .db
      .with_conn(|conn| conn.execute("DELETE FROM query_snapshots", []))?;
    Ok(())
  }
}
