//! Persisted boolean flags.

use color_eyre::Result;
use rusqlite::{params, OptionalExtension};

use super::Database;

/// Set once the career analysis form has been submitted. Decides whether
/// the app opens on the dashboard or on the analysis form.
pub const ANALYSIS_COMPLETED: &str = "analysis_completed";

/// Last username that logged in successfully, used to prefill the form.
pub const LAST_USERNAME: &str = "last_username";

/// Comma separated ids of practice problems marked solved.
pub const DSA_SOLVED: &str = "dsa_solved";

/// Client-local flag store.
#[derive(Clone)]
pub struct Flags {
  db: Database,
}

impl Flags {
  pub fn new(db: Database) -> Self {
    Self { db }
  }

  pub fn get(&self, name: &str) -> Result<Option<String>> {
    self.db.with_conn(|conn| {
      conn
        .query_row(
          "SELECT value FROM flags WHERE name = ?",
          params![name],
          |row| row.get(0),
        )
        .optional()
    })
  }

  pub fn set(&self, name: &str, value: &str) -> Result<()> {
    self.db.with_conn(|conn| {
      conn.execute(
        "INSERT OR REPLACE INTO flags (name, value, updated_at) VALUES (?, ?, datetime('now'))",
        params![name, value],
      )
    })?;
    Ok(())
  }

  pub fn clear(&self, name: &str) -> Result<()> {
    self
      .db
      .with_conn(|conn| conn.execute("DELETE FROM flags WHERE name = ?", params![name]))?;
    Ok(())
  }

  /// Read a boolean flag. Anything but "true" reads as false.
  pub fn get_bool(&self, name: &str) -> Result<bool> {
    Ok(self.get(name)?.as_deref() == Some("true"))
  }

  pub fn set_bool(&self, name: &str, value: bool) -> Result<()> {
    self.set(name, if value { "true" } else { "false" })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn flags() -> Flags {
    Flags::new(Database::open_in_memory().unwrap())
  }

  #[test]
  fn test_missing_flag_is_false() {
    let flags = flags();
    assert!(!flags.get_bool(ANALYSIS_COMPLETED).unwrap());
    assert_eq!(flags.get(LAST_USERNAME).unwrap(), None);
  }

  #[test]
  fn test_set_and_clear() {
    let flags = flags();
    flags.set_bool(ANALYSIS_COMPLETED, true).unwrap();
    assert!(flags.get_bool(ANALYSIS_COMPLETED).unwrap());

    flags.set_bool(ANALYSIS_COMPLETED, false).unwrap();
    assert!(!flags.get_bool(ANALYSIS_COMPLETED).unwrap());

    flags.set(LAST_USERNAME, "priya").unwrap();
    flags.clear(LAST_USERNAME).unwrap();
    assert_eq!(flags.get(LAST_USERNAME).unwrap(), None);
  }
}
