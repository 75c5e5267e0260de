/// Schema for client-local tables.
pub const SCHEMA: &str = r#"
-- Persisted client flags (single scalars, no versioning)
CREATE TABLE IF NOT EXISTS flags (
    name TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Last successful payload per query descriptor
CREATE TABLE IF NOT EXISTS query_snapshots (
    query_hash TEXT PRIMARY KEY,
    description TEXT NOT NULL,
    category TEXT NOT NULL,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_query_snapshots_category
    ON query_snapshots(category);
"#;
