//! SQL schema for the Folio SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per record. No foreign keys between records: relationship fields
-- live inside data_json and are kept consistent by delete hooks.
CREATE TABLE IF NOT EXISTS records (
    collection  TEXT NOT NULL,
    record_id   TEXT NOT NULL,
    data_json   TEXT NOT NULL,   -- JSON object
    created_at  TEXT NOT NULL,   -- RFC 3339 UTC
    updated_at  TEXT NOT NULL,
    PRIMARY KEY (collection, record_id)
);

-- Uploaded bytes for media records.
CREATE TABLE IF NOT EXISTS files (
    record_id   TEXT PRIMARY KEY,
    filename    TEXT NOT NULL,
    mime_type   TEXT NOT NULL,
    bytes       BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS records_slug_idx
    ON records(collection, json_extract(data_json, '$.slug'));

PRAGMA user_version = 1;
";
