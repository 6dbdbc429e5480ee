//! [`SqliteStore`] — the SQLite implementation of [`RecordStore`].

use std::path::Path;

use bytes::Bytes;
use chrono::Utc;
use rusqlite::OptionalExtension as _;
use serde_json::{Map, Value};
use uuid::Uuid;

use folio_core::{
  record::{NewRecord, Record, RecordId, StoredFile, validate_collection},
  store::{Filter, FindQuery, RecordStore},
};

use crate::{
  Error, Result,
  encode::{RawRecord, encode_data, encode_dt, json_path},
  schema::SCHEMA,
};

/// `?2` is the field's JSON path, `?3` the wanted ID. Mirrors
/// `folio_core::reference::Reference`: a bare string, or an object whose `id`
/// or `value` equals the ID. JSON numbers never compare equal to `?3` text.
const CONTAINS_SQL: &str = "
  AND (
    (json_type(data_json, ?2) = 'text' AND json_extract(data_json, ?2) = ?3)
    OR (json_type(data_json, ?2) = 'object' AND (
         (json_type(data_json, ?2 || '.id') = 'text'
          AND json_extract(data_json, ?2 || '.id') = ?3)
         OR (json_type(data_json, ?2 || '.value') = 'text'
             AND json_extract(data_json, ?2 || '.value') = ?3)))
    OR (json_type(data_json, ?2) = 'array' AND EXISTS (
         SELECT 1 FROM json_each(data_json, ?2) j
         WHERE (j.type = 'text' AND j.value = ?3)
            OR (j.type = 'object' AND (
                 (json_type(j.value, '$.id') = 'text' AND json_extract(j.value, '$.id') = ?3)
                 OR (json_type(j.value, '$.value') = 'text'
                     AND json_extract(j.value, '$.value') = ?3)))))
  )";

const EQUALS_SQL: &str = "
  AND json_type(data_json, ?2) = 'text' AND json_extract(data_json, ?2) = ?3";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Folio record store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(?path, "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn fetch(&self, collection: &str, id: &RecordId) -> Result<Option<Record>> {
    let collection = collection.to_owned();
    let id_str = id.as_str().to_owned();

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM records WHERE collection = ?1 AND record_id = ?2",
                RawRecord::COLUMNS
              ),
              rusqlite::params![collection, id_str],
              RawRecord::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Record>> {
    validate_collection(collection)?;

    let (condition, path, value) = match &query.filter {
      Filter::All => ("", None, None),
      Filter::Equals { field, value } => (EQUALS_SQL, Some(json_path(field)?), Some(value.clone())),
      Filter::Contains { field, id } => {
        (CONTAINS_SQL, Some(json_path(field)?), Some(id.as_str().to_owned()))
      }
    };
    // SQLite treats a negative LIMIT as "no limit".
    let limit_val = query.limit.map_or(-1, |l| l as i64);
    let collection = collection.to_owned();

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM records
           WHERE collection = ?1 {condition}
           ORDER BY rowid
           LIMIT ?4",
          RawRecord::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![collection, path.as_deref(), value.as_deref(), limit_val],
            RawRecord::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn get(&self, collection: &str, id: &RecordId) -> Result<Option<Record>> {
    validate_collection(collection)?;
    self.fetch(collection, id).await
  }

  async fn create(&self, collection: &str, input: NewRecord) -> Result<Record> {
    validate_collection(collection)?;

    let id = RecordId::new(Uuid::new_v4().to_string())?;
    let now = Utc::now();
    let mut data = input.data;
    if let Some(file) = &input.file {
      data.extend(file.describe(&id));
    }

    let record = Record {
      id,
      collection: collection.to_owned(),
      data,
      created_at: now,
      updated_at: now,
    };

    let collection_str = record.collection.clone();
    let id_str         = record.id.as_str().to_owned();
    let data_str       = encode_data(&record.data)?;
    let at_str         = encode_dt(now);
    let file           = input.file;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO records (collection, record_id, data_json, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)",
          rusqlite::params![collection_str, id_str, data_str, at_str],
        )?;
        if let Some(file) = file {
          tx.execute(
            "INSERT INTO files (record_id, filename, mime_type, bytes) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![id_str, file.filename, file.mime_type, file.bytes.as_ref()],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  async fn update(
    &self,
    collection: &str,
    id:         &RecordId,
    partial:    Map<String, Value>,
  ) -> Result<Record> {
    validate_collection(collection)?;

    let mut record = self
      .fetch(collection, id)
      .await?
      .ok_or_else(|| Error::NotFound { collection: collection.to_owned(), id: id.clone() })?;

    record.data.extend(partial);
    record.updated_at = Utc::now();

    let collection_str = collection.to_owned();
    let id_str         = id.as_str().to_owned();
    let data_str       = encode_data(&record.data)?;
    let at_str         = encode_dt(record.updated_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE records SET data_json = ?3, updated_at = ?4
           WHERE collection = ?1 AND record_id = ?2",
          rusqlite::params![collection_str, id_str, data_str, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::NotFound { collection: collection.to_owned(), id: id.clone() });
    }
    Ok(record)
  }

  async fn delete(&self, collection: &str, id: &RecordId) -> Result<bool> {
    validate_collection(collection)?;

    let collection_str = collection.to_owned();
    let id_str         = id.as_str().to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "DELETE FROM records WHERE collection = ?1 AND record_id = ?2",
          rusqlite::params![collection_str, id_str],
        )?;
        if changed > 0 {
          tx.execute("DELETE FROM files WHERE record_id = ?1", rusqlite::params![id_str])?;
        }
        tx.commit()?;
        Ok(changed)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn get_file(&self, id: &RecordId) -> Result<Option<StoredFile>> {
    let id_str = id.as_str().to_owned();

    let row: Option<(String, String, Vec<u8>)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT filename, mime_type, bytes FROM files WHERE record_id = ?1",
              rusqlite::params![id_str],
              |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(row.map(|(filename, mime_type, bytes)| StoredFile {
      record_id: id.clone(),
      filename,
      mime_type,
      bytes: Bytes::from(bytes),
    }))
  }
}
