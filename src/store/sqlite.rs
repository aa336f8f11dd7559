//! SqliteEntityStore - Relational entity store backed by SQLite.
//!
//! Each collection is one table:
//!
//! ```text
//! id TEXT PRIMARY KEY, version INTEGER, created_time INTEGER (µs),
//! modified_time INTEGER (µs), body TEXT (JSON document)
//! ```
//!
//! Record columns are authoritative; the JSON body carries the remaining
//! fields and is queried with `json_extract`. Tables are created on first use.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{EntityStore, Query, SortOrder, StoreError};
use crate::model::{self, Record, VersionedEntity};

/// Configuration for the SQLite entity store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,

    /// Enable WAL mode
    /// Default: true
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// How long a writer waits on a locked database before failing
    /// Default: 5000
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl SqliteConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }

    pub fn with_wal_mode(mut self, wal_mode: bool) -> Self {
        self.wal_mode = wal_mode;
        self
    }

    pub fn with_busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.busy_timeout_ms = busy_timeout_ms;
        self
    }
}

struct Inner {
    conn: Connection,
    tables: HashSet<&'static str>,
}

/// SQLite-backed entity store.
///
/// Clone-friendly via Arc. Every statement runs on one shared connection;
/// `update` is a single `UPDATE ... WHERE id = ? AND version = ?`, so the
/// database serializes concurrent writers.
#[derive(Clone)]
pub struct SqliteEntityStore {
    inner: Arc<Mutex<Inner>>,
}

const COLUMNS: &str = "id, version, created_time, modified_time, body";

fn storage_err(err: rusqlite::Error) -> StoreError {
    StoreError::Storage(err.to_string())
}

impl SqliteEntityStore {
    /// Open (or create) the database described by `config`.
    pub fn open(config: &SqliteConfig) -> Result<Self, StoreError> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
            }
        }

        let conn = Connection::open_with_flags(
            &config.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(storage_err)?;

        if config.wal_mode {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })
            .map_err(storage_err)?;
        }
        conn.busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
            .map_err(storage_err)?;

        tracing::info!(path = %config.path.display(), "opened sqlite entity store");
        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                conn,
                tables: HashSet::new(),
            })),
        }
    }

    /// Lock the connection and make sure `E`'s table exists.
    fn conn_for<E: VersionedEntity>(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        if !inner.tables.contains(E::COLLECTION) {
            inner
                .conn
                .execute(
                    &format!(
                        "CREATE TABLE IF NOT EXISTS {} (
                            id TEXT PRIMARY KEY,
                            version INTEGER NOT NULL,
                            created_time INTEGER NOT NULL,
                            modified_time INTEGER NOT NULL,
                            body TEXT NOT NULL
                        )",
                        E::COLLECTION
                    ),
                    [],
                )
                .map_err(storage_err)?;
            inner.tables.insert(E::COLLECTION);
        }

        Ok(inner)
    }
}

/// A raw row, decoded outside the rusqlite callback so serde errors keep
/// their own variant.
struct RawRow {
    id: String,
    version: i64,
    created_time: i64,
    modified_time: i64,
    body: String,
}

impl RawRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            version: row.get(1)?,
            created_time: row.get(2)?,
            modified_time: row.get(3)?,
            body: row.get(4)?,
        })
    }

    fn decode<E: VersionedEntity>(self) -> Result<E, StoreError> {
        let mut entity: E = serde_json::from_str(&self.body)?;
        *entity.record_mut() = Record {
            id: self.id,
            created_time: from_micros(self.created_time),
            modified_time: from_micros(self.modified_time),
            version: self.version as u64,
        };
        Ok(entity)
    }
}

fn from_micros(micros: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
}

fn to_micros(time: Option<DateTime<Utc>>) -> i64 {
    time.map(|t| t.timestamp_micros()).unwrap_or_default()
}

fn json_path(field: &str) -> String {
    format!("$.{}", field)
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

/// The `WHERE` clause and its bound parameters for the query's filters.
fn where_clause(query: &Query, params: &mut Vec<SqlValue>) -> String {
    if query.filters.is_empty() {
        return String::new();
    }

    let conditions: Vec<String> = query
        .filters
        .iter()
        .map(|(field, value)| {
            if field == "id" {
                params.push(to_sql_value(value));
                "id = ?".to_string()
            } else {
                params.push(SqlValue::Text(json_path(field)));
                params.push(to_sql_value(value));
                "json_extract(body, ?) = ?".to_string()
            }
        })
        .collect();

    format!(" WHERE {}", conditions.join(" AND "))
}

/// The `ORDER BY` clause. The field has already passed the allow-list.
fn order_clause(query: &Query, params: &mut Vec<SqlValue>) -> String {
    let direction = match query.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };

    let field = query.sort_field();
    let key = match field {
        "id" | "version" | "created_time" | "modified_time" => field.to_string(),
        _ => {
            params.push(SqlValue::Text(json_path(field)));
            "json_extract(body, ?)".to_string()
        }
    };

    format!(" ORDER BY {} {}, id ASC", key, direction)
}

impl EntityStore for SqliteEntityStore {
    fn get<E: VersionedEntity>(&self, id: &str) -> Result<Option<E>, StoreError> {
        let inner = self.conn_for::<E>()?;
        let raw = inner
            .conn
            .query_row(
                &format!("SELECT {} FROM {} WHERE id = ?1", COLUMNS, E::COLLECTION),
                params![id],
                RawRow::read,
            )
            .optional()
            .map_err(storage_err)?;

        raw.map(RawRow::decode::<E>).transpose()
    }

    fn query<E: VersionedEntity>(&self, query: &Query) -> Result<Vec<E>, StoreError> {
        query.validate::<E>()?;

        let mut params = Vec::new();
        let mut sql = format!("SELECT {} FROM {}", COLUMNS, E::COLLECTION);
        sql.push_str(&where_clause(query, &mut params));
        sql.push_str(&order_clause(query, &mut params));
        sql.push_str(" LIMIT ? OFFSET ?");
        params.push(SqlValue::Integer(
            query.limit.map(|l| l.min(i64::MAX as usize) as i64).unwrap_or(-1),
        ));
        params.push(SqlValue::Integer(query.offset.min(i64::MAX as usize) as i64));

        let inner = self.conn_for::<E>()?;
        let mut stmt = inner.conn.prepare(&sql).map_err(storage_err)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), RawRow::read)
            .map_err(storage_err)?;

        let mut entities = Vec::new();
        for row in rows {
            entities.push(row.map_err(storage_err)?.decode()?);
        }
        Ok(entities)
    }

    fn count<E: VersionedEntity>(&self, query: &Query) -> Result<usize, StoreError> {
        query.validate::<E>()?;

        let mut params = Vec::new();
        let mut sql = format!("SELECT COUNT(*) FROM {}", E::COLLECTION);
        sql.push_str(&where_clause(query, &mut params));

        let inner = self.conn_for::<E>()?;
        let count: i64 = inner
            .conn
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))
            .map_err(storage_err)?;

        Ok(count as usize)
    }

    fn insert<E: VersionedEntity>(&self, entity: &E) -> Result<E, StoreError> {
        let mut entity = entity.clone();
        entity.clear_derived();
        *entity.record_mut() = Record::created(Uuid::new_v4().to_string(), model::now());
        let body = serde_json::to_string(&entity)?;

        let inner = self.conn_for::<E>()?;
        inner
            .conn
            .execute(
                &format!(
                    "INSERT INTO {} ({}) VALUES (?1, 1, ?2, ?2, ?3)",
                    E::COLLECTION,
                    COLUMNS
                ),
                params![entity.id(), to_micros(entity.record().created_time), body],
            )
            .map_err(storage_err)?;

        Ok(entity)
    }

    fn update<E: VersionedEntity>(&self, entity: &E) -> Result<E, StoreError> {
        let mut entity = entity.clone();
        entity.clear_derived();
        let expected = entity.version();
        let body = serde_json::to_string(&entity)?;

        let inner = self.conn_for::<E>()?;
        let written: Option<(i64, i64)> = inner
            .conn
            .query_row(
                &format!(
                    "UPDATE {} SET body = ?1, version = version + 1,
                        modified_time = MAX(?2, modified_time + 1)
                     WHERE id = ?3 AND version = ?4
                     RETURNING created_time, modified_time",
                    E::COLLECTION
                ),
                params![
                    body,
                    model::now().timestamp_micros(),
                    entity.id(),
                    expected as i64
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(storage_err)?;

        match written {
            Some((created, modified)) => {
                let record = entity.record_mut();
                record.created_time = from_micros(created);
                record.modified_time = from_micros(modified);
                record.version = expected + 1;
                Ok(entity)
            }
            None => {
                // Zero rows: either the row is gone or its version moved on.
                let actual: Option<i64> = inner
                    .conn
                    .query_row(
                        &format!("SELECT version FROM {} WHERE id = ?1", E::COLLECTION),
                        params![entity.id()],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(storage_err)?;

                match actual {
                    Some(actual) => Err(StoreError::conflict::<E>(
                        entity.id(),
                        expected,
                        actual as u64,
                    )),
                    None => Err(StoreError::not_found::<E>(entity.id())),
                }
            }
        }
    }

    fn delete<E: VersionedEntity>(&self, id: &str) -> Result<bool, StoreError> {
        let inner = self.conn_for::<E>()?;
        let removed = inner
            .conn
            .execute(
                &format!("DELETE FROM {} WHERE id = ?1", E::COLLECTION),
                params![id],
            )
            .map_err(storage_err)?;

        Ok(removed > 0)
    }
}
