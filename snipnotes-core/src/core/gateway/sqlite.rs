//! SQLite-backed note table.
//!
//! Mirrors the hosted `notes` table column for column, including the
//! self-referencing foreign key on `parent_id`, so it enforces the same
//! constraints a remote table would.

use super::Gateway;
use crate::{Language, NewNote, NotePatch, NoteRecord, Result, SnipnotesError};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Fixed-width so that lexical order of the column is chronological.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Keeps `IN (...)` lists well under SQLite's bound-parameter limit.
const DELETE_CHUNK: usize = 500;

const SELECT_COLUMNS: &str = "id, parent_id, title, code, comment, language, created_at";

pub struct SqliteGateway {
    inner: Mutex<Inner>,
}

struct Inner {
    conn: Connection,
    last_created: Option<DateTime<Utc>>,
}

impl SqliteGateway {
    /// Opens (or creates) a note table in the SQLite file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SnipnotesError::Connection`] if the file cannot be opened or
    /// is not a SQLite database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(connection_error)?;
        Self::init(conn)
    }

    /// Opens a throwaway in-memory table.
    ///
    /// # Errors
    ///
    /// Returns [`SnipnotesError::Connection`] if SQLite cannot be initialised.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(connection_error)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(connection_error)?;
        conn.execute_batch(include_str!("schema.sql"))
            .map_err(connection_error)?;

        let last_created: Option<String> = conn
            .query_row("SELECT MAX(created_at) FROM notes", [], |row| row.get(0))
            .map_err(connection_error)?;
        let last_created = last_created
            .map(|raw| parse_timestamp(&raw))
            .transpose()
            .map_err(connection_error)?;

        Ok(Self {
            inner: Mutex::new(Inner { conn, last_created }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    /// Current time, nudged forward so every row gets a distinct `created_at`.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_created {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_created = Some(now);
        now
    }

    fn fetch(&self, id: &str) -> rusqlite::Result<Option<NoteRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM notes WHERE id = ?1"),
                [id],
                map_note_row,
            )
            .optional()
    }
}

impl Gateway for SqliteGateway {
    fn select_all_ordered(&self) -> Result<Vec<NoteRecord>> {
        let inner = self.lock();
        let mut stmt = inner
            .conn
            .prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM notes ORDER BY created_at ASC, rowid ASC"
            ))
            .map_err(connection_error)?;
        let rows = stmt
            .query_map([], map_note_row)
            .map_err(connection_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(connection_error)?;
        log::debug!("selected {} note rows", rows.len());
        Ok(rows)
    }

    fn insert_one(&self, fields: &NewNote) -> Result<NoteRecord> {
        let mut inner = self.lock();
        let record = NoteRecord {
            id: Uuid::new_v4().to_string(),
            parent_id: fields.parent_id.clone(),
            title: fields.title.clone(),
            code: fields.code.clone(),
            comment: fields.comment.clone(),
            language: fields.language,
            created_at: inner.next_timestamp(),
        };

        inner
            .conn
            .execute(
                "INSERT INTO notes (id, parent_id, title, code, comment, language, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id,
                    record.parent_id,
                    record.title,
                    record.code,
                    record.comment,
                    record.language.as_str(),
                    format_timestamp(&record.created_at),
                ],
            )
            .map_err(write_error)?;

        log::debug!("inserted note {} under {:?}", record.id, record.parent_id);
        Ok(record)
    }

    fn update_one(&self, id: &str, patch: &NotePatch) -> Result<NoteRecord> {
        let inner = self.lock();

        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        if let Some(title) = &patch.title {
            assignments.push("title = ?");
            values.push(title.clone());
        }
        if let Some(code) = &patch.code {
            assignments.push("code = ?");
            values.push(code.clone());
        }
        if let Some(comment) = &patch.comment {
            assignments.push("comment = ?");
            values.push(comment.clone());
        }
        if let Some(language) = patch.language {
            assignments.push("language = ?");
            values.push(language.as_str().to_string());
        }

        if !assignments.is_empty() {
            let sql = format!("UPDATE notes SET {} WHERE id = ?", assignments.join(", "));
            values.push(id.to_string());
            let changed = inner
                .conn
                .execute(&sql, params_from_iter(values.iter()))
                .map_err(write_error)?;
            if changed == 0 {
                return Err(SnipnotesError::NoteNotFound(id.to_string()));
            }
        }

        let row = inner
            .fetch(id)
            .map_err(write_error)?
            .ok_or_else(|| SnipnotesError::NoteNotFound(id.to_string()))?;
        log::debug!("updated note {id} ({} field(s))", assignments.len());
        Ok(row)
    }

    fn delete_many(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut inner = self.lock();
        let tx = inner.conn.transaction().map_err(write_error)?;
        // A chunk may remove parents whose children sit in a later chunk.
        // Check the parent_id foreign key at commit instead of per statement.
        tx.execute_batch("PRAGMA defer_foreign_keys = ON")
            .map_err(write_error)?;
        let mut removed = 0;
        for chunk in ids.chunks(DELETE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            removed += tx
                .execute(
                    &format!("DELETE FROM notes WHERE id IN ({placeholders})"),
                    params_from_iter(chunk.iter()),
                )
                .map_err(write_error)?;
        }
        tx.commit().map_err(write_error)?;
        log::debug!("deleted {removed} of {} requested note rows", ids.len());
        Ok(())
    }
}

fn map_note_row(row: &rusqlite::Row) -> rusqlite::Result<NoteRecord> {
    let language: String = row.get(5)?;
    let language = language.parse::<Language>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at: String = row.get(6)?;
    Ok(NoteRecord {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        title: row.get(2)?,
        code: row.get(3)?,
        comment: row.get(4)?,
        language,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn connection_error(e: rusqlite::Error) -> SnipnotesError {
    SnipnotesError::Connection(e.to_string())
}

fn write_error(e: rusqlite::Error) -> SnipnotesError {
    SnipnotesError::Write(e.to_string())
}
