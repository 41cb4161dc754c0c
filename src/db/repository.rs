//! Persistence gateway for `Productivity` records.

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

use crate::models::productivity::{Productivity, ValidationError};
use crate::utils::time;

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("ID not found: {0}")]
    NotFound(i64),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage operations the model needs. Writes validate before touching storage.
pub trait Repository {
    /// Store a new record and return its assigned id.
    fn insert(&mut self, item: &Productivity) -> RepoResult<i64>;

    /// Overwrite every field of record `id`.
    fn update(&mut self, id: i64, item: &Productivity) -> RepoResult<()>;

    fn get(&self, id: i64) -> RepoResult<Productivity>;

    fn list(&self) -> RepoResult<Vec<Productivity>>;

    /// Remove record `id`, returning the number of rows removed.
    fn delete(&mut self, id: i64) -> RepoResult<usize>;
}

pub struct SqliteRepository<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

fn parse_stamp(raw: &str, col: usize) -> rusqlite::Result<NaiveDateTime> {
    time::parse_iso(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            col,
            rusqlite::types::Type::Text,
            format!("Invalid timestamp: {raw}").into(),
        )
    })
}

pub fn map_row(row: &Row) -> rusqlite::Result<Productivity> {
    let last_check: Option<String> = row.get("last_check")?;
    let last_check = match last_check.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(parse_stamp(raw, 4)?),
    };

    let undo: String = row.get("last_check_undo")?;

    Ok(Productivity {
        id: Some(row.get("id")?),
        item: row.get("item")?,
        frequency: row.get("frequency")?,
        group: row.get("group")?,
        last_check,
        last_check_undo: parse_stamp(&undo, 5)?,
    })
}

fn stamp_param(ts: &Option<NaiveDateTime>) -> String {
    ts.as_ref().map(time::to_iso).unwrap_or_default()
}

impl Repository for SqliteRepository<'_> {
    fn insert(&mut self, item: &Productivity) -> RepoResult<i64> {
        item.validate()?;

        self.conn.execute(
            r#"INSERT INTO productivity (item, frequency, "group", last_check, last_check_undo)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            params![
                item.item,
                item.frequency,
                item.group,
                stamp_param(&item.last_check),
                time::to_iso(&item.last_check_undo),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&mut self, id: i64, item: &Productivity) -> RepoResult<()> {
        item.validate()?;

        let changed = self.conn.execute(
            r#"UPDATE productivity
               SET item = ?1, frequency = ?2, "group" = ?3,
                   last_check = ?4, last_check_undo = ?5
               WHERE id = ?6"#,
            params![
                item.item,
                item.frequency,
                item.group,
                stamp_param(&item.last_check),
                time::to_iso(&item.last_check_undo),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn get(&self, id: i64) -> RepoResult<Productivity> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT * FROM productivity WHERE id = ?1")?;

        stmt.query_row([id], map_row)
            .optional()?
            .ok_or(RepoError::NotFound(id))
    }

    fn list(&self) -> RepoResult<Vec<Productivity>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT * FROM productivity ORDER BY id ASC")?;

        let rows = stmt.query_map([], map_row)?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    fn delete(&mut self, id: i64) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM productivity WHERE id = ?1", [id])?;

        if removed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(removed)
    }
}
