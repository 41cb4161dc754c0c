use std::collections::HashMap;

use thiserror::Error;

use crate::db::repository::{RepoError, Repository};
use crate::models::productivity::{Productivity, ValidationError};
use crate::utils::time;

#[derive(Error, Debug)]
pub enum ItemError {
    #[error("Missing data: {0}")]
    MissingData(&'static str),

    #[error("Data validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid data: {0}")]
    InvalidData(&'static str),

    #[error("ID not found: {0}")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),
}

impl From<RepoError> for ItemError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound(id) => ItemError::NotFound(id),
            RepoError::Validation(v) => ItemError::Validation(v),
            RepoError::Db(e) => ItemError::Db(e),
        }
    }
}

pub type ItemResult<T> = Result<T, ItemError>;

/// The user-editable fields of a request, before type conversion.
struct RawItem<'a> {
    item: &'a str,
    frequency: &'a str,
    group: &'a str,
}

impl<'a> RawItem<'a> {
    fn take(fields: &'a HashMap<String, String>) -> ItemResult<Self> {
        let get = |key: &'static str| {
            fields
                .get(key)
                .map(String::as_str)
                .ok_or(ItemError::MissingData(key))
        };

        Ok(Self {
            item: get("item")?,
            frequency: get("frequency")?,
            group: get("group")?,
        })
    }

    fn frequency_code(&self) -> ItemResult<i64> {
        self.frequency.trim().parse::<i64>().map_err(|_| {
            ItemError::Validation(ValidationError {
                fields: vec!["frequency"],
            })
        })
    }
}

/// Request-level operations on `Productivity` records.
pub struct ItemLogic;

impl ItemLogic {
    pub fn create<R: Repository + ?Sized>(
        repo: &mut R,
        fields: &HashMap<String, String>,
    ) -> ItemResult<Productivity> {
        let raw = RawItem::take(fields)?;
        let mut entity = Productivity::new(raw.item, raw.frequency_code()?, raw.group);

        entity.save(repo)?;
        Ok(entity)
    }

    pub fn get<R: Repository + ?Sized>(repo: &R, id: i64) -> ItemResult<Productivity> {
        Ok(repo.get(id)?)
    }

    pub fn list<R: Repository + ?Sized>(repo: &R) -> ItemResult<Vec<Productivity>> {
        Ok(repo.list()?)
    }

    /// Apply new field values to record `id`.
    ///
    /// A non-empty `last_check` replaces the automatic stamp; the previous
    /// `last_check` still moves into `last_check_undo`.
    pub fn update<R: Repository + ?Sized>(
        repo: &mut R,
        id: i64,
        fields: &HashMap<String, String>,
    ) -> ItemResult<Productivity> {
        let mut entity = repo.get(id)?;
        let raw = RawItem::take(fields)?;

        let stamp = match fields.get("last_check").map(|s| s.trim()) {
            None | Some("") => time::now(),
            Some(s) => time::parse_iso(s).ok_or(ItemError::InvalidData("last_check"))?,
        };

        entity.item = raw.item.to_string();
        entity.frequency = Some(raw.frequency_code()?);
        entity.group = raw.group.to_string();

        entity.save_at(repo, stamp)?;
        Ok(entity)
    }

    pub fn delete<R: Repository + ?Sized>(repo: &mut R, id: i64) -> ItemResult<usize> {
        Ok(repo.delete(id)?)
    }
}
