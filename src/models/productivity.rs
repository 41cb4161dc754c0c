//! The `Productivity` entity: a tracked item with its cadence and the
//! "last completed" stamp plus a one-step undo snapshot of it.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::frequency::Frequency;
use crate::db::repository::{RepoError, Repository};
use crate::utils::time;

pub const ITEM_MAX_LEN: usize = 200;
pub const GROUP_MAX_LEN: usize = 200;

/// Sink for soft data-integrity problems found while rendering an entity
/// (e.g. a stored frequency code that maps to no member).
pub trait IntegrityReporter {
    fn invalid_enum(&self, enum_name: &str, value: Option<i64>);
}

/// Default reporter: a `tracing` warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl IntegrityReporter for TracingReporter {
    fn invalid_enum(&self, enum_name: &str, value: Option<i64>) {
        tracing::warn!(value = ?value, "Invalid enum value for {enum_name}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Productivity {
    pub id: Option<i64>,
    pub item: String,
    /// Raw integer code; may be unset or unknown on records that were never validated.
    pub frequency: Option<i64>,
    pub group: String,
    pub last_check: Option<NaiveDateTime>,
    pub last_check_undo: NaiveDateTime,
}

impl Default for Productivity {
    fn default() -> Self {
        Self {
            id: None,
            item: String::new(),
            frequency: None,
            group: String::new(),
            last_check: None,
            last_check_undo: time::never(),
        }
    }
}

/// String-valued wire representation of a [`Productivity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRecord {
    pub id: String,
    pub item: String,
    pub frequency: String,
    pub group: String,
    pub last_check: String,
    pub last_check_undo: String,
}

impl WireRecord {
    pub fn to_fields(&self) -> HashMap<String, String> {
        HashMap::from([
            ("id".to_string(), self.id.clone()),
            ("item".to_string(), self.item.clone()),
            ("frequency".to_string(), self.frequency.clone()),
            ("group".to_string(), self.group.clone()),
            ("last_check".to_string(), self.last_check.clone()),
            ("last_check_undo".to_string(), self.last_check_undo.clone()),
        ])
    }
}

/// Field constraint violations, in field declaration order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid field(s): {}", .fields.join(", "))]
pub struct ValidationError {
    pub fields: Vec<&'static str>,
}

impl ValidationError {
    pub fn names(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeserializeError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid enum value for Frequency: {0}")]
    InvalidEnum(String),

    #[error("Invalid timestamp in field: {0}")]
    InvalidTimestamp(&'static str),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

const REQUIRED_KEYS: [&str; 5] = ["item", "frequency", "group", "last_check", "last_check_undo"];

impl Productivity {
    /// Lenient constructor for a never-persisted item (no timestamps needed).
    pub fn new(item: impl Into<String>, frequency: i64, group: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            frequency: Some(frequency),
            group: group.into(),
            ..Self::default()
        }
    }

    pub fn frequency(&self) -> Option<Frequency> {
        self.frequency.and_then(Frequency::from_code)
    }

    /// Display name of the frequency, or `""` (reported) when the code is unknown.
    pub fn frequency_label(&self, reporter: &dyn IntegrityReporter) -> &'static str {
        match self.frequency() {
            Some(f) => f.label(),
            None => {
                reporter.invalid_enum("Frequency", self.frequency);
                ""
            }
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut fields = Vec::new();

        if !text_ok(&self.item, ITEM_MAX_LEN) {
            fields.push("item");
        }
        if self.frequency().is_none() {
            fields.push("frequency");
        }
        if !text_ok(&self.group, GROUP_MAX_LEN) {
            fields.push("group");
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { fields })
        }
    }

    pub fn serialize(&self, reporter: &dyn IntegrityReporter) -> WireRecord {
        WireRecord {
            id: self
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "None".to_string()),
            item: self.item.clone(),
            frequency: self.frequency_label(reporter).to_string(),
            group: self.group.clone(),
            last_check: self.last_check.as_ref().map(time::to_iso).unwrap_or_default(),
            last_check_undo: time::to_iso(&self.last_check_undo),
        }
    }

    /// Canonical deserializer. Check order: missing keys, frequency name,
    /// timestamps, id, field validation.
    pub fn deserialize(fields: &HashMap<String, String>) -> Result<Self, DeserializeError> {
        for key in REQUIRED_KEYS {
            if !fields.contains_key(key) {
                return Err(DeserializeError::MissingField(key));
            }
        }
        let get = |key: &str| fields.get(key).map(String::as_str).unwrap_or_default();

        let frequency = Frequency::from_name(get("frequency"))
            .ok_or_else(|| DeserializeError::InvalidEnum(get("frequency").to_string()))?;

        let last_check = match get("last_check").trim() {
            "" => None,
            raw => Some(
                time::parse_iso(raw).ok_or(DeserializeError::InvalidTimestamp("last_check"))?,
            ),
        };
        let last_check_undo = time::parse_iso(get("last_check_undo"))
            .ok_or(DeserializeError::InvalidTimestamp("last_check_undo"))?;

        let id = match fields.get("id").map(|s| s.trim()) {
            None | Some("") | Some("None") => None,
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| DeserializeError::InvalidId(raw.to_string()))?,
            ),
        };

        let entity = Self {
            id,
            item: get("item").to_string(),
            frequency: Some(frequency.code()),
            group: get("group").to_string(),
            last_check,
            last_check_undo,
        };
        entity.validate()?;

        Ok(entity)
    }

    /// `[<Frequency>-<group>] <item> (<last_check>)`
    pub fn format_display(&self, reporter: &dyn IntegrityReporter) -> String {
        format!(
            "[{}-{}] {} ({})",
            self.frequency_label(reporter),
            self.group,
            self.item,
            self.last_check.as_ref().map(time::to_display).unwrap_or_default()
        )
    }

    /// Create-or-update stamped with the current time.
    pub fn save<R: Repository + ?Sized>(&mut self, repo: &mut R) -> Result<(), RepoError> {
        self.save_at(repo, time::now())
    }

    /// Create-or-update with an explicit `last_check` stamp.
    ///
    /// Insert: `last_check = stamp`, `last_check_undo` untouched.
    /// Update: the current `last_check` shifts into `last_check_undo` first.
    /// Nothing is written (and `self` is unchanged) when validation fails.
    pub fn save_at<R: Repository + ?Sized>(
        &mut self,
        repo: &mut R,
        stamp: NaiveDateTime,
    ) -> Result<(), RepoError> {
        self.validate()?;

        let mut next = self.clone();
        next.last_check = Some(time::truncate_micros(stamp));

        match self.id {
            None => {
                let id = repo.insert(&next)?;
                next.id = Some(id);
            }
            Some(id) => {
                if let Some(prev) = self.last_check {
                    next.last_check_undo = prev;
                }
                repo.update(id, &next)?;
            }
        }

        *self = next;
        Ok(())
    }
}

fn text_ok(value: &str, max: usize) -> bool {
    !value.trim().is_empty() && value.chars().count() <= max
}
