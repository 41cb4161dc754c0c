//! Unified application error type.
//! All modules (db, core, cli, utils) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

use crate::db::repository::RepoError;
use crate::models::productivity::{DeserializeError, ValidationError};

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error(transparent)]
    Deserialize(#[from] DeserializeError),

    // ---------------------------
    // Logic errors
    // ---------------------------
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Record not found: {0}")]
    NotFound(i64),

    #[error("User already exists: {0}")]
    UserExists(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    // ---------------------------
    // Server
    // ---------------------------
    #[error("Server error: {0}")]
    Server(String),
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound(id) => AppError::NotFound(id),
            RepoError::Validation(v) => AppError::Validation(v),
            RepoError::Db(e) => AppError::Db(e),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
