use std::sync::LazyLock;

use chrono::Duration;
use regex::Regex;
use rusqlite::Connection;

use crate::core::password::{self, random_lowercase_token, random_token};
use crate::db::users::{find_user, insert_session, insert_user, touch_last_login};
use crate::errors::{AppError, AppResult};
use crate::models::user::{Session, User};
use crate::utils::time;

pub const CSRF_TOKEN_LEN: usize = 64;
pub const SESSION_KEY_LEN: usize = 32;
const USERNAME_MAX_LEN: usize = 150;

static USERNAME_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9.@+_-]+$"));

/// Credential checks, session creation and CSRF token issuance.
pub struct AuthLogic;

impl AuthLogic {
    /// ASCII letters, digits and `@ . + - _`, at most 150 characters.
    pub fn validate_username(username: &str) -> AppResult<()> {
        let re = USERNAME_RE
            .as_ref()
            .map_err(|e| AppError::Config(e.to_string()))?;

        if username.chars().count() > USERNAME_MAX_LEN || !re.is_match(username) {
            return Err(AppError::InvalidUsername(username.to_string()));
        }
        Ok(())
    }

    pub fn create_user(
        conn: &Connection,
        username: &str,
        raw_password: &str,
        iterations: u32,
    ) -> AppResult<i64> {
        Self::validate_username(username)?;

        let encoded = password::hash_password(raw_password, iterations);

        insert_user(conn, username, &encoded)
    }

    /// The matching active user, or `None` for unknown/inactive users and bad passwords.
    pub fn authenticate(
        conn: &Connection,
        username: &str,
        raw_password: &str,
        iterations: u32,
    ) -> AppResult<Option<User>> {
        let user = find_user(conn, username)?;
        Ok(Self::check_credentials(user, raw_password, iterations))
    }

    /// Hash a login attempt is verified against. Unknown users get a decoy
    /// with `iterations` rounds so every attempt runs one full PBKDF2.
    pub fn credential_hash(user: Option<&User>, iterations: u32) -> String {
        match user {
            Some(u) => u.password.clone(),
            None => password::decoy_hash(iterations),
        }
    }

    /// Keep `user` only when `raw_password` matches its hash and it is active.
    pub fn check_credentials(
        user: Option<User>,
        raw_password: &str,
        iterations: u32,
    ) -> Option<User> {
        let encoded = Self::credential_hash(user.as_ref(), iterations);
        let matches = password::verify_password(raw_password, &encoded);
        user.filter(|u| matches && u.is_active)
    }

    /// Open a session for `user` lasting `session_age` seconds.
    pub fn login(conn: &Connection, user: &User, session_age: i64) -> AppResult<Session> {
        let now = time::now();
        let session = Session {
            session_key: random_lowercase_token(SESSION_KEY_LEN),
            user_id: user.id,
            expire_date: now + Duration::seconds(session_age),
        };

        insert_session(conn, &session)?;
        touch_last_login(conn, user.id, &now)?;

        Ok(session)
    }

    pub fn is_well_formed_csrf(token: &str) -> bool {
        token.len() == CSRF_TOKEN_LEN && token.chars().all(|c| c.is_ascii_alphanumeric())
    }

    /// Keep the caller's token when it is well formed, otherwise issue a new one.
    pub fn csrf_token(existing: Option<&str>) -> String {
        match existing {
            Some(t) if Self::is_well_formed_csrf(t) => t.to_string(),
            _ => random_token(CSRF_TOKEN_LEN),
        }
    }

    /// Fresh token, issued on login.
    pub fn rotate_csrf_token() -> String {
        random_token(CSRF_TOKEN_LEN)
    }
}
