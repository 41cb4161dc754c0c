use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::errors::{AppError, AppResult};
use crate::models::user::{Session, User};
use crate::utils::time;

fn map_user(row: &Row) -> rusqlite::Result<User> {
    let joined: String = row.get("date_joined")?;
    let last_login: Option<String> = row.get("last_login")?;

    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password: row.get("password")?,
        is_active: row.get::<_, i64>("is_active")? == 1,
        date_joined: time::parse_iso(&joined).unwrap_or_else(time::never),
        last_login: last_login.as_deref().and_then(time::parse_iso),
    })
}

pub fn insert_user(conn: &Connection, username: &str, encoded_password: &str) -> AppResult<i64> {
    if find_user(conn, username)?.is_some() {
        return Err(AppError::UserExists(username.to_string()));
    }

    conn.execute(
        "INSERT INTO users (username, password, is_active, date_joined)
         VALUES (?1, ?2, 1, ?3)",
        params![username, encoded_password, time::to_iso(&time::now())],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_user(conn: &Connection, username: &str) -> AppResult<Option<User>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM users WHERE username = ?1")?;
    Ok(stmt.query_row([username], map_user).optional()?)
}

pub fn touch_last_login(conn: &Connection, user_id: i64, at: &NaiveDateTime) -> AppResult<()> {
    conn.execute(
        "UPDATE users SET last_login = ?1 WHERE id = ?2",
        params![time::to_iso(at), user_id],
    )?;
    Ok(())
}

pub fn insert_session(conn: &Connection, session: &Session) -> AppResult<()> {
    conn.execute(
        "INSERT INTO sessions (session_key, user_id, expire_date) VALUES (?1, ?2, ?3)",
        params![
            session.session_key,
            session.user_id,
            time::to_iso(&session.expire_date)
        ],
    )?;
    Ok(())
}

/// Drop expired sessions, returning how many were removed.
pub fn purge_expired_sessions(conn: &Connection, now: &NaiveDateTime) -> AppResult<usize> {
    let removed = conn.execute(
        "DELETE FROM sessions WHERE expire_date <= ?1",
        [time::to_iso(now)],
    )?;
    Ok(removed)
}
