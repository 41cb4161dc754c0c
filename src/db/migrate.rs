use crate::db::log::ttlog;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{success, warning};
use rusqlite::{Connection, OptionalExtension, Result};

/// Ensure that the `log` table exists with the modern schema.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")?;
    let exists: Option<String> = stmt.query_row([table], |row| row.get(0)).optional()?;
    Ok(exists.is_some())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info('{table}')"))?;
    let cols = stmt.query_map([], |row| row.get::<_, String>(1))?;

    for c in cols {
        if c? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Create the `productivity` table with the modern schema.
fn create_productivity_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS productivity (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            item            TEXT NOT NULL,
            frequency       INTEGER NOT NULL,
            "group"         TEXT NOT NULL,
            last_check      TEXT NOT NULL,
            last_check_undo TEXT NOT NULL DEFAULT '0001-01-01T00:00:00'
        );

        CREATE INDEX IF NOT EXISTS idx_productivity_group ON productivity("group");
        "#,
    )?;
    Ok(())
}

/// Tables created before the undo snapshot existed lack `last_check_undo`.
fn migrate_add_last_check_undo(conn: &Connection) -> Result<bool> {
    if table_has_column(conn, "productivity", "last_check_undo")? {
        return Ok(false);
    }

    warning("Adding 'last_check_undo' column to productivity table...");

    conn.execute_batch(
        r#"
        ALTER TABLE productivity
            ADD COLUMN last_check_undo TEXT NOT NULL DEFAULT '0001-01-01T00:00:00';
        "#,
    )?;

    success("'last_check_undo' column added.");
    Ok(true)
}

fn create_auth_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            is_active   INTEGER NOT NULL DEFAULT 1,
            date_joined TEXT NOT NULL,
            last_login  TEXT
        );

        CREATE TABLE IF NOT EXISTS sessions (
            session_key TEXT PRIMARY KEY,
            user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            expire_date TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_expire_date ON sessions(expire_date);
        "#,
    )?;
    Ok(())
}

/// Bring the schema up to date. Every step is idempotent.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<()> {
    // 1) Ensure log table
    ensure_log_table(conn).map_err(|e| AppError::Migration(e.to_string()))?;

    // 2) Productivity table, or upgrade of a legacy one
    if table_exists(conn, "productivity")? {
        if migrate_add_last_check_undo(conn)? {
            ttlog(
                conn,
                "migration_applied",
                "productivity",
                "Added last_check_undo column",
            )?;
        }
    } else {
        create_productivity_table(conn).map_err(|e| AppError::Migration(e.to_string()))?;
    }

    // 3) Users and sessions
    create_auth_tables(conn).map_err(|e| AppError::Migration(e.to_string()))?;

    Ok(())
}
