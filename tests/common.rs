#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;

use productivity::config::Config;
use productivity::core::auth::AuthLogic;
use productivity::db::initialize::init_db;
use productivity::db::pool::DbPool;
use productivity::http::state::AppState;
use productivity::models::productivity::IntegrityReporter;

/// The binary, pointed at a throwaway home so no real config is read or written.
pub fn prod(home: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("productivity");
    cmd.env("HOME", home).env("APPDATA", home);
    cmd
}

/// Path of a database file inside `dir`.
pub fn db_in(dir: &Path, name: &str) -> String {
    dir.join(format!("{name}.sqlite"))
        .to_string_lossy()
        .to_string()
}

/// Fresh in-memory database with the full schema.
pub fn memory_pool() -> DbPool {
    let pool = DbPool::in_memory().expect("open in-memory db");
    init_db(&pool.conn).expect("init db");
    pool
}

pub fn test_config() -> Config {
    Config {
        database: ":memory:".to_string(),
        password_iterations: 1,
        ..Config::default()
    }
}

/// Server state over an in-memory database holding one user `alice` / `s3cret`.
pub fn state_with(config: Config) -> Arc<AppState> {
    let pool = memory_pool();
    AuthLogic::create_user(&pool.conn, "alice", "s3cret", 1).expect("create user");
    AppState::new(config, pool)
}

pub fn test_state() -> Arc<AppState> {
    state_with(test_config())
}

/// Records every reported integrity problem.
#[derive(Default)]
pub struct RecordingReporter {
    pub seen: RefCell<Vec<(String, Option<i64>)>>,
}

impl IntegrityReporter for RecordingReporter {
    fn invalid_enum(&self, enum_name: &str, value: Option<i64>) {
        self.seen.borrow_mut().push((enum_name.to_string(), value));
    }
}
