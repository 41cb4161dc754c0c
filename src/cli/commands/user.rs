use crate::cli::parser::{Commands, UserAction};
use crate::config::Config;
use crate::core::auth::AuthLogic;
use crate::db::initialize::init_db;
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::success;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::User {
        action:
            UserAction::Add {
                username,
                password,
                iterations,
            },
    } = cmd
    {
        let pool = DbPool::new(&cfg.database)?;
        init_db(&pool.conn)?;

        let rounds = iterations.unwrap_or(cfg.password_iterations);
        let id = AuthLogic::create_user(&pool.conn, username, password, rounds)?;

        ttlog(&pool.conn, "user_add", username, &format!("User #{id} created"))?;
        success(format!("User '{}' created (id {}).", username, id));
    }

    Ok(())
}
