use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::db::repository::{Repository, SqliteRepository};
use crate::errors::AppResult;
use crate::models::productivity::IntegrityReporter;
use crate::ui::messages::{info, warning};
use crate::utils::table::{Column, Table};
use crate::utils::time;

/// Reports integrity problems as CLI warnings.
struct CliReporter;

impl IntegrityReporter for CliReporter {
    fn invalid_enum(&self, enum_name: &str, value: Option<i64>) {
        match value {
            Some(v) => warning(format!("Invalid enum value for {enum_name}: {v}")),
            None => warning(format!("Invalid enum value for {enum_name}")),
        }
    }
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if matches!(cmd, Commands::List) {
        let pool = DbPool::new(&cfg.database)?;
        init_db(&pool.conn)?;
        let repo = SqliteRepository::new(&pool.conn);

        let items = repo.list()?;

        if items.is_empty() {
            info("No items.");
            return Ok(());
        }

        let mut table = Table::new(vec![
            Column::new("ID"),
            Column::new("ITEM"),
            Column::new("UNDO"),
        ]);

        for p in &items {
            let undo = if p.last_check_undo == time::never() {
                "--".to_string()
            } else {
                time::to_display(&p.last_check_undo)
            };

            table.add_row(vec![
                p.id.map(|id| id.to_string()).unwrap_or_default(),
                p.format_display(&CliReporter),
                undo,
            ]);
        }

        print!("{}", table.render());
    }

    Ok(())
}
