use crate::db::log::{LogRow, load_log};
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use ansi_term::Colour;
use regex::Regex;

const OP_WIDTH_MAX: usize = 60;

fn strip_ansi(re: &Regex, s: &str) -> String {
    re.replace_all(s, "").into_owned()
}

/// ANSI colour per operation
fn color_for_operation(op: &str) -> Colour {
    match op {
        "add" => Colour::Green,
        "del" => Colour::Red,
        "edit" => Colour::Yellow,
        "login" => Colour::Cyan,
        "user_add" => Colour::Blue,
        "migration_applied" => Colour::Purple,
        "init" => Colour::RGB(255, 153, 51),
        _ => Colour::White,
    }
}

fn op_target(row: &LogRow) -> String {
    if row.target.is_empty() {
        row.operation.clone()
    } else {
        format!("{} ({})", row.operation, row.target)
    }
}

/// Paint the operation word, keep the target plain, truncate the visible text.
fn render_op(row: &LogRow, re: &Regex) -> (String, usize) {
    let color = color_for_operation(&row.operation);
    let visible = op_target(row);

    let truncated = if visible.chars().count() > OP_WIDTH_MAX {
        let mut s: String = visible.chars().take(OP_WIDTH_MAX - 3).collect();
        s.push_str("...");
        s
    } else {
        visible
    };

    let painted = match truncated.split_once(' ') {
        Some((op, rest)) => format!("{} {}", color.paint(op), rest),
        None => color.paint(truncated.as_str()).to_string(),
    };

    let width = strip_ansi(re, &painted).chars().count();
    (painted, width)
}

pub struct LogLogic;

impl LogLogic {
    pub fn print_log(pool: &DbPool) -> AppResult<()> {
        let entries = load_log(&pool.conn)?;
        println!("📜 Internal log:\n");

        if entries.is_empty() {
            return Ok(());
        }

        let ansi = Regex::new(r"\x1B\[[0-9;]*[mK]").map_err(|e| {
            crate::errors::AppError::Config(format!("log pattern: {e}"))
        })?;

        let op_w = entries
            .iter()
            .map(|r| op_target(r).chars().count())
            .max()
            .unwrap_or(10)
            .min(OP_WIDTH_MAX);
        let id_w = entries
            .iter()
            .map(|r| r.id.to_string().len())
            .max()
            .unwrap_or(1);

        for row in &entries {
            let date = chrono::DateTime::parse_from_rfc3339(&row.date)
                .map(|dt| dt.format("%FT%T%:z").to_string())
                .unwrap_or_else(|_| row.date.clone());

            let (painted, width) = render_op(row, &ansi);
            let padding = " ".repeat(op_w.saturating_sub(width));

            println!(
                "{:>id_w$}: {} | {}{} => {}",
                row.id,
                date,
                painted,
                padding,
                row.message,
                id_w = id_w
            );
        }

        Ok(())
    }
}
