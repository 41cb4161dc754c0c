//! User-facing CLI messages (coloured, with an icon per tone).

use std::fmt;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

#[derive(Debug, Clone, Copy)]
enum Tone {
    Info,
    Success,
    Warning,
    Error,
}

impl Tone {
    fn style(self) -> (&'static str, &'static str) {
        match self {
            Tone::Info => ("\x1b[34m", "ℹ️"),
            Tone::Success => ("\x1b[32m", "✅"),
            Tone::Warning => ("\x1b[33m", "⚠️"),
            Tone::Error => ("\x1b[31m", "❌"),
        }
    }
}

fn render<T: fmt::Display>(tone: Tone, msg: T) -> String {
    let (color, icon) = tone.style();
    format!("{color}{BOLD}{icon} {RESET}{msg}")
}

pub fn info<T: fmt::Display>(msg: T) {
    println!("{}", render(Tone::Info, msg));
}

pub fn success<T: fmt::Display>(msg: T) {
    println!("{}", render(Tone::Success, msg));
}

pub fn warning<T: fmt::Display>(msg: T) {
    println!("{}", render(Tone::Warning, msg));
}

pub fn error<T: fmt::Display>(msg: T) {
    eprintln!("{}", render(Tone::Error, msg));
}
