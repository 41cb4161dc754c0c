//! productivity main entrypoint.

use productivity::{run, ui::messages};

fn main() {
    if let Err(e) = run() {
        messages::error(e);
        std::process::exit(1);
    }
}
