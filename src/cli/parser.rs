use clap::{Parser, Subcommand};

/// Command-line interface definition for productivity
#[derive(Parser)]
#[command(
    name = "productivity",
    version = env!("CARGO_PKG_VERSION"),
    about = "A small productivity tracker: JSON CRUD API with session login, backed by SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Run the HTTP server
    Serve {
        #[arg(long = "bind", help = "Address to bind (default from config)")]
        bind: Option<String>,

        #[arg(long = "port", short = 'p', help = "Port to listen on (default from config)")]
        port: Option<u16>,
    },

    /// Manage login users
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// List tracked items
    List,

    /// Print or manage the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Create an active user
    Add {
        username: String,

        #[arg(long = "password", help = "Password for the new user")]
        password: String,

        /// PBKDF2 rounds (default from config)
        #[arg(long = "iterations", hide = true)]
        iterations: Option<u32>,
    },
}
