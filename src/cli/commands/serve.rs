use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::http::{self, state::AppState};
use tracing_subscriber::{EnvFilter, fmt};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Serve { bind, port } = cmd {
        let mut cfg = cfg.clone();
        if let Some(b) = bind {
            cfg.bind_address = b.clone();
        }
        if let Some(p) = port {
            cfg.port = *p;
        }

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&cfg.log_filter))
            .map_err(|e| AppError::Config(e.to_string()))?;
        // A subscriber may already be installed when embedded; keep it.
        let _ = fmt().with_env_filter(filter).try_init();

        tracing::info!("Initializing state...");
        let state = AppState::open(cfg)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        runtime.block_on(http::serve(state))?;
    }

    Ok(())
}
