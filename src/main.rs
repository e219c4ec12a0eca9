pub mod cli;
pub mod config;
pub mod externals;
pub mod formatting;
pub mod models;
pub mod system;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use config::Config;
use externals::{
    display::{renderers::stdout_renderer, task::task_render_display},
    sensor_endpoints::services::ReadingServiceActual,
};
use models::board::Board;
use system::{run_once, task_poll_readings};
use tokio::{signal, sync::broadcast};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_overrides(&cli);
    config.validate()?;

    init_tracing(&config.log_level)?;

    let base_url = config.base_url()?;
    info!(
        "Polling {} every {} ms.",
        base_url, config.poll_interval_ms
    );
    let service =
        ReadingServiceActual::new(base_url, config.endpoints.clone(), config.request_timeout())?;
    let mut renderer = stdout_renderer(config.output);

    if cli.once {
        return run_once(&service, &mut renderer).await;
    }

    let tracker = TaskTracker::new();
    let token = CancellationToken::new();

    let (tx_display_update, rx_display_update) = broadcast::channel(32);

    let token_clone = token.clone();
    tracker.spawn(async move {
        task_render_display(token_clone, Board::default(), renderer, rx_display_update).await
    });

    let token_clone = token.clone();
    let service = Arc::new(service);
    let period = config.poll_interval();
    tracker.spawn(async move {
        task_poll_readings(token_clone, service, period, tx_display_update).await
    });

    let token_clone = token.clone();

    tokio::select! {
        _ = token_clone.cancelled() => {}
        res = signal::ctrl_c() => {
            match res {
                Ok(_) => {
                    token.cancel();
                },
                Err(e)=>{
                    tracing::error!("Failed to listen for ctrl_c. Error: {}", e);
                    token.cancel();
                }
            };
        },
    }

    tracker.close();
    tracker.wait().await;

    Ok(())
}

/// Logs go to stderr so stdout only carries the dashboard.
/// RUST_LOG wins over the configured level.
fn init_tracing(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .with_context(|| format!("Invalid log level '{}'", default_level))?;

    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
