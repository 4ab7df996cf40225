mod telemetry;

use std::sync::Arc;

use sv_lodge_backend::error::AppError;
use sv_lodge_backend::front_desk::FrontDesk;
use sv_lodge_backend::{run_server, shutdown_signal};
use sv_lodge_config::get_config;
use telemetry::setup_tracing;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    setup_tracing();

    let config = get_config()?;
    let desk = Arc::new(FrontDesk::from_config(&config)?);
    desk.initialize().await?;
    if desk.pull_from_remote().await {
        info!("local records refreshed from the remote store");
    }

    let listener = TcpListener::bind(config.listen).await?;
    run_server(desk, listener, shutdown_signal()).await
}
