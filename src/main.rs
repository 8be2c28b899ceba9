use std::sync::Arc;

use action_gateway::{broker::HttpBroker, build_app, config::Config, logging, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    logging::init_logging(config.options.is_debug);

    let broker = Arc::new(HttpBroker::new(config.broker_url.clone()));
    let bind_socket = config.bind_socket()?;
    let state = AppState::new(config.options.clone(), broker);
    let app = build_app(state)?;
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        broker_url = %config.broker_url,
        debug = config.options.is_debug,
        "gateway starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
