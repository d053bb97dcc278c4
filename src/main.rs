use std::io;
use std::sync::Arc;

use log::{error, info};

use flywheel_gateway::config::GatewayConfig;
use flywheel_gateway::web::server::start_web_server;
use flywheel_gateway::{ExecutionDispatcher, ModelRegistry};

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    info!("Starting flywheel gateway...");

    let config = GatewayConfig::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    // Register the configured models
    let registry = Arc::new(ModelRegistry::new());
    for spec in &config.models {
        registry.register_spec(spec).map_err(|e| {
            error!("Failed to register model {}: {}", spec.name, e);
            io::Error::new(io::ErrorKind::InvalidInput, e)
        })?;
    }
    info!("{} model(s) registered", registry.len());

    let dispatcher = Arc::new(ExecutionDispatcher::new(registry, config.dispatcher.clone()));

    start_web_server(dispatcher, &config.server).await?;

    info!("Flywheel gateway shutdown complete");
    Ok(())
}
