use bridgebot_server::bridge::LoggingChatSink;
use bridgebot_server::{BridgeHandler, Settings, WebSocketManager};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> bridgebot_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();

    // Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded successfully");

    let manager = Arc::new(WebSocketManager::new(&settings.server));

    // The logging sink stands in for the group chat platform client
    let handler = Arc::new(BridgeHandler::new(
        settings.bridge.clone(),
        Arc::new(LoggingChatSink),
    ));

    let endpoint = manager.start(handler).await?;
    info!("Bridge ready, game servers can connect at {}", endpoint);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    manager.stop(&endpoint, "server shutdown").await?;

    Ok(())
}
