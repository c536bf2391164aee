pub mod bridge;
pub mod config;
pub mod error;
pub mod websocket;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use bridge::{BridgeHandler, ChatSink, LoggingChatSink};
pub use websocket::{
    ClientConnection, ConnectionRegistry, MessageHandler, WebSocketManager, WebSocketServer,
};
