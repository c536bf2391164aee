//! WebSocket module for the bridge server
//!
//! This module handles WebSocket connections, frame dispatch,
//! and endpoint lifecycle management.

mod connection;
mod manager;
mod registry;
mod server;

pub use connection::ClientConnection;
pub use manager::WebSocketManager;
pub use registry::ConnectionRegistry;
pub use server::{MessageHandler, WebSocketServer};
