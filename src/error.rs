use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] WebSocketError),

    #[error("Bridge error: {0}")]
    BridgeError(#[from] BridgeError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

// Implement conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

// Implement conversion from url::ParseError (endpoint key derivation)
impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

// Add conversion from std::io::Error
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

// Malformed event payloads surface as bridge errors
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BridgeError(BridgeError::InvalidEvent(err.to_string()))
    }
}

#[derive(Error, Debug)]
pub enum WebSocketError {
    #[error("No server registered for endpoint: {0}")]
    ServerNotFound(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Message sending failed: {0}")]
    SendError(String),
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Invalid event payload: {0}")]
    InvalidEvent(String),

    #[error("Message delivery failed: {0}")]
    DeliveryFailed(String),
}
