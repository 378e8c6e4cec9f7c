//! Error types for the topology client

use thiserror::Error;

/// Topology client error
#[derive(Debug, Error)]
pub enum TopologyError {
    /// HTTP request failed before a response was received
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned a non-2xx status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Preference storage could not be read or written
    #[error("Preference storage error: {0}")]
    Preference(String),

    /// Client configuration is unusable
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for TopologyError {
    fn from(err: std::io::Error) -> Self {
        TopologyError::Preference(err.to_string())
    }
}

impl TopologyError {
    /// Whether the error came from talking to a backend (transport or status)
    pub fn is_network(&self) -> bool {
        matches!(self, TopologyError::Network(_) | TopologyError::Server { .. })
    }
}

/// Result type for topology operations
pub type Result<T> = std::result::Result<T, TopologyError>;
