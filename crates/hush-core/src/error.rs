use thiserror::Error;

/// Top-level error type for hush.
#[derive(Debug, Error)]
pub enum HushError {
    /// Error from the messaging connection (transport, bridge, webhook).
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// The authorization store could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A command handler failed internally.
    #[error("handler error: {0}")]
    Handler(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
