use thiserror::Error;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading/validation error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Remote service request error.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Internal protocol type error.
    #[error("Proto error: {0}")]
    Proto(#[from] ProtoError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field was not provided.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A field has an invalid value and reason.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Filesystem read error.
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(String),
}

/// Remote service errors, mapped from HTTP outcomes by the gateway.
///
/// The gateway never retries or swallows these; compensation (e.g. rollback
/// of an optimistic message) is the send protocol's job alone.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: no response reached the client.
    #[error("Network error: {0}")]
    Network(String),

    /// The server responded with a non-2xx status.
    #[error("Server error {status}: {detail}")]
    Server { status: u16, detail: String },

    /// The target id is unknown to the server (404 on fetch/delete/send).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server rejected the input (e.g. empty message content).
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The request lacked a valid credential (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

/// Internal proto errors
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Invalid role string value.
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    /// Generic serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
