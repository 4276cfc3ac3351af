use thiserror::Error;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading/validation error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Assistant endpoint construction error.
    #[error("Endpoint error: {0}")]
    Endpoint(#[from] EndpointError),
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

/// Assistant endpoint setup errors.
///
/// Failures of an individual request are never reported through this type;
/// they are folded into [`crate::AssistantReply`].
#[derive(Debug, Error)]
pub enum EndpointError {
    /// Base URL could not be used to build the `/chat` address.
    #[error("Invalid endpoint URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Errors parsing protocol values.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Invalid author string value.
    #[error("Invalid author: {0}")]
    InvalidAuthor(String),
}
