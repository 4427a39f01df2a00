use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScripterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Required input missing; raised before any network call
    #[error("{0}")]
    Validation(String),

    /// Transport failure or a response that does not have the requested shape
    #[error("{0}")]
    Service(String),

    #[error("AI did not generate any scenes.")]
    EmptyResult,

    #[error("Video generation finished but no download link was provided.")]
    MissingResult,

    #[error("Failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Credential(String),
}

pub type Result<T> = std::result::Result<T, ScripterError>;
