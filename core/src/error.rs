use thiserror::Error;

/// Errors surfaced by the core to the command/UI boundary.
///
/// Data-unavailable states (no blame, no repositories, no trackable editor)
/// are not errors and never show up here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("repository provider failed: {0}")]
    Provider(String),

    #[error("configuration store failed at `{path}`: {message}")]
    Config { path: String, message: String },

    #[error("invalid value at `{path}`: {source}")]
    InvalidValue {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid color `{0}`")]
    InvalidColor(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
