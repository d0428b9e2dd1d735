use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiDocsError {
    #[error("Invalid endpoint: {0}")]
    InvalidRecord(String),

    #[error("Endpoint already exists: {method} {path}")]
    AlreadyExists { path: String, method: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed version string: '{0}'")]
    MalformedVersionString(String),

    #[error("Version {version} of {path} exists for several methods; pass a method")]
    AmbiguousVersion { path: String, version: String },

    #[error("Invalid deprecation transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ApiDocsError>;
