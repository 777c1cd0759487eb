use std::path::PathBuf;

/// Engine error type covering the persistence, parsing, and provisioning layers.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config not found: {0}")]
    ConfigNotFound(String),

    #[error("malformed mapping config: {0}")]
    MalformedMapping(String),

    #[error("parse failure: {0}")]
    Parse(String),

    #[error("store provisioning failed at {path}: {message}")]
    Provisioning { path: PathBuf, message: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl EngineError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ConfigNotFound(_))
    }

    pub(crate) fn provisioning(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Provisioning {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
