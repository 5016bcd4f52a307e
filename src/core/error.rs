use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinderError {
    /// No usable text generator: missing credential or unknown backend.
    #[error("Suggestions are not configured: {0}")]
    NotConfigured(String),

    #[error("Oops! Something went wrong: {0}")]
    Request(String),

    #[error("Unknown player: {0}")]
    UnknownPlayer(String),

    #[error("Invalid preference: {0}")]
    InvalidPreference(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FinderError {
    pub fn is_not_configured(&self) -> bool {
        matches!(self, FinderError::NotConfigured(_))
    }
}

pub type Result<T> = std::result::Result<T, FinderError>;
