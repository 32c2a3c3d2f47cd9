use thiserror::Error;

/// Event fixture error types
///
/// Declaring fixtures never fails; every variant here surfaces from the build
/// phase or from loading configuration.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Pipeline error: {message}")]
    Pipeline { message: String },

    #[error("Stack repository error: {message}")]
    Repository { message: String },

    #[error("Stack reconciliation failed: {message}")]
    Reconciliation { message: String },

    #[error("Event has no tenant/project scope after replay")]
    MissingScope,
}

impl Error {
    pub fn pipeline(message: impl Into<String>) -> Self {
        Self::Pipeline {
            message: message.into(),
        }
    }

    pub fn repository(message: impl Into<String>) -> Self {
        Self::Repository {
            message: message.into(),
        }
    }

    pub fn reconciliation(message: impl Into<String>) -> Self {
        Self::Reconciliation {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
