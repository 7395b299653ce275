use thiserror::Error;
use tokio::task::JoinError;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store transport error: {0}")]
    Transport(String),
    #[error("Store error: {0}")]
    Store(String),
    #[error("Index configuration error: {0}")]
    Configuration(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Corpus read error: {0}")]
    Corpus(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

/// HTTP statuses the document store returns while it is overloaded or restarting.
const TRANSIENT_STATUSES: [u16; 4] = [429, 502, 503, 504];

impl AppError {
    /// Whether the failure is a connectivity/transport problem worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Reqwest(err) => {
                err.is_connect()
                    || err.is_timeout()
                    || err
                        .status()
                        .is_some_and(|status| TRANSIENT_STATUSES.contains(&status.as_u16()))
            }
            _ => false,
        }
    }

    pub(crate) fn is_transient_status(status: u16) -> bool {
        TRANSIENT_STATUSES.contains(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_transient() {
        assert!(AppError::Transport("connection reset".into()).is_transient());
        assert!(!AppError::Store("mapper_parsing_exception".into()).is_transient());
        assert!(!AppError::Validation("missing id".into()).is_transient());
        assert!(!AppError::Configuration("not acknowledged".into()).is_transient());
    }

    #[test]
    fn overload_statuses_are_transient() {
        assert!(AppError::is_transient_status(503));
        assert!(AppError::is_transient_status(429));
        assert!(!AppError::is_transient_status(400));
        assert!(!AppError::is_transient_status(404));
    }
}
