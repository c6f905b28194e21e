use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynodError {
    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Result sink error: {0}")]
    Sink(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other: {0}")]
    Other(String),
}

impl From<serde_json::Error> for SynodError {
    fn from(e: serde_json::Error) -> Self {
        SynodError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SynodError>;
