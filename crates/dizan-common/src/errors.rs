use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),

    #[error("missing credential: set {0} in the environment or in .env")]
    MissingCredential(String),

    #[error("credential rejected by the completion service: {0}")]
    CredentialRejected(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DizanError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("server error: {0}")]
    Server(String),

    #[error("{0}")]
    Other(String),
}
