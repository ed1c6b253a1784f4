use thiserror::Error;

#[derive(Error, Debug)]
pub enum GaribanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("no entry with id '{0}'")]
    Lookup(String),

    #[error("invalid proxy address: {0}")]
    ProxyAddress(#[from] url::ParseError),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, GaribanError>;
