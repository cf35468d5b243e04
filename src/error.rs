//! Error types for valuegen

use thiserror::Error;

use crate::builder::BuilderError;
use crate::chain::ChainFailure;
use crate::filer::FilerError;
use crate::property::PropertyError;
use crate::types::TypeParseError;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// valuegen errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Declaration parse error: {0}")]
    DeclParse(String),

    #[error("Type parse error: {0}")]
    TypeParse(#[from] TypeParseError),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error(transparent)]
    Builder(#[from] BuilderError),

    #[error(transparent)]
    Chain(#[from] ChainFailure),

    #[error(transparent)]
    Filer(#[from] FilerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_norway::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
