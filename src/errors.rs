use thiserror::Error;

use crate::model::TypeKey;

#[derive(Debug, Error)]
pub enum CompilationError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid model file: {0}")]
    ModelFormat(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Duplicate type declaration: {0}")]
    DuplicateType(TypeKey),

    #[error("Type with an empty name in namespace '{namespace}'")]
    EmptyTypeName { namespace: String },
}
