
use thiserror::Error;
use uuid::Uuid;

use crate::label::LabelTypeKind;

#[derive(Error, Debug)]
pub enum CommitError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Unknown {kind} type '{name}'")]
    UnknownLabelType { kind: LabelTypeKind, name: String },
    #[error("Relation '{type_name}' references span {uuid} which was not persisted in this batch")]
    UnresolvedSpan { uuid: Uuid, type_name: String },
    #[error("Input error: {message}")]
    Input { message: String, line: Option<usize> },
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, CommitError>;

// Helper conversions
impl From<rusqlite::Error> for CommitError {
    fn from(e: rusqlite::Error) -> Self { Self::Persistence(e.to_string()) }
}
impl From<config::ConfigError> for CommitError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
