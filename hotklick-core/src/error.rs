//! Error types for the core

use thiserror::Error;

use crate::model::RegionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegionError {
    #[error("region {0} not found")]
    NotFound(RegionId),
    /// Every label from A1 to Z9 is taken
    #[error("no labels left after {last}")]
    LabelSpaceExhausted { last: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuizError {
    /// No region carries the content the chosen mode asks for
    #[error("no regions have {0} content")]
    EmptyCandidateSet(&'static str),
    #[error("a quiz needs at least one task")]
    InvalidTaskCount,
    #[error("no quiz session is running")]
    NoActiveSession,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage data is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("record {0} not found in storage")]
    NotFound(RegionId),
    #[error("storage error: {0}")]
    Other(String),
}
