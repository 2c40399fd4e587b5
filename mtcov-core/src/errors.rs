use thiserror::Error;

use crate::models::Strand;

#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("Alignment record references unknown sequence: {0}")]
    UnknownReference(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Can't parse reference index line {line}: {reason}")]
    ReferenceIndexParse { line: usize, reason: String },

    #[error("Reference index contains no sequences: {0}")]
    EmptyReferenceIndex(String),

    #[error("Negative depth on {name} ({strand}) at position {position}")]
    NegativeDepth {
        name: String,
        strand: Strand,
        position: u64,
    },

    #[error("Can't read alignment record: {0}")]
    AlignmentRead(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoverageError>;
