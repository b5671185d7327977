//! Extraction error types
//!
//! These never leave the extractor layer: every extractor converts its
//! error into an UNKNOWN verdict carrying the error text as reason.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("No canonical id available for this product")]
    MissingCanonicalId,

    #[error("No script node contains the sentinel token '{sentinel}'")]
    SentinelMissing { sentinel: String },

    #[error("No serialized data argument follows the sentinel")]
    ArgumentNotFound,

    #[error("Malformed escape sequence at offset {offset}")]
    MalformedEscape { offset: usize },

    #[error("Embedded data failed to decode: {0}")]
    Decode(String),

    #[error("Embedded data has no query list at '{pointer}'")]
    QueriesMissing { pointer: String },

    #[error("No '{query}' record for canonical id {id}")]
    RecordNotFound { query: String, id: String },
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;
