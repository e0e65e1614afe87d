use terranotes_proto::{DecodeError, EncodeError, NoteId};
use thiserror::Error;

/// Field-level rejection from the validation gate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid `{field}`: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self { Self { field: field.into(), reason: reason.into() } }
}

/// Error type for coordinator operations. Every variant surfaces to the
/// caller as a structured response; a failed merge leaves the document
/// exactly as it was.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("bad request: {0}")]
    BadRequest(&'static str),
    #[error("note {0} not found")]
    NotFound(NoteId),
    #[error("merge decode failed: {0}")]
    MergeDecode(#[from] DecodeError),
    #[error("state encoding failed: {0}")]
    Encode(#[from] EncodeError),
}
