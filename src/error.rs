use crate::checker::MissingField;

#[derive(thiserror::Error, Debug)]
pub enum CaseError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("preconditions not met, {} field(s) missing", .0.len())]
    Precondition(Vec<MissingField>),
    #[error("version conflict on case {case_id}: expected {expected}, found {actual}")]
    Conflict {
        case_id: String,
        expected: u32,
        actual: u32,
    },
    #[error("failed to decrypt {field}")]
    Decryption { field: &'static str },
    #[error("case {0} is archived and can no longer be modified")]
    ArchivedCase(String),
    #[error("case {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] sled::Error),
    #[error("codec failure: {0}")]
    Codec(String),
}

pub type Result<T> = std::result::Result<T, CaseError>;
