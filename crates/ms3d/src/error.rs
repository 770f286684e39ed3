use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading, writing or reconciling MS3D models.
///
/// Every variant is fatal for the operation that produced it. Optional
/// extension sections with an unsupported sub-version are not errors; they
/// read back as `None`.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad magic, unsupported version or a missing text header.
    #[error("invalid MS3D data: {0}")]
    InvalidFormat(String),

    /// The stream ended inside a fixed-size record.
    #[error("truncated data while reading {context}")]
    TruncatedData { context: &'static str },

    /// A text line did not hold the expected tokens.
    #[error("malformed text at line {line}: {message}")]
    MalformedText { line: usize, message: String },

    #[error("{kind} index {index} out of range (have {len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: i64,
        len: usize,
    },

    #[error("too many {kind}: {count} exceeds the format limit of {max}")]
    LimitExceeded {
        kind: &'static str,
        count: usize,
        max: usize,
    },

    /// A string cannot be stored in the target field.
    #[error("cannot store {field} {value:?}: {reason}")]
    InvalidString {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("face {face} of object {object:?}: {message}")]
    MalformedFace {
        object: String,
        face: usize,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedText {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn out_of_range(kind: &'static str, index: impl Into<i64>, len: usize) -> Self {
        Self::IndexOutOfRange {
            kind,
            index: index.into(),
            len,
        }
    }
}
