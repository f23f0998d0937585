use std::io;
use thiserror::Error;

/// Main error type for the arithmetic coder library.
#[derive(Error, Debug)]
pub enum CoderError {
    /// The model builder was given an empty sequence.
    #[error("empty input: nothing to encode")]
    EmptyInput,
    /// The frequency total would exceed the 32-bit coder's scaling bound.
    #[error("frequency total {total} exceeds the coder limit of 2^28")]
    TotalOverflow { total: u64 },
    /// The container or bitstream is malformed; `detail` names the field or
    /// stage that failed.
    #[error("corrupt stream: {detail}")]
    CorruptStream { detail: String },
    /// An input path does not exist.
    #[error("input file not found: {0}")]
    MissingFile(String),
    /// Reserved for future container versioning; nothing constructs this
    /// today because the container carries no version field.
    #[error("unsupported container version: {0}")]
    FormatVersion(u8),
    /// An I/O error occurred outside the coding loops.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CoderError {
    /// Shorthand for a `CorruptStream` with a formatted detail message.
    pub fn corrupt(detail: impl Into<String>) -> Self {
        CoderError::CorruptStream {
            detail: detail.into(),
        }
    }
}

/// A specialized `Result` type for coding operations.
pub type Result<T> = std::result::Result<T, CoderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            CoderError::EmptyInput.to_string(),
            "empty input: nothing to encode"
        );

        assert_eq!(
            CoderError::TotalOverflow { total: 1 << 30 }.to_string(),
            "frequency total 1073741824 exceeds the coder limit of 2^28"
        );

        assert_eq!(
            CoderError::corrupt("truncated frequency table").to_string(),
            "corrupt stream: truncated frequency table"
        );

        assert_eq!(
            CoderError::MissingFile("in.txt".to_string()).to_string(),
            "input file not found: in.txt"
        );

        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        assert_eq!(
            CoderError::Io(io_error).to_string(),
            "I/O error: file not found"
        );
    }
}
