//! Core error types shared by the analyzer crates.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for source map operations
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to read a source file from disk
    #[error("failed to open `{path}`: {source}")]
    FailedToOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A byte position does not belong to any loaded file
    #[error("position {pos} is outside every loaded source file")]
    PositionOutOfRange { pos: usize },

    /// Invalid span range
    #[error("invalid span: lo {lo} > hi {hi}")]
    InvalidSpan { lo: usize, hi: usize },
}

/// Zero-sized token proving that a diagnostic has already been emitted.
///
/// Fallible phase code returns `Result<T, ErrorReported>`; an `Err` means
/// "a diagnostic for this is already in the sink, stop working on this
/// line". It carries no payload on purpose, so it cannot be produced
/// without going through a reporting function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrorReported;

/// Result type alias for phase code
pub type SemResult<T = ()> = Result<T, ErrorReported>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display() {
        let err = SourceError::PositionOutOfRange { pos: 42 };
        assert_eq!(
            format!("{}", err),
            "position 42 is outside every loaded source file"
        );
    }

    #[test]
    fn test_invalid_span_display() {
        let err = SourceError::InvalidSpan { lo: 10, hi: 5 };
        assert!(format!("{}", err).contains("lo 10 > hi 5"));
    }
}
