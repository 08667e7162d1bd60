//! Error types for mmc-io.

use std::path::PathBuf;

use mmc_field::FieldError;

/// Error type for all fallible operations in the mmc-io crate.
///
/// Covers missing files, unreadable files, malformed tslist records, and
/// disagreement between the per-variable files of one tower.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a required file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Wraps an operating-system error while reading a file.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Path being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Returned when a line cannot be parsed.
    #[error("{}:{line}: {reason}", path.display())]
    Parse {
        /// File containing the line.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Description of the problem.
        reason: String,
    },

    /// Returned when the files of one tower disagree in shape or time.
    #[error("inconsistent tower files: {reason}")]
    Inconsistent {
        /// Description of the disagreement.
        reason: String,
    },

    /// Wrapped error from the field crate.
    #[error(transparent)]
    Field(#[from] FieldError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_file_not_found() {
        let err = IoError::FileNotFound {
            path: PathBuf::from("/tmp/T1.d02.UU"),
        };
        assert_eq!(err.to_string(), "file not found: /tmp/T1.d02.UU");
    }

    #[test]
    fn display_parse() {
        let err = IoError::Parse {
            path: PathBuf::from("T1.d02.TH"),
            line: 3,
            reason: "expected 5 values, found 4".into(),
        };
        assert_eq!(err.to_string(), "T1.d02.TH:3: expected 5 values, found 4");
    }

    #[test]
    fn display_inconsistent() {
        let err = IoError::Inconsistent {
            reason: "VV has 10 levels, UU has 12".into(),
        };
        assert_eq!(
            err.to_string(),
            "inconsistent tower files: VV has 10 levels, UU has 12"
        );
    }
}
