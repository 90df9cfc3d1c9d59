//! Error types for `rosefiles`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `rosefiles` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from stream or file operations (including truncated input).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== File Corruption Errors ====================
    /// The file does not begin with the expected identifier.
    #[error(
        "file identifier mismatch{}: expected {expected:?}, found {actual:?}",
        .path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default()
    )]
    IdentifierMismatch {
        /// The identifier the format requires.
        expected: String,
        /// The identifier found in the file.
        actual: String,
        /// The file being loaded, when loading from disk.
        path: Option<PathBuf>,
    },

    /// The version field is outside the set accepted by the format.
    #[error("unsupported {format} version: {version}")]
    InvalidVersion {
        /// Short format name (e.g. "ZMS").
        format: &'static str,
        /// The version number found in the file.
        version: u32,
    },

    /// An enumerated tag is outside its known set.
    #[error("invalid {family} tag: {value:#x}")]
    InvalidTag {
        /// The record family the tag belongs to (e.g. "AI condition").
        family: &'static str,
        /// The raw (demasked) tag value.
        value: u32,
    },

    /// The string table type identifier is not recognised.
    #[error("unknown string table type: {0:?}")]
    UnknownTableType(String),

    // ==================== Accessor Errors ====================
    /// A row, column, cell or language index is out of bounds.
    #[error("{what} index {index} out of range (length {len})")]
    IndexOutOfRange {
        /// What was being indexed.
        what: &'static str,
        /// The requested index.
        index: usize,
        /// The length of the indexed collection.
        len: usize,
    },

    /// A column or row with this name already exists.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// No row exists for this key.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    // ==================== Encoding Errors ====================
    /// Encoded text does not fit its fixed width or length prefix.
    #[error("string of {length} bytes exceeds maximum of {max}")]
    StringTooLong {
        /// Encoded length in bytes.
        length: usize,
        /// Maximum number of bytes the field can hold.
        max: usize,
    },

    /// Text contains characters the codepage cannot represent.
    #[error("text cannot be represented in {encoding}")]
    UnmappableText {
        /// Name of the target codepage.
        encoding: &'static str,
    },

    /// A collection is too large for the count field that stores it.
    #[error("too many {what}: {count}")]
    CountOverflow {
        /// What was being counted.
        what: &'static str,
        /// The collection length.
        count: usize,
    },

    /// A stored width, height or count is negative.
    #[error("invalid {what}: {value}")]
    InvalidDimension {
        /// The field that was read.
        what: &'static str,
        /// The stored value.
        value: i32,
    },

    /// A grid or table holds the wrong number of cells for its dimensions.
    #[error("{what} has {actual} cells, expected {expected}")]
    ShapeMismatch {
        /// The grid or row being built.
        what: &'static str,
        /// Cells required by the dimensions.
        expected: usize,
        /// Cells supplied.
        actual: usize,
    },

    // ==================== Tooling Errors ====================
    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The file extension does not name a supported format.
    #[error("unknown file type: {}", .0.display())]
    UnknownFileType(PathBuf),
}

impl Error {
    /// Attach a file path to an identifier mismatch raised while reading a stream.
    #[must_use]
    pub fn with_path(self, file: impl Into<PathBuf>) -> Self {
        match self {
            Error::IdentifierMismatch {
                expected,
                actual,
                path: None,
            } => Error::IdentifierMismatch {
                expected,
                actual,
                path: Some(file.into()),
            },
            other => other,
        }
    }

    /// Returns true for errors caused by malformed file contents.
    pub fn is_corrupt_file(&self) -> bool {
        matches!(
            self,
            Error::IdentifierMismatch { .. }
                | Error::InvalidVersion { .. }
                | Error::InvalidTag { .. }
                | Error::UnknownTableType(_)
                | Error::InvalidDimension { .. }
        )
    }
}

/// A specialized Result type for `rosefiles` operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_mismatch_path() {
        let err = Error::IdentifierMismatch {
            expected: "ZMS0008".to_string(),
            actual: "ZMO0002".to_string(),
            path: None,
        };
        assert_eq!(
            err.to_string(),
            "file identifier mismatch: expected \"ZMS0008\", found \"ZMO0002\""
        );

        let err = err.with_path("3DDATA/AVATAR/HEAD.ZMS");
        assert_eq!(
            err.to_string(),
            "file identifier mismatch in 3DDATA/AVATAR/HEAD.ZMS: expected \"ZMS0008\", found \"ZMO0002\""
        );
        assert!(err.is_corrupt_file());
    }

    #[test]
    fn test_invalid_tag_display() {
        let err = Error::InvalidTag {
            family: "AI condition",
            value: 0x63,
        };
        assert_eq!(err.to_string(), "invalid AI condition tag: 0x63");
    }
}
