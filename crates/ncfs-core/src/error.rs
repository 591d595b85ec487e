//! Error types for NCFS.
//!
//! Every failure maps onto one [`ErrorKind`] of the namespace taxonomy and
//! onto the errno the filesystem adapter replies with.

use thiserror::Error;

/// Main error type for NCFS operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Path does not resolve to a served entity
    #[error("no such entry: {0}")]
    NotFound(String),

    /// Backing storage refused the requested access
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A file operation was attempted on a directory
    #[error("is a directory: {0}")]
    IsDirectory(String),

    /// A directory operation was attempted on a file
    #[error("not a directory: {0}")]
    NotDirectory(String),

    /// A mutating operation the namespace does not support
    #[error("read-only filesystem: {0} is not supported")]
    ReadOnly(&'static str),

    /// A dispatch branch that well-formed input never reaches
    #[error("internal inconsistency: {0}")]
    Internal(String),

    /// Dataset access failed
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Representation could not be built
    #[error("representation error: {0}")]
    Repr(#[from] ReprError),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Coarse classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    InvalidOperation,
    InternalInconsistency,
    Io,
}

impl Error {
    /// Which taxonomy bucket this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::IsDirectory(_) | Self::NotDirectory(_) | Self::ReadOnly(_) => {
                ErrorKind::InvalidOperation
            }
            Self::Internal(_) => ErrorKind::InternalInconsistency,
            Self::Dataset(e) if e.is_not_found() => ErrorKind::NotFound,
            Self::Dataset(_) | Self::Repr(_) | Self::Io(_) | Self::Config(_) => ErrorKind::Io,
        }
    }

    /// The errno a filesystem adapter should reply with.
    #[must_use]
    pub fn errno(&self) -> libc::c_int {
        match self {
            Self::IsDirectory(_) => libc::EISDIR,
            Self::NotDirectory(_) => libc::ENOTDIR,
            Self::ReadOnly(_) => libc::EROFS,
            _ => match self.kind() {
                ErrorKind::NotFound => libc::ENOENT,
                ErrorKind::PermissionDenied => libc::EACCES,
                ErrorKind::InvalidOperation => libc::EINVAL,
                ErrorKind::InternalInconsistency | ErrorKind::Io => libc::EIO,
            },
        }
    }
}

/// Dataset access errors.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to open dataset {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("variable not found: {0}")]
    VariableNotFound(String),

    #[error("attribute not found: {variable}/{attribute}")]
    AttributeNotFound { variable: String, attribute: String },

    #[error("unsupported type for {name}: {kind}")]
    UnsupportedType { name: String, kind: String },

    #[error("shape {shape:?} does not match {len} elements")]
    ShapeMismatch { shape: Vec<usize>, len: usize },

    #[error("read failed: {0}")]
    Read(String),
}

impl DatasetError {
    /// True for lookups of variables or attributes that do not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::VariableNotFound(_) | Self::AttributeNotFound { .. }
        )
    }
}

/// Representation errors.
#[derive(Error, Debug)]
pub enum ReprError {
    #[error("invalid numeric format {format:?}: {reason}")]
    InvalidFormat { format: String, reason: String },

    #[error("unknown representation: {0}")]
    Unknown(String),
}

/// Result type alias for NCFS operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    // ========== DatasetError Tests ==========

    #[test]
    fn test_dataset_error_variable_not_found_display() {
        let err = DatasetError::VariableNotFound("temp".to_string());
        assert_eq!(err.to_string(), "variable not found: temp");
    }

    #[test]
    fn test_dataset_error_attribute_not_found_display() {
        let err = DatasetError::AttributeNotFound {
            variable: "temp".to_string(),
            attribute: "units".to_string(),
        };
        assert_eq!(err.to_string(), "attribute not found: temp/units");
    }

    #[test]
    fn test_dataset_error_shape_mismatch_display() {
        let err = DatasetError::ShapeMismatch {
            shape: vec![2, 2],
            len: 3,
        };
        assert_eq!(err.to_string(), "shape [2, 2] does not match 3 elements");
    }

    #[test]
    fn test_dataset_error_is_not_found() {
        assert!(DatasetError::VariableNotFound("x".to_string()).is_not_found());
        assert!(
            DatasetError::AttributeNotFound {
                variable: "x".to_string(),
                attribute: "y".to_string(),
            }
            .is_not_found()
        );
        assert!(!DatasetError::Read("disk".to_string()).is_not_found());
    }

    // ========== ReprError Tests ==========

    #[test]
    fn test_repr_error_invalid_format_display() {
        let err = ReprError::InvalidFormat {
            format: "%q".to_string(),
            reason: "unsupported conversion 'q'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid numeric format \"%q\": unsupported conversion 'q'"
        );
    }

    // ========== Error Kind Tests ==========

    #[test]
    fn test_kind_not_found() {
        assert_eq!(
            Error::NotFound("/x".to_string()).kind(),
            ErrorKind::NotFound
        );
        let err: Error = DatasetError::VariableNotFound("x".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_kind_invalid_operation() {
        assert_eq!(
            Error::IsDirectory("/".to_string()).kind(),
            ErrorKind::InvalidOperation
        );
        assert_eq!(
            Error::NotDirectory("/v/DATA_REPR".to_string()).kind(),
            ErrorKind::InvalidOperation
        );
        assert_eq!(Error::ReadOnly("rename").kind(), ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_kind_internal_is_distinct() {
        let err = Error::Internal("unexpected path".to_string());
        assert_eq!(err.kind(), ErrorKind::InternalInconsistency);
        assert_ne!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_kind_dataset_read_is_io() {
        let err: Error = DatasetError::Read("truncated".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    // ========== Errno Tests ==========

    #[test]
    fn test_errno_mapping() {
        assert_eq!(Error::NotFound("/x".to_string()).errno(), libc::ENOENT);
        assert_eq!(
            Error::PermissionDenied("/d.nc".to_string()).errno(),
            libc::EACCES
        );
        assert_eq!(Error::IsDirectory("/".to_string()).errno(), libc::EISDIR);
        assert_eq!(Error::NotDirectory("/v/a".to_string()).errno(), libc::ENOTDIR);
        assert_eq!(Error::ReadOnly("mkdir").errno(), libc::EROFS);
        assert_eq!(Error::Internal("boom".to_string()).errno(), libc::EIO);
    }

    #[test]
    fn test_errno_missing_attribute_is_enoent() {
        let err: Error = DatasetError::AttributeNotFound {
            variable: "v".to_string(),
            attribute: "a".to_string(),
        }
        .into();
        assert_eq!(err.errno(), libc::ENOENT);
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_read_only_display() {
        assert_eq!(
            Error::ReadOnly("rename").to_string(),
            "read-only filesystem: rename is not supported"
        );
    }

    #[test]
    fn test_result_type_alias() {
        fn failing() -> Result<u8> {
            Err(Error::Config("bad".to_string()))
        }
        assert!(failing().is_err());
    }
}
