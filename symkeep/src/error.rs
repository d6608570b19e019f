//! Error types for the symkeep library.
//!
//! This module provides the error hierarchy for all operations in the
//! symkeep library, using `thiserror` for ergonomic error handling.
//! Record-scoped errors map onto a [`FailureKind`] that is attached to a
//! record's terminal state in batch reports.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for operations that may fail with a symkeep error.
///
/// # Examples
///
/// ```
/// use symkeep::{Error, Result};
///
/// fn example_operation() -> Result<u32> {
///     Ok(2)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Windows `ERROR_PRIVILEGE_NOT_HELD`, returned when creating a symlink
/// without the create-symbolic-link privilege or developer mode.
const ERROR_PRIVILEGE_NOT_HELD: i32 = 1314;

/// The main error type for the symkeep library.
#[derive(Debug, Error)]
pub enum Error {
    /// A link target could not be mapped onto the current host.
    #[error("path unresolvable: {path} (tried: {})", candidates.join(", "))]
    PathUnresolvable {
        /// The path as recorded.
        path: String,
        /// Every candidate that was attempted, in order.
        candidates: Vec<String>,
    },

    /// No timestamp source could supply the requested values.
    #[error("timestamp unavailable: {details}")]
    TimestampUnavailable {
        /// What was missing.
        details: String,
    },

    /// The OS refused the operation for lack of privilege.
    #[error("permission denied: {}", path.display())]
    PermissionDenied {
        /// The path that could not be modified.
        path: PathBuf,
    },

    /// The current platform cannot perform the operation.
    #[error("unsupported on this platform: {operation}")]
    UnsupportedPlatform {
        /// The operation that is unsupported.
        operation: String,
    },

    /// The destination exists and is not a symbolic link.
    #[error("destination occupied by a non-link entry: {}", path.display())]
    DestinationOccupied {
        /// The occupied destination.
        path: PathBuf,
    },

    /// A created link did not read back with the intended target.
    #[error("verification failed for {}: expected {expected}, found {actual}", path.display())]
    VerificationFailed {
        /// The link that was verified.
        path: PathBuf,
        /// The intended target text.
        expected: String,
        /// The target text read back from the filesystem.
        actual: String,
    },

    /// A record exceeded its processing deadline.
    #[error("timed out after {millis}ms")]
    Timeout {
        /// The configured deadline in milliseconds.
        millis: u64,
    },

    /// A record was written by a newer format than this reader understands.
    #[error("unsupported record format version {found} (newest supported is {supported})")]
    FormatVersionUnsupported {
        /// The version found in the record.
        found: u32,
        /// The newest version this build can read.
        supported: u32,
    },

    /// A record could not be decoded.
    #[error("record corrupt: {details}")]
    RecordCorrupt {
        /// What was wrong with the record.
        details: String,
    },

    /// An invalid filesystem path was provided.
    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath {
        /// The invalid path.
        path: PathBuf,
        /// The reason the path is invalid.
        reason: String,
    },

    /// A path was expected to be a symbolic link but is not.
    #[error("not a symbolic link: {}", path.display())]
    NotASymlink {
        /// The offending path.
        path: PathBuf,
    },

    /// The requested resource was not found.
    #[error("not found: {resource}")]
    NotFound {
        /// The resource that was not found.
        resource: String,
    },

    /// A configuration file could not be parsed.
    #[error("configuration error: {0}")]
    Configuration(#[from] serde_yaml::Error),

    /// The resolved configuration is internally inconsistent.
    #[error("invalid configuration: {details}")]
    InvalidConfiguration {
        /// Details about the inconsistency.
        details: String,
    },

    /// A JSON document could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A validation error occurred.
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },
}

/// Terminal failure classification for a single record.
///
/// These are the kinds surfaced in batch reports as `Failed(kind)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// The target could not be mapped onto this host.
    PathUnresolvable,
    /// No timestamp source was available.
    TimestampUnavailable,
    /// The OS refused link creation for lack of privilege.
    PermissionDenied,
    /// The platform cannot create this kind of link.
    UnsupportedPlatform,
    /// A non-link entry occupies the destination.
    DestinationOccupied,
    /// The created link did not read back as intended.
    VerificationFailed,
    /// The per-record deadline passed.
    Timeout,
    /// The record's format is newer than supported.
    FormatVersionUnsupported,
    /// The record could not be decoded.
    RecordCorrupt,
    /// Any other I/O failure.
    Io,
}

impl FailureKind {
    /// Returns the kebab-case name used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PathUnresolvable => "path-unresolvable",
            Self::TimestampUnavailable => "timestamp-unavailable",
            Self::PermissionDenied => "permission-denied",
            Self::UnsupportedPlatform => "unsupported-platform",
            Self::DestinationOccupied => "destination-occupied",
            Self::VerificationFailed => "verification-failed",
            Self::Timeout => "timeout",
            Self::FormatVersionUnsupported => "format-version-unsupported",
            Self::RecordCorrupt => "record-corrupt",
            Self::Io => "io-error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Classify an I/O error raised while touching `path`.
    ///
    /// Privilege failures become [`Error::PermissionDenied`] and
    /// `Unsupported` becomes [`Error::UnsupportedPlatform`]; anything else
    /// stays an [`Error::Io`].
    ///
    /// # Examples
    ///
    /// ```
    /// use symkeep::Error;
    /// use std::io;
    /// use std::path::Path;
    ///
    /// let err = io::Error::from(io::ErrorKind::PermissionDenied);
    /// assert!(Error::from_io_at(Path::new("/x"), err).is_permission_denied());
    /// ```
    #[must_use]
    pub fn from_io_at(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::PermissionDenied
            || err.raw_os_error() == Some(ERROR_PRIVILEGE_NOT_HELD)
        {
            return Self::PermissionDenied {
                path: path.to_path_buf(),
            };
        }
        if err.kind() == io::ErrorKind::Unsupported {
            return Self::UnsupportedPlatform {
                operation: format!("{err} ({})", path.display()),
            };
        }
        Self::Io(err)
    }

    /// The failure kind a record ends in when this error terminates it.
    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::PathUnresolvable { .. } => FailureKind::PathUnresolvable,
            Self::TimestampUnavailable { .. } => FailureKind::TimestampUnavailable,
            Self::PermissionDenied { .. } => FailureKind::PermissionDenied,
            Self::UnsupportedPlatform { .. } => FailureKind::UnsupportedPlatform,
            Self::DestinationOccupied { .. } => FailureKind::DestinationOccupied,
            Self::VerificationFailed { .. } => FailureKind::VerificationFailed,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::FormatVersionUnsupported { .. } => FailureKind::FormatVersionUnsupported,
            Self::RecordCorrupt { .. } | Self::Json(_) => FailureKind::RecordCorrupt,
            _ => FailureKind::Io,
        }
    }

    /// Check if error is permission-related.
    ///
    /// # Examples
    ///
    /// ```
    /// use symkeep::Error;
    /// use std::path::PathBuf;
    ///
    /// let err = Error::PermissionDenied { path: PathBuf::from("/restricted") };
    /// assert!(err.is_permission_denied());
    /// ```
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// Check if error indicates something does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
