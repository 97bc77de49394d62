//! Error types.
//!
//! Validation errors carry the user-facing reason for a rejected edit.
//! Persistence and transfer errors describe failures of the injected
//! key-value store and of the export/import path.

use thiserror::Error;

/// A user-correctable input problem. The operation that produced it left
/// state untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A GPA outside `[0, 4]`.
    #[error("GPA must be between 0.00 and 4.00 (got {0})")]
    GpaOutOfRange(f64),

    /// A credit value outside the allowed bounds.
    #[error("credit must be between {min} and {max} (got {value})")]
    CreditOutOfRange { value: f64, min: f64, max: f64 },

    /// Text that does not parse as a number.
    #[error("{field} must be a number (got \"{input}\")")]
    NotANumber { field: &'static str, input: String },

    /// A required field left blank.
    #[error("{0} is required")]
    EmptyField(&'static str),

    /// A course code already used somewhere in the curriculum.
    #[error("course code \"{0}\" already exists")]
    DuplicateCourse(String),

    /// A semester (or simple-calculator semester name) already present.
    #[error("semester \"{0}\" already exists")]
    DuplicateSemester(String),

    #[error("unknown semester \"{0}\"")]
    UnknownSemester(String),

    #[error("unknown course \"{0}\"")]
    UnknownCourse(String),

    /// Year or semester index out of the supported single-digit range.
    #[error("year and semester must be between 1 and 9 (got year {year}, semester {semester})")]
    SemesterOutOfRange { year: u8, semester: u8 },

    #[error("unknown grade \"{0}\" (expected one of A+, A, A-, B+, B, B-, C+, C, D, F)")]
    UnknownGrade(String),

    /// Structure edits on a built-in department.
    #[error("the curriculum of a built-in department cannot be edited")]
    FixedCurriculum,

    #[error("add at least one semester")]
    NoSemesters,

    #[error("semester \"{0}\" has no courses")]
    EmptySemester(String),
}

/// Failure of the key-value persistence capability.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The underlying storage could not be read or written.
    #[error("storage i/o failed for key \"{key}\": {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The store refused the write because it would exceed its quota.
    #[error("storage quota exceeded writing \"{key}\" ({needed} bytes, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    /// A key the backend cannot address.
    #[error("invalid storage key \"{0}\"")]
    InvalidKey(String),

    #[error("could not encode record: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Failure of an export or import.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Nothing stored under the key yet.
    #[error("no data found to export")]
    NoData,

    /// The imported text is not JSON.
    #[error("invalid file format: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The imported JSON does not have the dataset's shape.
    #[error("file does not contain this calculator's data: {0}")]
    Schema(#[source] serde_json::Error),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_user_facing() {
        assert_eq!(
            ValidationError::DuplicateCourse("CSE-1101".into()).to_string(),
            "course code \"CSE-1101\" already exists"
        );
        assert_eq!(
            ValidationError::CreditOutOfRange {
                value: 12.0,
                min: 0.5,
                max: 10.0
            }
            .to_string(),
            "credit must be between 0.5 and 10 (got 12)"
        );
    }

    #[test]
    fn transfer_wraps_persistence() {
        let err: TransferError = PersistenceError::InvalidKey("../x".into()).into();
        assert!(matches!(err, TransferError::Persistence(_)));
        assert!(err.to_string().contains("invalid storage key"));
    }
}
