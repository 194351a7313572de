use sqlx;
use thiserror::Error;
use uuid::Uuid;
use warp::reject;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents an SQL error.
    #[error("database error")]
    Sqlx { source: sqlx::Error },

    /// Represents an ID that could not be parsed as a UUID.
    #[error("invalid ID: {0}")]
    InvalidId(String),

    /// Represents a lookup that matched no row.
    #[error("non-existent ID: {0}")]
    NonExistentId(Uuid),

    /// Represents a child record pointing at a reed that does not exist.
    #[error("unknown reed")]
    UnknownReed,

    /// Represents a field value that violates a declared constraint.
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Represents a delete attempted on a component still referenced
    /// by at least one reed.
    #[error("{entity} is still referenced by at least one reed")]
    StillReferenced { entity: &'static str },
}

impl BackendError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        BackendError::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Checks that an optional rating lies in the 1–10 scale. Absent
/// ratings are always valid.
pub fn check_rating(field: &'static str, value: Option<i16>) -> Result<(), BackendError> {
    match value {
        Some(v) if !(1..=10).contains(&v) => Err(BackendError::validation(
            field,
            format!("rating must be between 1 and 10, got {}", v),
        )),
        _ => Ok(()),
    }
}

impl reject::Reject for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_outside_the_scale_are_rejected() {
        assert!(check_rating("tone_quality", Some(0)).is_err());
        assert!(check_rating("tone_quality", Some(11)).is_err());
        assert!(check_rating("tone_quality", Some(1)).is_ok());
        assert!(check_rating("tone_quality", Some(10)).is_ok());
        assert!(check_rating("tone_quality", None).is_ok());
    }

    #[test]
    fn rating_errors_name_the_field() {
        match check_rating("success_rating", Some(42)) {
            Err(BackendError::Validation { field, .. }) => assert_eq!(field, "success_rating"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
