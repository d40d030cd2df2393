//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Deterministic failures only: rejected input and identity misuse. Storage
/// and I/O failures belong to the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A field value was rejected. `field` names the offending input so the
    /// message can be shown next to it.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// An identity was assigned twice.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Whether this error came from rejecting user input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Field that failed validation, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(*field),
            Self::InvalidId(_) | Self::Conflict(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_the_field() {
        let err = DomainError::validation("email", "expected name@domain.tld");
        assert_eq!(err.to_string(), "invalid email: expected name@domain.tld");
        assert!(err.is_validation());
        assert_eq!(err.field(), Some("email"));
    }

    #[test]
    fn other_errors_carry_no_field() {
        let err = DomainError::conflict("identifier already assigned");
        assert!(!err.is_validation());
        assert_eq!(err.field(), None);
    }
}
