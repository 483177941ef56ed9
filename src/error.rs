//! Error types for the analytics engine.
//!
//! Fallible operations return `Result<T, AnalyticsError>`. The variants map
//! one-to-one onto the failure classes a request layer has to distinguish:
//! bad input, a contract that is not in the chain, market data that cannot
//! be priced, and an implied volatility that cannot be inverted.
//!
//! The pure numerical routines never produce these errors. Pricing
//! propagates non-finite values and the solver returns `Option`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience type alias for results in this crate.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Errors raised by request validation and data resolution.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum AnalyticsError {
    /// Malformed or out-of-range parameters, rejected before any numeric work.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// No matching contract exists in the supplied option chain.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Spot, time to expiry, or premium needed for the computation is unusable.
    #[error("data unavailable: {message}")]
    Unavailable { message: String },

    /// Implied volatility could not be inverted for the given price.
    #[error("no solution: {message}")]
    NoSolution { message: String },
}

/// Coarse classification of an [`AnalyticsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Unavailable,
    NoSolution,
}

impl AnalyticsError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub(crate) fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub(crate) fn no_solution(message: impl Into<String>) -> Self {
        Self::NoSolution {
            message: message.into(),
        }
    }

    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unavailable { .. } => ErrorKind::Unavailable,
            Self::NoSolution { .. } => ErrorKind::NoSolution,
        }
    }

    /// HTTP-equivalent status class: 400, 404 or 422.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidInput => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Unavailable | ErrorKind::NoSolution => 422,
        }
    }

    /// Human-readable message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput { message }
            | Self::NotFound { message }
            | Self::Unavailable { message }
            | Self::NoSolution { message } => message,
        }
    }

    /// Structured error object for the presentation layer.
    ///
    /// `location` names the operation that failed (e.g. `"scenario"`).
    pub fn to_body(&self, location: &'static str) -> ErrorBody {
        ErrorBody {
            error: self.message().to_string(),
            kind: self.kind(),
            status: self.status_code(),
            location: location.to_string(),
        }
    }
}

/// Serializable error payload returned to callers instead of a bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorKind,
    pub status: u16,
    #[serde(rename = "where")]
    pub location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_message_accessible() {
        let err = AnalyticsError::invalid("strike must be positive");
        match &err {
            AnalyticsError::InvalidInput { message } => {
                assert!(message.contains("positive"));
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn status_codes_follow_kind() {
        assert_eq!(AnalyticsError::invalid("x").status_code(), 400);
        assert_eq!(AnalyticsError::not_found("x").status_code(), 404);
        assert_eq!(AnalyticsError::unavailable("x").status_code(), 422);
        assert_eq!(AnalyticsError::no_solution("x").status_code(), 422);
    }

    #[test]
    fn error_display_includes_message() {
        let err = AnalyticsError::not_found("No call contract found at 105");
        assert!(format!("{err}").contains("No call contract found at 105"));

        let err2 = AnalyticsError::unavailable("spot");
        assert!(format!("{err2}").starts_with("data unavailable"));
    }

    #[test]
    fn body_carries_location_and_kind() {
        let body = AnalyticsError::unavailable("Selected price source \"bid\" is unavailable")
            .to_body("single");
        assert_eq!(body.kind, ErrorKind::Unavailable);
        assert_eq!(body.status, 422);
        assert_eq!(body.location, "single");

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["where"], "single");
        assert_eq!(json["kind"], "unavailable");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AnalyticsError>();
    }
}
