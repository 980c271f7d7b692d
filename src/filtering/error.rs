use std::time::Duration;

use sea_orm::DbErr;
use thiserror::Error;

/// Errors raised while validating listing parameters, composing the query or
/// executing it against the store.
///
/// Everything except [`QueryError::StoreUnavailable`] and
/// [`QueryError::Timeout`] is a caller error and names the offending field or
/// expression so it can be reported back verbatim.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A parameter value could not be coerced to its declared type or is
    /// outside the declared set of allowed values.
    #[error("invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    /// A parameter name that is not declared for the resource.
    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    /// A JSON filter string that does not follow `<path> <op> <value>`.
    #[error("malformed filter '{predicate}': {reason}")]
    MalformedPredicate { predicate: String, reason: String },

    /// The value stored at `path` cannot be compared with the literal.
    #[error("values at '{path}' are not comparable with a {literal} literal using '{operator}'")]
    UnsupportedPredicateType {
        path: String,
        operator: String,
        literal: &'static str,
    },

    /// A validated value does not fit the type of the column it targets.
    #[error("value '{value}' does not match the type of column '{field}'")]
    TypeMismatch { field: String, value: String },

    /// Restricting to the caller's uploads without a caller identity.
    #[error("'{field}' requires an authenticated caller")]
    IdentityRequired { field: String },

    /// The store failed while executing the query.
    #[error("store unavailable")]
    StoreUnavailable(#[source] DbErr),

    /// The store did not answer within the configured time.
    #[error("query did not complete within {0:?}")]
    Timeout(Duration),
}

impl QueryError {
    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }

    pub(crate) fn malformed(predicate: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPredicate {
            predicate: predicate.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error was caused by the request rather than the store.
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, Self::StoreUnavailable(_) | Self::Timeout(_))
    }
}

impl From<DbErr> for QueryError {
    fn from(err: DbErr) -> Self {
        Self::StoreUnavailable(err)
    }
}
