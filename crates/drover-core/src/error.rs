// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for drover-core.
//!
//! Provides a closed error enum with stable error codes. The core never maps
//! errors to transport status codes; the request layer owns that mapping.

use std::fmt;

/// Result type using JobsError
pub type Result<T> = std::result::Result<T, JobsError>;

/// Errors that can occur during job orchestration operations.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum JobsError {
    /// A job, recovery record, or resubmit payload was not found.
    NotFound {
        /// The entity kind ("job", "recovery", "resubmit", "share").
        entity: &'static str,
        /// The identifier that was not found.
        id: String,
    },

    /// The state machine rejected a status transition.
    IllegalTransition {
        /// The job whose transition was rejected.
        job_uuid: String,
        /// Current persisted status.
        from: String,
        /// Requested target status.
        to: String,
    },

    /// An optimistic row-count check failed (a concurrent writer won).
    ConcurrentUpdate {
        /// The entity kind ("job", "recovery").
        entity: &'static str,
        /// The row that was concurrently modified.
        id: String,
    },

    /// A required job field was missing or blank at creation.
    Validation {
        /// The field that failed validation.
        field: String,
        /// The validation error message.
        message: String,
    },

    /// A search attribute does not resolve to a known column.
    InvalidColumn {
        /// The attribute name as supplied by the caller.
        attribute: String,
    },

    /// A search operator is not allowed for the column's SQL type.
    UnsupportedOperator {
        /// The operator text.
        op: String,
        /// The column the operator was applied to.
        column: String,
    },

    /// A search value could not be parsed for the column's semantic type.
    InvalidValue {
        /// The column the value was supplied for.
        column: String,
        /// The offending value text.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A blocked job could not be bound to a valid recovery record.
    ///
    /// Fatal for the operation: a blocked job with no recovery id can never
    /// be found again by the recovery scheduler.
    CorruptRecoveryState {
        /// The tenant the recovery record belongs to.
        tenant: String,
        /// The tester hash that failed to yield a valid id.
        tester_hash: String,
    },

    /// Database operation failed.
    Store {
        /// The operation that failed.
        operation: String,
        /// Error details.
        details: String,
    },
}

impl JobsError {
    /// Get the stable error code string for this error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            Self::ConcurrentUpdate { .. } => "CONCURRENT_UPDATE",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::InvalidColumn { .. } => "INVALID_COLUMN",
            Self::UnsupportedOperator { .. } => "UNSUPPORTED_OPERATOR",
            Self::InvalidValue { .. } => "INVALID_VALUE",
            Self::CorruptRecoveryState { .. } => "CORRUPT_RECOVERY_STATE",
            Self::Store { .. } => "STORE_ERROR",
        }
    }

    /// Whether the caller can reasonably retry or correct the request.
    ///
    /// Store errors and corrupt recovery state are not caller-recoverable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Store { .. } | Self::CorruptRecoveryState { .. })
    }
}

impl fmt::Display for JobsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { entity, id } => {
                write!(f, "{} '{}' not found", entity, id)
            }
            Self::IllegalTransition { job_uuid, from, to } => {
                write!(
                    f,
                    "Illegal status transition for job '{}': {} -> {}",
                    job_uuid, from, to
                )
            }
            Self::ConcurrentUpdate { entity, id } => {
                write!(f, "{} '{}' was modified by a concurrent writer", entity, id)
            }
            Self::Validation { field, message } => {
                write!(f, "Validation error for '{}': {}", field, message)
            }
            Self::InvalidColumn { attribute } => {
                write!(f, "Unknown search attribute '{}'", attribute)
            }
            Self::UnsupportedOperator { op, column } => {
                write!(
                    f,
                    "Operator '{}' is not supported on column '{}'",
                    op, column
                )
            }
            Self::InvalidValue {
                column,
                value,
                reason,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for column '{}': {}",
                    value, column, reason
                )
            }
            Self::CorruptRecoveryState {
                tenant,
                tester_hash,
            } => {
                write!(
                    f,
                    "Recovery record for tenant '{}' hash '{}' has no valid id",
                    tenant, tester_hash
                )
            }
            Self::Store { operation, details } => {
                write!(f, "Store error during '{}': {}", operation, details)
            }
        }
    }
}

impl std::error::Error for JobsError {}

impl From<sqlx::Error> for JobsError {
    fn from(err: sqlx::Error) -> Self {
        JobsError::Store {
            operation: "query".to_string(),
            details: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for JobsError {
    fn from(err: serde_json::Error) -> Self {
        JobsError::Store {
            operation: "json".to_string(),
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let cases = vec![
            (
                JobsError::NotFound {
                    entity: "job",
                    id: "abc".to_string(),
                },
                "NOT_FOUND",
            ),
            (
                JobsError::IllegalTransition {
                    job_uuid: "abc".to_string(),
                    from: "FINISHED".to_string(),
                    to: "RUNNING".to_string(),
                },
                "ILLEGAL_TRANSITION",
            ),
            (
                JobsError::ConcurrentUpdate {
                    entity: "job",
                    id: "abc".to_string(),
                },
                "CONCURRENT_UPDATE",
            ),
            (
                JobsError::Validation {
                    field: "owner".to_string(),
                    message: "must not be blank".to_string(),
                },
                "VALIDATION_ERROR",
            ),
            (
                JobsError::InvalidColumn {
                    attribute: "bogus".to_string(),
                },
                "INVALID_COLUMN",
            ),
            (
                JobsError::UnsupportedOperator {
                    op: "LIKE".to_string(),
                    column: "node_count".to_string(),
                },
                "UNSUPPORTED_OPERATOR",
            ),
            (
                JobsError::InvalidValue {
                    column: "created".to_string(),
                    value: "not-a-date".to_string(),
                    reason: "unparseable timestamp".to_string(),
                },
                "INVALID_VALUE",
            ),
            (
                JobsError::CorruptRecoveryState {
                    tenant: "dev".to_string(),
                    tester_hash: "deadbeef".to_string(),
                },
                "CORRUPT_RECOVERY_STATE",
            ),
            (
                JobsError::Store {
                    operation: "insert".to_string(),
                    details: "connection refused".to_string(),
                },
                "STORE_ERROR",
            ),
        ];

        for (error, expected_code) in cases {
            assert_eq!(
                error.error_code(),
                expected_code,
                "Error {:?} should have code {}",
                error,
                expected_code
            );
            assert!(!error.to_string().is_empty());
        }
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(
            JobsError::IllegalTransition {
                job_uuid: "x".to_string(),
                from: "PENDING".to_string(),
                to: "FINISHED".to_string(),
            }
            .is_recoverable()
        );
        assert!(
            JobsError::Validation {
                field: "name".to_string(),
                message: "blank".to_string(),
            }
            .is_recoverable()
        );
        assert!(
            !JobsError::Store {
                operation: "commit".to_string(),
                details: "io".to_string(),
            }
            .is_recoverable()
        );
        assert!(
            !JobsError::CorruptRecoveryState {
                tenant: "dev".to_string(),
                tester_hash: "00".to_string(),
            }
            .is_recoverable()
        );
    }

    #[test]
    fn test_display_messages() {
        let err = JobsError::NotFound {
            entity: "job",
            id: "abc-123".to_string(),
        };
        assert_eq!(err.to_string(), "job 'abc-123' not found");

        let err = JobsError::IllegalTransition {
            job_uuid: "abc-123".to_string(),
            from: "FINISHED".to_string(),
            to: "RUNNING".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Illegal status transition for job 'abc-123': FINISHED -> RUNNING"
        );

        let err = JobsError::ConcurrentUpdate {
            entity: "job",
            id: "abc-123".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "job 'abc-123' was modified by a concurrent writer"
        );

        let err = JobsError::UnsupportedOperator {
            op: "BETWEEN".to_string(),
            column: "visible".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Operator 'BETWEEN' is not supported on column 'visible'"
        );
    }
}
