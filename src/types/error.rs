//! Error types for the transaction gateway
//!
//! This module defines all error types that can occur while serving the API.
//! Every variant maps to an HTTP status code and renders as a JSON body, so
//! no error ever reaches a client as raw text.
//!
//! # Error Categories
//!
//! - **Domain Errors**: validation, duplicate id, unknown id, invalid transition, busy
//! - **Transport Errors**: malformed requests, oversized bodies, unknown routes, timeouts
//! - **Internal Errors**: I/O failures and anything unexpected

use thiserror::Error;

use super::transaction::TransactionStatus;

/// Main error type for the transaction gateway
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// Create payload or id failed validation
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Description of the problem
        message: String,
    },

    /// A record already exists for the id
    ///
    /// Creation is keyed purely on id, so this is returned regardless of
    /// whether the payload matches the existing record.
    #[error("Transaction {id} already exists")]
    Conflict {
        /// Duplicated transaction id
        id: String,
    },

    /// No record exists for the id
    #[error("Transaction {id} not found")]
    NotFound {
        /// Unknown transaction id
        id: String,
    },

    /// Attempt to change the status of a terminal record
    #[error("Transaction {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: TransactionStatus,
        to: TransactionStatus,
    },

    /// Too many transactions are in progress
    #[error("Busy: {in_progress} transactions already in progress")]
    Busy {
        /// Number of transactions in progress when the request was refused
        in_progress: usize,
    },

    /// The HTTP request could not be parsed
    #[error("Malformed request: {message}")]
    MalformedRequest { message: String },

    /// Request body exceeds the configured limit
    #[error("Request body exceeds limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// No route matches the request path
    #[error("No resource at {path}")]
    RouteNotFound { path: String },

    /// The route exists but not for this method
    #[error("Method {method} not allowed for {path}")]
    MethodNotAllowed {
        method: String,
        path: String,
        /// Methods the route does accept
        allowed: Vec<String>,
    },

    /// The request was not answered in time
    #[error("gateway unavailable")]
    Timeout,

    /// I/O error on the connection or listener
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Unexpected internal failure
    #[error("internal server error: {message}")]
    Internal { message: String },
}

impl From<std::io::Error> for GatewayError {
    fn from(error: std::io::Error) -> Self {
        GatewayError::Io {
            message: error.to_string(),
        }
    }
}

// Body parse failures are the caller's fault, so they surface as validation errors
impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        GatewayError::Validation {
            field: "body".to_string(),
            message: error.to_string(),
        }
    }
}

impl GatewayError {
    /// HTTP status code the error maps to
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Validation { .. } => 400,
            GatewayError::MalformedRequest { .. } => 400,
            GatewayError::NotFound { .. } => 404,
            GatewayError::RouteNotFound { .. } => 404,
            GatewayError::MethodNotAllowed { .. } => 405,
            GatewayError::InvalidTransition { .. } => 409,
            GatewayError::Busy { .. } => 409,
            GatewayError::PayloadTooLarge { .. } => 413,
            GatewayError::Conflict { .. } => 422,
            GatewayError::Io { .. } => 500,
            GatewayError::Internal { .. } => 500,
            GatewayError::Timeout => 503,
        }
    }

    /// JSON body sent to the client
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }

    /// Create a Validation error for an unknown transaction type
    pub fn invalid_transaction_type(tx_type: &str) -> Self {
        GatewayError::Validation {
            field: "type".to_string(),
            message: format!("unknown transaction type '{}'", tx_type),
        }
    }

    /// Create a Validation error for a non-positive amount
    pub fn invalid_amount(amount: i64) -> Self {
        GatewayError::Validation {
            field: "amount".to_string(),
            message: format!("amount must be positive, got {}", amount),
        }
    }

    /// Create a Validation error for a malformed id
    pub fn invalid_id(id: &str, reason: &str) -> Self {
        GatewayError::Validation {
            field: "id".to_string(),
            message: format!("'{}' {}", id, reason),
        }
    }

    /// Create a Conflict error
    pub fn conflict(id: &str) -> Self {
        GatewayError::Conflict { id: id.to_string() }
    }

    /// Create a NotFound error
    pub fn not_found(id: &str) -> Self {
        GatewayError::NotFound { id: id.to_string() }
    }

    /// Create an InvalidTransition error
    pub fn invalid_transition(id: &str, from: TransactionStatus, to: TransactionStatus) -> Self {
        GatewayError::InvalidTransition {
            id: id.to_string(),
            from,
            to,
        }
    }

    /// Create a MalformedRequest error
    pub fn malformed(message: impl Into<String>) -> Self {
        GatewayError::MalformedRequest {
            message: message.into(),
        }
    }

    /// Create a RouteNotFound error
    pub fn route_not_found(path: &str) -> Self {
        GatewayError::RouteNotFound {
            path: path.to_string(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        GatewayError::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::conflict(GatewayError::conflict("abc"), "Transaction abc already exists")]
    #[case::not_found(GatewayError::not_found("abc"), "Transaction abc not found")]
    #[case::invalid_amount(
        GatewayError::invalid_amount(-5),
        "Invalid amount: amount must be positive, got -5"
    )]
    #[case::invalid_type(
        GatewayError::invalid_transaction_type("swipe"),
        "Invalid type: unknown transaction type 'swipe'"
    )]
    #[case::transition(
        GatewayError::invalid_transition("abc", TransactionStatus::Approved, TransactionStatus::Declined),
        "Transaction abc cannot move from approved to declined"
    )]
    #[case::busy(GatewayError::Busy { in_progress: 1 }, "Busy: 1 transactions already in progress")]
    #[case::timeout(GatewayError::Timeout, "gateway unavailable")]
    #[case::too_large(
        GatewayError::PayloadTooLarge { limit: 65536 },
        "Request body exceeds limit of 65536 bytes"
    )]
    fn test_error_display(#[case] error: GatewayError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::validation(GatewayError::invalid_amount(0), 400)]
    #[case::malformed(GatewayError::malformed("unreadable body"), 400)]
    #[case::not_found(GatewayError::not_found("x"), 404)]
    #[case::route_not_found(GatewayError::route_not_found("/missing.json"), 404)]
    #[case::busy(GatewayError::Busy { in_progress: 1 }, 409)]
    #[case::too_large(GatewayError::PayloadTooLarge { limit: 5 }, 413)]
    #[case::conflict(GatewayError::conflict("x"), 422)]
    #[case::internal(GatewayError::internal("boom"), 500)]
    #[case::timeout(GatewayError::Timeout, 503)]
    fn test_status_codes(#[case] error: GatewayError, #[case] expected: u16) {
        assert_eq!(error.status_code(), expected);
    }

    #[test]
    fn test_json_body_carries_message() {
        let body = GatewayError::not_found("abc").to_json();
        assert_eq!(body["error"], "Transaction abc not found");
    }

    #[test]
    fn test_serde_error_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: GatewayError = err.into();
        assert!(matches!(error, GatewayError::Validation { ref field, .. } if field == "body"));
        assert_eq!(error.status_code(), 400);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let error: GatewayError = io_error.into();
        assert_eq!(error.to_string(), "I/O error: reset");
    }
}
