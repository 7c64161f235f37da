//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so that contained per-campaign
//! failures and page-level failures can be told apart in logs and in the API.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - LEDGER_xxx / REMOTE_xxx: ledger access errors
//! - CAMPAIGN_xxx: per-campaign resolution errors
//! - API_xxx: API errors
//! - CFG_xxx: Configuration errors

use std::fmt;
use std::sync::Arc;

/// Application-wide error type
///
/// Cloneable because node results are shared between every reader of an
/// in-flight computation.
#[derive(Debug, Clone)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl PartialEq for AppError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.message == other.message
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // ============================================
    // Ledger Errors (1xx)
    // ============================================
    /// No usable ledger connection
    ClientUnavailable,
    /// Network/RPC error on a specific remote read
    RemoteReadFailure,
    /// Ledger returned a payload we could not decode
    RemoteInvalidResponse,

    // ============================================
    // Campaign Errors (2xx)
    // ============================================
    /// Inputs resolved but the normalizer rejected them
    NormalizationFailure,
    /// Malformed or empty address supplied by caller
    InvalidAddress,
    /// Name-service label does not resolve to a contract
    NameNotFound,

    // ============================================
    // API Errors (3xx)
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Rate limit exceeded
    ApiRateLimited,
    /// Internal server error
    ApiInternalError,
    /// Resource not found
    ApiNotFound,

    // ============================================
    // Configuration Errors (4xx)
    // ============================================
    /// Missing environment variable
    ConfigMissingEnv,
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // Generic Errors (9xx)
    // ============================================
    /// Unexpected programming error (type mismatch, panicked task)
    Internal,
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientUnavailable => "CLIENT_UNAVAILABLE",
            Self::RemoteReadFailure => "REMOTE_READ_FAILURE",
            Self::RemoteInvalidResponse => "REMOTE_INVALID_RESPONSE",

            Self::NormalizationFailure => "NORMALIZATION_FAILURE",
            Self::InvalidAddress => "INVALID_ADDRESS",
            Self::NameNotFound => "NAME_NOT_FOUND",

            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiRateLimited => "API_RATE_LIMITED",
            Self::ApiInternalError => "API_INTERNAL_ERROR",
            Self::ApiNotFound => "API_NOT_FOUND",

            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest | Self::InvalidAddress | Self::ConfigInvalidValue => 400,
            Self::ApiNotFound | Self::NameNotFound | Self::NormalizationFailure => 404,
            Self::ApiRateLimited => 429,
            Self::ClientUnavailable | Self::RemoteReadFailure | Self::RemoteInvalidResponse => 502,
            _ => 500,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ClientUnavailable | Self::RemoteReadFailure | Self::ApiRateLimited
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// No ledger client configured or connected
    pub fn client_unavailable() -> Self {
        Self::new(ErrorCode::ClientUnavailable, "Failed to get ledger client.")
    }

    /// Remote read failed for a specific key
    pub fn remote_read(source: &str, key: impl fmt::Display, msg: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::RemoteReadFailure,
            format!("{} failed for {}: {}", source, key, msg),
        )
    }

    /// Ledger payload could not be decoded
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RemoteInvalidResponse, msg)
    }

    /// Normalizer rejected resolved inputs
    pub fn normalization_failed() -> Self {
        Self::new(ErrorCode::NormalizationFailure, "Unknown error.")
    }

    /// Invalid campaign or token address
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    /// Name-service label not found
    pub fn name_not_found(name: &str) -> Self {
        Self::new(
            ErrorCode::NameNotFound,
            format!("No campaign registered for name: {}", name),
        )
    }

    /// Invalid configuration value
    pub fn invalid_config(key: &str, value: &str) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("Invalid value for {}: {}", key, value),
        )
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// Unexpected programming error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::RemoteReadFailure, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::ClientUnavailable, "Connection failed")
        } else {
            Self::new(ErrorCode::RemoteReadFailure, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::RemoteInvalidResponse, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::client_unavailable();
        assert_eq!(err.code, ErrorCode::ClientUnavailable);
        assert_eq!(err.code_str(), "CLIENT_UNAVAILABLE");
    }

    #[test]
    fn test_remote_read_message_names_key() {
        let err = AppError::remote_read("campaignState", "juno1abc", "timeout");
        assert_eq!(err.code, ErrorCode::RemoteReadFailure);
        assert!(err.to_string().contains("juno1abc"));
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::RemoteReadFailure.is_retryable());
        assert!(!ErrorCode::NormalizationFailure.is_retryable());
        assert!(!ErrorCode::InvalidAddress.is_retryable());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::InvalidAddress.http_status(), 400);
        assert_eq!(ErrorCode::ApiRateLimited.http_status(), 429);
        assert_eq!(ErrorCode::ClientUnavailable.http_status(), 502);
        assert_eq!(ErrorCode::Internal.http_status(), 500);
    }

    #[test]
    fn test_clone_keeps_source() {
        let json_err = serde_json::from_str::<u64>("nope").unwrap_err();
        let err = AppError::from(json_err);
        let cloned = err.clone();
        assert!(std::error::Error::source(&cloned).is_some());
        assert_eq!(err, cloned);
    }
}
