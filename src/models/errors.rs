//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so logs and API responses can be
//! grouped without parsing messages.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - CFG_xxx: Configuration errors (unknown network, missing keys)
//! - RPC_xxx: Connection-layer errors (transport, timeout, syncing node)
//! - VAL_xxx: Chain identity validation errors
//! - AI_xxx: Inference endpoint errors
//! - INPUT_xxx: Caller input errors

use serde::Serialize;
use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
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
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    pub fn is_cancelled(&self) -> bool {
        self.code == ErrorCode::Cancelled
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Coarse error taxonomy surfaced in status reports and API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Unknown network or missing configuration - caller must fix input
    Configuration,
    /// Transport, timeout or syncing node - retryable
    Connection,
    /// Chain identity mismatch - endpoint misconfiguration
    Validation,
    /// External scoring call failed - absorbed by the pipeline
    Inference,
    /// Malformed caller input (address, file type)
    Input,
    /// Caller cancelled the operation
    Cancelled,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Connection => "connection",
            Self::Validation => "validation",
            Self::Inference => "inference",
            Self::Input => "input",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Configuration Errors
    // ============================================
    /// Chain id has no NetworkProfile
    ConfigUnsupportedChain,
    /// Profile exists but lists no endpoints
    ConfigNoEndpoints,
    /// Invalid configuration value
    ConfigInvalidValue,
    /// Missing API key
    ConfigMissingApiKey,

    // ============================================
    // Connection Errors
    // ============================================
    /// Transport-level failure
    RpcConnectionFailed,
    /// RPC request timeout
    RpcTimeout,
    /// RPC returned an error object
    RpcError,
    /// RPC response missing or malformed
    RpcInvalidResponse,
    /// Node reports active sync
    RpcNodeSyncing,
    /// Every endpoint exhausted its retry budget
    RpcEndpointsExhausted,

    // ============================================
    // Validation Errors
    // ============================================
    /// Endpoint reports a different chain id than requested
    ChainIdMismatch,

    // ============================================
    // Inference Errors
    // ============================================
    /// Inference transport or API failure
    InferenceFailed,
    /// Inference response violated the expected schema
    InferenceInvalidResponse,

    // ============================================
    // Input Errors
    // ============================================
    /// Wallet address fails format/checksum validation
    InvalidAddress,
    /// Uploaded file rejected (extension, size, encoding)
    InvalidUpload,
    /// Malformed request body
    ApiBadRequest,
    /// Resource not found
    ApiNotFound,

    // ============================================
    // Generic Errors
    // ============================================
    /// Operation cancelled by caller
    Cancelled,
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigUnsupportedChain => "CFG_UNSUPPORTED_CHAIN",
            Self::ConfigNoEndpoints => "CFG_NO_ENDPOINTS",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
            Self::ConfigMissingApiKey => "CFG_MISSING_API_KEY",

            Self::RpcConnectionFailed => "RPC_CONNECTION_FAILED",
            Self::RpcTimeout => "RPC_TIMEOUT",
            Self::RpcError => "RPC_ERROR",
            Self::RpcInvalidResponse => "RPC_INVALID_RESPONSE",
            Self::RpcNodeSyncing => "RPC_NODE_SYNCING",
            Self::RpcEndpointsExhausted => "RPC_ENDPOINTS_EXHAUSTED",

            Self::ChainIdMismatch => "VAL_CHAIN_ID_MISMATCH",

            Self::InferenceFailed => "AI_INFERENCE_FAILED",
            Self::InferenceInvalidResponse => "AI_INVALID_RESPONSE",

            Self::InvalidAddress => "INPUT_INVALID_ADDRESS",
            Self::InvalidUpload => "INPUT_INVALID_UPLOAD",
            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiNotFound => "API_NOT_FOUND",

            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigUnsupportedChain
            | Self::ConfigNoEndpoints
            | Self::ConfigInvalidValue
            | Self::ConfigMissingApiKey => ErrorCategory::Configuration,

            Self::RpcConnectionFailed
            | Self::RpcTimeout
            | Self::RpcError
            | Self::RpcInvalidResponse
            | Self::RpcNodeSyncing
            | Self::RpcEndpointsExhausted => ErrorCategory::Connection,

            Self::ChainIdMismatch => ErrorCategory::Validation,

            Self::InferenceFailed | Self::InferenceInvalidResponse => ErrorCategory::Inference,

            Self::InvalidAddress | Self::InvalidUpload | Self::ApiBadRequest | Self::ApiNotFound => {
                ErrorCategory::Input
            }

            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Unknown => ErrorCategory::Unknown,
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Input => {
                if *self == Self::ApiNotFound {
                    404
                } else {
                    400
                }
            }
            ErrorCategory::Connection => 503,
            ErrorCategory::Validation => 502,
            ErrorCategory::Cancelled => 499,
            ErrorCategory::Inference | ErrorCategory::Unknown => 500,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Connection | ErrorCategory::Inference | ErrorCategory::Unknown
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Unsupported chain
    pub fn unsupported_chain(chain_id: u64) -> Self {
        Self::new(
            ErrorCode::ConfigUnsupportedChain,
            format!("Unsupported network ID: {}", chain_id),
        )
    }

    /// Missing API key
    pub fn missing_api_key(key_name: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissingApiKey,
            format!("Missing API key: {}", key_name),
        )
    }

    /// RPC connection failed
    pub fn rpc_connection_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcConnectionFailed, msg)
    }

    /// RPC timeout
    pub fn rpc_timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcTimeout, msg)
    }

    /// Malformed or empty RPC result
    pub fn rpc_invalid_response(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcInvalidResponse, msg)
    }

    pub fn node_syncing(endpoint: &str) -> Self {
        Self::new(
            ErrorCode::RpcNodeSyncing,
            format!("Node is still syncing ({})", endpoint),
        )
    }

    pub fn chain_id_mismatch(expected: u64, actual: u64) -> Self {
        Self::new(
            ErrorCode::ChainIdMismatch,
            format!("Chain ID mismatch. Expected {}, got {}", expected, actual),
        )
    }

    /// Inference call failed
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InferenceFailed, msg)
    }

    pub fn inference_schema(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InferenceInvalidResponse, msg)
    }

    /// Invalid wallet address
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    pub fn invalid_upload(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidUpload, msg)
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    pub fn route_not_found(path: &str) -> Self {
        Self::new(ErrorCode::ApiNotFound, format!("No route for {}", path))
    }

    pub fn cancelled(operation: &str) -> Self {
        Self::new(ErrorCode::Cancelled, format!("{} cancelled", operation))
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
            Self::rpc_timeout(format!("Request timeout: {}", err))
        } else if err.is_connect() {
            Self::rpc_connection_failed(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            Self::rpc_invalid_response(format!("Invalid JSON response: {}", err))
        } else {
            Self::new(ErrorCode::RpcConnectionFailed, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::RpcInvalidResponse, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::rpc_timeout("Connection timed out");
        assert_eq!(err.code, ErrorCode::RpcTimeout);
        assert_eq!(err.code_str(), "RPC_TIMEOUT");
        assert_eq!(err.to_string(), "[RPC_TIMEOUT] Connection timed out");
    }

    #[test]
    fn test_categories() {
        assert_eq!(ErrorCode::ConfigUnsupportedChain.category(), ErrorCategory::Configuration);
        assert_eq!(ErrorCode::RpcNodeSyncing.category(), ErrorCategory::Connection);
        assert_eq!(ErrorCode::RpcTimeout.category(), ErrorCategory::Connection);
        assert_eq!(ErrorCode::ChainIdMismatch.category(), ErrorCategory::Validation);
        assert_eq!(ErrorCode::Unknown.category(), ErrorCategory::Unknown);
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::RpcTimeout.is_retryable());
        assert!(ErrorCode::RpcEndpointsExhausted.is_retryable());
        assert!(ErrorCode::Unknown.is_retryable());
        assert!(!ErrorCode::ConfigUnsupportedChain.is_retryable());
        assert!(!ErrorCode::ChainIdMismatch.is_retryable());
        assert!(!ErrorCode::Cancelled.is_retryable());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::ApiBadRequest.http_status(), 400);
        assert_eq!(ErrorCode::ConfigUnsupportedChain.http_status(), 400);
        assert_eq!(ErrorCode::ApiNotFound.http_status(), 404);
        assert_eq!(ErrorCode::RpcEndpointsExhausted.http_status(), 503);
        assert_eq!(ErrorCode::Unknown.http_status(), 500);
    }
}
