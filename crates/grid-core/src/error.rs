//! # Grid Error Types
//!
//! The closed taxonomy of failures a Grid call can produce.
//! All Grid operations return `Result<T, GridError>`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Fieldless discriminant of a [`GridError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridErrorKind {
    Validation,
    Auth,
    Network,
    RateLimit,
    InsufficientFunds,
    AccountNotFound,
    InvalidOtp,
    SpendingLimitExceeded,
    ServiceUnavailable,
    Timeout,
    Config,
    Unknown,
}

impl GridErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [GridErrorKind; 12] = [
        GridErrorKind::Validation,
        GridErrorKind::Auth,
        GridErrorKind::Network,
        GridErrorKind::RateLimit,
        GridErrorKind::InsufficientFunds,
        GridErrorKind::AccountNotFound,
        GridErrorKind::InvalidOtp,
        GridErrorKind::SpendingLimitExceeded,
        GridErrorKind::ServiceUnavailable,
        GridErrorKind::Timeout,
        GridErrorKind::Config,
        GridErrorKind::Unknown,
    ];

    /// Stable machine-readable code
    pub fn code(self) -> &'static str {
        match self {
            GridErrorKind::Validation => "GRID_VALIDATION_ERROR",
            GridErrorKind::Auth => "GRID_AUTH_ERROR",
            GridErrorKind::Network => "GRID_NETWORK_ERROR",
            GridErrorKind::RateLimit => "GRID_RATE_LIMIT_ERROR",
            GridErrorKind::InsufficientFunds => "GRID_INSUFFICIENT_FUNDS_ERROR",
            GridErrorKind::AccountNotFound => "GRID_ACCOUNT_NOT_FOUND_ERROR",
            GridErrorKind::InvalidOtp => "GRID_INVALID_OTP_ERROR",
            GridErrorKind::SpendingLimitExceeded => "GRID_SPENDING_LIMIT_EXCEEDED_ERROR",
            GridErrorKind::ServiceUnavailable => "GRID_SERVICE_UNAVAILABLE_ERROR",
            GridErrorKind::Timeout => "GRID_TIMEOUT_ERROR",
            GridErrorKind::Config => "GRID_CONFIG_ERROR",
            GridErrorKind::Unknown => "GRID_UNKNOWN_ERROR",
        }
    }

    /// Status code attached when an error of this kind is built locally
    pub fn default_status(self) -> Option<u16> {
        match self {
            GridErrorKind::Validation
            | GridErrorKind::InsufficientFunds
            | GridErrorKind::InvalidOtp
            | GridErrorKind::SpendingLimitExceeded => Some(400),
            GridErrorKind::Auth => Some(401),
            GridErrorKind::AccountNotFound => Some(404),
            GridErrorKind::Timeout => Some(408),
            GridErrorKind::RateLimit => Some(429),
            GridErrorKind::ServiceUnavailable => Some(503),
            GridErrorKind::Network | GridErrorKind::Config | GridErrorKind::Unknown => None,
        }
    }

    /// Returns false for failures a retry cannot fix
    pub fn is_retryable(self) -> bool {
        !matches!(
            self,
            GridErrorKind::Auth
                | GridErrorKind::Validation
                | GridErrorKind::AccountNotFound
                | GridErrorKind::InvalidOtp
                | GridErrorKind::Config
        )
    }

    /// User-facing category used by callers to pick a remediation message
    pub fn category(self) -> ErrorCategory {
        match self {
            GridErrorKind::Validation
            | GridErrorKind::AccountNotFound
            | GridErrorKind::InvalidOtp => ErrorCategory::Validation,
            GridErrorKind::Auth => ErrorCategory::Auth,
            GridErrorKind::Network
            | GridErrorKind::Timeout
            | GridErrorKind::ServiceUnavailable => ErrorCategory::Network,
            GridErrorKind::InsufficientFunds | GridErrorKind::SpendingLimitExceeded => {
                ErrorCategory::Funds
            }
            GridErrorKind::RateLimit => ErrorCategory::RateLimit,
            GridErrorKind::Config | GridErrorKind::Unknown => ErrorCategory::Unknown,
        }
    }
}

impl fmt::Display for GridErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Small set of categories the UI renders remediation messages for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Auth,
    Network,
    Funds,
    RateLimit,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Network => "network",
            ErrorCategory::Funds => "funds",
            ErrorCategory::RateLimit => "rate_limit",
            ErrorCategory::Unknown => "unknown",
        }
    }

    /// Generic remediation text for this category
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "Please check the details you entered and try again.",
            ErrorCategory::Auth => "Please log in again",
            ErrorCategory::Network => "Network error. Please try again.",
            ErrorCategory::Funds => "Insufficient funds. Please add money to your account.",
            ErrorCategory::RateLimit => "Too many requests. Please wait a moment.",
            ErrorCategory::Unknown => "Something went wrong. Please try again.",
        }
    }
}

/// Diagnostic payload shared by every [`GridError`] variant
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorContext {
    /// Human-readable message
    pub message: String,
    /// HTTP status, when one is known
    pub status_code: Option<u16>,
    /// Structured details; carries `originalError` for wrapped failures
    pub details: Option<Value>,
}

impl ErrorContext {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            details: None,
        }
    }

    pub fn with_status(mut self, status_code: Option<u16>) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_details(mut self, details: Option<Value>) -> Self {
        self.details = details;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Core error type for all Grid operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// Request rejected as malformed
    #[error("Validation error: {0}")]
    Validation(ErrorContext),

    /// Credentials missing, invalid or forbidden
    #[error("Authentication error: {0}")]
    Auth(ErrorContext),

    /// Transport-level failure reaching Grid
    #[error("Network error: {0}")]
    Network(ErrorContext),

    /// Rate limited by Grid
    #[error("Rate limited: {context}")]
    RateLimit {
        context: ErrorContext,
        retry_after: Option<Duration>,
    },

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(ErrorContext),

    #[error("Account not found: {0}")]
    AccountNotFound(ErrorContext),

    #[error("Invalid OTP: {0}")]
    InvalidOtp(ErrorContext),

    #[error("Spending limit exceeded: {0}")]
    SpendingLimitExceeded(ErrorContext),

    /// Grid returned a 5xx
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(ErrorContext),

    #[error("Timeout: {0}")]
    Timeout(ErrorContext),

    /// Missing or invalid local configuration
    #[error("Configuration error: {0}")]
    Config(ErrorContext),

    #[error("Unknown error: {0}")]
    Unknown(ErrorContext),
}

impl GridError {
    /// Build an error of `kind` from an existing context.
    pub fn from_kind(kind: GridErrorKind, context: ErrorContext) -> Self {
        match kind {
            GridErrorKind::Validation => GridError::Validation(context),
            GridErrorKind::Auth => GridError::Auth(context),
            GridErrorKind::Network => GridError::Network(context),
            GridErrorKind::RateLimit => GridError::RateLimit {
                context,
                retry_after: None,
            },
            GridErrorKind::InsufficientFunds => GridError::InsufficientFunds(context),
            GridErrorKind::AccountNotFound => GridError::AccountNotFound(context),
            GridErrorKind::InvalidOtp => GridError::InvalidOtp(context),
            GridErrorKind::SpendingLimitExceeded => GridError::SpendingLimitExceeded(context),
            GridErrorKind::ServiceUnavailable => GridError::ServiceUnavailable(context),
            GridErrorKind::Timeout => GridError::Timeout(context),
            GridErrorKind::Config => GridError::Config(context),
            GridErrorKind::Unknown => GridError::Unknown(context),
        }
    }

    /// Build an error of `kind` carrying the kind's default status code.
    pub fn new(kind: GridErrorKind, message: impl Into<String>) -> Self {
        Self::from_kind(
            kind,
            ErrorContext::new(message).with_status(kind.default_status()),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(GridErrorKind::Validation, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(GridErrorKind::Auth, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GridErrorKind::Network, message)
    }

    pub fn rate_limited(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        GridError::RateLimit {
            context: ErrorContext::new(message)
                .with_status(GridErrorKind::RateLimit.default_status()),
            retry_after,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(GridErrorKind::Timeout, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(GridErrorKind::Config, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(GridErrorKind::Unknown, message)
    }

    pub fn kind(&self) -> GridErrorKind {
        match self {
            GridError::Validation(_) => GridErrorKind::Validation,
            GridError::Auth(_) => GridErrorKind::Auth,
            GridError::Network(_) => GridErrorKind::Network,
            GridError::RateLimit { .. } => GridErrorKind::RateLimit,
            GridError::InsufficientFunds(_) => GridErrorKind::InsufficientFunds,
            GridError::AccountNotFound(_) => GridErrorKind::AccountNotFound,
            GridError::InvalidOtp(_) => GridErrorKind::InvalidOtp,
            GridError::SpendingLimitExceeded(_) => GridErrorKind::SpendingLimitExceeded,
            GridError::ServiceUnavailable(_) => GridErrorKind::ServiceUnavailable,
            GridError::Timeout(_) => GridErrorKind::Timeout,
            GridError::Config(_) => GridErrorKind::Config,
            GridError::Unknown(_) => GridErrorKind::Unknown,
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            GridError::RateLimit { context, .. } => context,
            GridError::Validation(context)
            | GridError::Auth(context)
            | GridError::Network(context)
            | GridError::InsufficientFunds(context)
            | GridError::AccountNotFound(context)
            | GridError::InvalidOtp(context)
            | GridError::SpendingLimitExceeded(context)
            | GridError::ServiceUnavailable(context)
            | GridError::Timeout(context)
            | GridError::Config(context)
            | GridError::Unknown(context) => context,
        }
    }

    /// Take the context out, dropping variant-specific metadata.
    pub fn into_context(self) -> ErrorContext {
        match self {
            GridError::RateLimit { context, .. } => context,
            GridError::Validation(context)
            | GridError::Auth(context)
            | GridError::Network(context)
            | GridError::InsufficientFunds(context)
            | GridError::AccountNotFound(context)
            | GridError::InvalidOtp(context)
            | GridError::SpendingLimitExceeded(context)
            | GridError::ServiceUnavailable(context)
            | GridError::Timeout(context)
            | GridError::Config(context)
            | GridError::Unknown(context) => context,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    pub fn message(&self) -> &str {
        &self.context().message
    }

    pub fn status_code(&self) -> Option<u16> {
        self.context().status_code
    }

    pub fn details(&self) -> Option<&Value> {
        self.context().details.as_ref()
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GridError::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn is(&self, kind: GridErrorKind) -> bool {
        self.kind() == kind
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind().category()
    }

    /// Text safe to show an end user. Validation-class errors keep the
    /// server's message since it names the offending field.
    pub fn user_message(&self) -> String {
        match self.category() {
            ErrorCategory::Validation if !self.message().is_empty() => self.message().to_string(),
            category => category.user_message().to_string(),
        }
    }

    /// Builder: override the status code
    pub fn with_status(self, status_code: u16) -> Self {
        self.map_context(|context| context.with_status(Some(status_code)))
    }

    /// Builder: attach structured details
    pub fn with_details(self, details: Value) -> Self {
        self.map_context(|context| context.with_details(Some(details)))
    }

    fn map_context(self, f: impl FnOnce(ErrorContext) -> ErrorContext) -> Self {
        match self {
            GridError::RateLimit {
                context,
                retry_after,
            } => GridError::RateLimit {
                context: f(context),
                retry_after,
            },
            other => {
                let kind = other.kind();
                GridError::from_kind(kind, f(other.into_context()))
            }
        }
    }
}

/// Result type alias for Grid operations
pub type GridResult<T> = Result<T, GridError>;
