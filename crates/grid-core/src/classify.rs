//! # Error Classification
//!
//! Maps raw transport failures onto exactly one [`GridErrorKind`].
//!
//! Priority, first match wins:
//!
//! 1. An already classified [`GridError`] passes through unchanged.
//! 2. A status code found in the status table decides the kind.
//! 3. Known message substrings, checked in a fixed order.
//! 4. Anything else is `Unknown`, with the raw failure kept under
//!    `details.originalError`.
//!
//! The status code is authoritative. Substring matching only exists for
//! transports that surface a bare message.

use crate::error::{ErrorContext, GridError, GridErrorKind};
use serde_json::{json, Value};
use std::time::Duration;

/// A failure as the transport saw it, before classification
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawFailure {
    pub status_code: Option<u16>,
    pub message: String,
    pub details: Option<Value>,
    /// Parsed `Retry-After`, if the response carried one
    pub retry_after: Option<Duration>,
}

impl RawFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    fn original_error(&self) -> Value {
        json!({
            "originalError": {
                "message": self.message,
                "statusCode": self.status_code,
                "details": self.details,
            }
        })
    }
}

/// Input to [`classify`]: either already typed or raw
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    Classified(GridError),
    Raw(RawFailure),
}

impl From<GridError> for Failure {
    fn from(error: GridError) -> Self {
        Failure::Classified(error)
    }
}

impl From<RawFailure> for Failure {
    fn from(raw: RawFailure) -> Self {
        Failure::Raw(raw)
    }
}

/// Status → kind table
pub fn kind_for_status(status_code: u16) -> Option<GridErrorKind> {
    match status_code {
        400 => Some(GridErrorKind::Validation),
        401 | 403 => Some(GridErrorKind::Auth),
        404 => Some(GridErrorKind::AccountNotFound),
        408 => Some(GridErrorKind::Timeout),
        429 => Some(GridErrorKind::RateLimit),
        500 | 502 | 503 | 504 => Some(GridErrorKind::ServiceUnavailable),
        _ => None,
    }
}

const NETWORK_TERMS: &[&str] = &[
    "network",
    "connection refused",
    "connection reset",
    "econnrefused",
    "econnreset",
    "dns",
];

// Order matters: a message naming several kinds resolves to the earliest row.
const MESSAGE_RULES: &[(&[&str], GridErrorKind)] = &[
    (NETWORK_TERMS, GridErrorKind::Network),
    (&["unauthorized"], GridErrorKind::Auth),
    (&["validation"], GridErrorKind::Validation),
    (
        &["insufficient funds", "insufficient balance"],
        GridErrorKind::InsufficientFunds,
    ),
    (&["not found"], GridErrorKind::AccountNotFound),
    (&["otp"], GridErrorKind::InvalidOtp),
    (
        &["spending limit", "limit exceeded"],
        GridErrorKind::SpendingLimitExceeded,
    ),
    (&["timeout", "timed out"], GridErrorKind::Timeout),
];

fn kind_for_message(message: &str) -> Option<GridErrorKind> {
    let message = message.to_lowercase();
    MESSAGE_RULES
        .iter()
        .find(|(terms, _)| terms.iter().any(|term| message.contains(term)))
        .map(|(_, kind)| *kind)
}

/// Classify a failure into exactly one taxonomy member.
pub fn classify(failure: impl Into<Failure>) -> GridError {
    let raw = match failure.into() {
        Failure::Classified(error) => return error,
        Failure::Raw(raw) => raw,
    };

    if let Some(kind) = raw.status_code.and_then(kind_for_status) {
        return build(kind, raw);
    }

    if let Some(kind) = kind_for_message(&raw.message) {
        return build(kind, raw);
    }

    let details = raw.original_error();
    let message = if raw.message.is_empty() {
        "An unknown error occurred".to_string()
    } else {
        raw.message
    };
    GridError::Unknown(
        ErrorContext::new(message)
            .with_status(raw.status_code)
            .with_details(Some(details)),
    )
}

fn build(kind: GridErrorKind, raw: RawFailure) -> GridError {
    let status_code = raw.status_code.or_else(|| kind.default_status());
    let context = ErrorContext::new(raw.message)
        .with_status(status_code)
        .with_details(raw.details);

    match kind {
        GridErrorKind::RateLimit => GridError::RateLimit {
            context,
            retry_after: raw.retry_after,
        },
        kind => GridError::from_kind(kind, context),
    }
}

const DOMAIN_RULES: &[(&[&str], GridErrorKind)] = &[
    (&["otp"], GridErrorKind::InvalidOtp),
    (
        &["insufficient funds", "insufficient balance"],
        GridErrorKind::InsufficientFunds,
    ),
    (
        &["spending limit", "limit exceeded"],
        GridErrorKind::SpendingLimitExceeded,
    ),
];

/// Narrow a generic validation error to the domain kind its message names.
///
/// Grid reports a wrong one-time code or an overdrawn account as a plain
/// 400; the status table alone would call both `Validation`. Every other
/// error is returned untouched.
pub fn refine_domain(error: GridError) -> GridError {
    let GridError::Validation(context) = error else {
        return error;
    };

    let message = context.message.to_lowercase();
    let refined = DOMAIN_RULES
        .iter()
        .find(|(terms, _)| terms.iter().any(|term| message.contains(term)))
        .map(|(_, kind)| *kind);

    match refined {
        Some(kind) => GridError::from_kind(kind, context),
        None => GridError::Validation(context),
    }
}
