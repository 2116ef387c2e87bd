//! # grid-core
//!
//! Core types and traits for the SubSave Grid client.
//!
//! This crate provides:
//! - `GridError` and `GridErrorKind`, the closed taxonomy of Grid failures
//! - `classify` for mapping raw transport failures onto that taxonomy
//! - `GridTransport`, the seam between the service facade and the wire
//! - Request/response types for accounts, balances, spending limits and transactions
//!
//! ## Example
//!
//! ```rust,ignore
//! use grid_core::{classify, GridErrorKind, RawFailure};
//!
//! let error = classify(RawFailure::new("invalid email").with_status(400));
//! assert!(error.is(GridErrorKind::Validation));
//! ```

pub mod account;
pub mod balance;
pub mod classify;
pub mod environment;
pub mod error;
pub mod spending_limit;
pub mod transaction;
pub mod transport;
mod validate;

// Re-exports for convenience
pub use account::{
    AccountInfo, AccountStatus, AccountType, CreateAccountRequest, CreateAccountResponse,
    CreatedAccount, GetAccountInfoRequest, OtpVerification, ResponseMetadata,
    UpdateAccountRequest, UpdateAccountResponse, VerificationStatus, VerifyOtpRequest,
    VerifyOtpResponse,
};
pub use balance::{AccountBalance, GetBalancesRequest, GetBalancesResponse};
pub use classify::{classify, kind_for_status, refine_domain, Failure, RawFailure};
pub use environment::GridEnvironment;
pub use error::{ErrorCategory, ErrorContext, GridError, GridErrorKind, GridResult};
pub use spending_limit::{
    CreateSpendingLimitRequest, CreateSpendingLimitResponse, DeleteSpendingLimitRequest,
    DeleteSpendingLimitResponse, GetSpendingLimitsRequest, GetSpendingLimitsResponse,
    LimitPeriod, LimitStatus, SpendingLimit,
};
pub use transaction::{
    GetTransactionsRequest, GetTransactionsResponse, Transaction, TransactionRequest,
    TransactionResponse, TransactionStatus,
};
pub use transport::{ApiMethod, ApiRequest, BoxedTransport, GridTransport};
