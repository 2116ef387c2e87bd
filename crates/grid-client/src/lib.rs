//! # grid-client
//!
//! Grid payments API client for SubSave.
//!
//! This crate provides:
//!
//! 1. **GridConfig** - connection parameters resolved from the environment
//!    - API key (required, only ever logged masked)
//!    - Environment tag and optional custom endpoint
//!
//! 2. **ClientHolder** - the single Grid client of the process
//!    - Lazy initialization, shared by concurrent callers
//!    - Session secrets for request signing
//!
//! 3. **Executor** - per-attempt timeout and exponential backoff
//!
//! 4. **GridService** - typed account, balance, spending limit and
//!    transaction calls that only ever fail with a classified `GridError`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use grid_client::GridService;
//! use grid_core::{CreateSpendingLimitRequest, LimitPeriod};
//!
//! let service = GridService::from_env()?;
//!
//! let limit = service
//!     .create_spending_limit(CreateSpendingLimitRequest::new(
//!         "acc_123",
//!         500.0,
//!         "USD",
//!         LimitPeriod::Monthly,
//!     ))
//!     .await?;
//! ```

pub mod config;
pub mod holder;
pub mod http;
pub mod retry;
pub mod service;
pub mod session;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-exports
pub use config::{mask_secret, AdvisorSettings, AppEnvironment, GridConfig, DEFAULT_BASE_URL};
pub use holder::{BoxedFactory, ClientFactory, ClientHandle, ClientHolder, ConfigResolver, HolderState};
pub use http::{HttpClientFactory, HttpTransport};
pub use retry::{Delay, Executor, RetryPolicy, TokioDelay};
pub use service::{ClientInfo, GridService};
pub use session::SessionSecrets;
