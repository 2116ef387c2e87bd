//! # grid-api
//!
//! HTTP proxy in front of the SubSave Grid service.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for accounts, balances, spending limits and transactions
//! - A health endpoint reporting Grid reachability
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check (always 200) |
//! | GET | `/api/v1/client-info` | Environment and masked API key |
//! | POST | `/api/v1/accounts` | Create account |
//! | PATCH | `/api/v1/accounts` | Update account profile |
//! | POST | `/api/v1/accounts/verify-otp` | Verify one-time code |
//! | GET | `/api/v1/accounts/{account_id}` | Account profile |
//! | GET | `/api/v1/accounts/{account_id}/balances` | Balances |
//! | GET | `/api/v1/accounts/{account_id}/spending-limits` | List spending limits |
//! | DELETE | `/api/v1/accounts/{account_id}/spending-limits/{limit_id}` | Delete spending limit |
//! | GET | `/api/v1/accounts/{account_id}/transactions` | List transactions |
//! | POST | `/api/v1/spending-limits` | Create spending limit |
//! | POST | `/api/v1/transactions` | Create transaction |
//!
//! Errors are returned as `{error, code, category, message, status}`.

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
