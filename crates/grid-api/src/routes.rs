//! # Routes
//!
//! Axum router configuration for the Grid proxy.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET    /health
/// - GET    /api/v1/client-info
/// - POST   /api/v1/accounts
/// - PATCH  /api/v1/accounts
/// - POST   /api/v1/accounts/verify-otp
/// - GET    /api/v1/accounts/{account_id}
/// - GET    /api/v1/accounts/{account_id}/balances
/// - GET    /api/v1/accounts/{account_id}/spending-limits
/// - DELETE /api/v1/accounts/{account_id}/spending-limits/{limit_id}
/// - GET    /api/v1/accounts/{account_id}/transactions
/// - POST   /api/v1/spending-limits
/// - POST   /api/v1/transactions
pub fn create_router(state: AppState) -> Router {
    // Browser clients call from the app origin; the proxy holds no cookies
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let account_routes = Router::new()
        .route(
            "/",
            post(handlers::create_account).patch(handlers::update_account),
        )
        .route("/verify-otp", post(handlers::verify_otp))
        .route("/{account_id}", get(handlers::get_account_info))
        .route("/{account_id}/balances", get(handlers::get_balances))
        .route(
            "/{account_id}/spending-limits",
            get(handlers::get_spending_limits),
        )
        .route(
            "/{account_id}/spending-limits/{limit_id}",
            delete(handlers::delete_spending_limit),
        )
        .route("/{account_id}/transactions", get(handlers::get_transactions));

    let api_routes = Router::new()
        .route("/client-info", get(handlers::client_info))
        .nest("/accounts", account_routes)
        .route("/spending-limits", post(handlers::create_spending_limit))
        .route("/transactions", post(handlers::create_transaction));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::ErrorResponse;
    use crate::state::AppConfig;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use grid_client::testing::{test_holder, RecordingDelay, ScriptedTransport, StaticFactory};
    use grid_client::{AdvisorSettings, Executor, GridService, RetryPolicy};
    use grid_core::RawFailure;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn server_with(transport: Arc<ScriptedTransport>, advisor: Option<AdvisorSettings>) -> TestServer {
        let factory = Arc::new(StaticFactory::new(transport));
        let service = GridService::new(
            test_holder(factory),
            Executor::new(RetryPolicy::default(), Arc::new(RecordingDelay::new())),
        );
        let state = AppState::with_service(service, AppConfig::default(), advisor);
        TestServer::new(create_router(state)).unwrap()
    }

    fn server(transport: Arc<ScriptedTransport>) -> TestServer {
        server_with(transport, None)
    }

    #[tokio::test]
    async fn test_health_reports_grid_and_advisor() {
        let advisor = AdvisorSettings {
            api_key: "adv_test_key".to_string(),
        };
        let server = server_with(Arc::new(ScriptedTransport::new()), Some(advisor));

        let response = server.get("/health").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["grid"]["initialized"], true);
        assert_eq!(body["advisor"]["enabled"], true);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_health_is_200_when_grid_down() {
        let transport = ScriptedTransport::new()
            .with_probe(Err(RawFailure::new("Service Unavailable").with_status(503).into()));
        let server = server(Arc::new(transport));

        let response = server.get("/health").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["grid"]["healthy"], false);
        assert_eq!(body["advisor"]["enabled"], false);
    }

    #[tokio::test]
    async fn test_client_info_is_masked() {
        let server = server(Arc::new(ScriptedTransport::new()));

        let response = server.get("/api/v1/client-info").await;
        response.assert_status_ok();
        response.assert_json(&json!({"environment": "sandbox", "apiKey": "grid_sk_..."}));
    }

    #[tokio::test]
    async fn test_create_account_validation_error() {
        let transport = Arc::new(
            ScriptedTransport::new().fail(RawFailure::new("invalid email").with_status(400)),
        );
        let server = server(transport.clone());

        let response = server
            .post("/api/v1/accounts")
            .json(&json!({"type": "email", "email": "user@example"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "GRID_VALIDATION_ERROR");
        assert_eq!(body.message, "invalid email");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_create_spending_limit_after_retries() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .fail(RawFailure::new("Service Unavailable").with_status(503))
                .fail(RawFailure::new("Service Unavailable").with_status(503))
                .respond(json!({
                    "limitId": "lim_1",
                    "accountId": "acc_1",
                    "limit": 250.0,
                    "currency": "USD",
                    "period": "monthly",
                    "status": "active",
                    "createdAt": "2025-01-01T00:00:00Z"
                })),
        );
        let server = server(transport.clone());

        let response = server
            .post("/api/v1/spending-limits")
            .json(&json!({
                "accountId": "acc_1",
                "limit": 250.0,
                "currency": "USD",
                "period": "monthly"
            }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["limitId"], "lim_1");
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_verify_otp_invalid_code() {
        let transport = Arc::new(
            ScriptedTransport::new().fail(RawFailure::new("invalid otp").with_status(400)),
        );
        let server = server(transport.clone());

        let response = server
            .post("/api/v1/accounts/verify-otp")
            .json(&json!({"email": "user@example.com", "otp": "000000"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "GRID_INVALID_OTP_ERROR");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_transactions_query_is_forwarded() {
        let transport = Arc::new(ScriptedTransport::new().respond(json!({
            "transactions": [],
            "total": 0,
            "hasMore": false
        })));
        let server = server(transport.clone());

        let response = server
            .get("/api/v1/accounts/acc_1/transactions")
            .add_query_param("limit", 5)
            .add_query_param("status", "completed")
            .add_query_param("endDate", "2025-02-01")
            .await;

        response.assert_status_ok();
        let sent = transport.last_request().unwrap();
        assert_eq!(sent.path(), "/accounts/acc_1/transactions");
        assert_eq!(
            sent.query,
            vec![
                ("limit".to_string(), "5".to_string()),
                ("status".to_string(), "completed".to_string()),
                ("endDate".to_string(), "2025-02-01".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_spending_limit_not_found() {
        let transport = Arc::new(
            ScriptedTransport::new().fail(RawFailure::new("limit not found").with_status(404)),
        );
        let server = server(transport);

        let response = server
            .delete("/api/v1/accounts/acc_1/spending-limits/lim_missing")
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "GRID_ACCOUNT_NOT_FOUND_ERROR");
    }

    #[tokio::test]
    async fn test_get_balances_network_failure_is_502() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .fail(RawFailure::new("network error: connection refused"))
                .fail(RawFailure::new("network error: connection refused"))
                .fail(RawFailure::new("network error: connection refused")),
        );
        let server = server(transport.clone());

        let response = server.get("/api/v1/accounts/acc_1/balances").await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        assert_eq!(transport.calls(), 3);
    }
}
