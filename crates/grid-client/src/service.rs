//! # Grid Service
//!
//! Typed facade over the Grid API. Every call follows the same path:
//!
//! 1. validate the request locally (`Validation`, nothing sent)
//! 2. lazily initialize the client holder (`Config` when the key is missing)
//! 3. run the remote call through the retrying executor
//! 4. decode the JSON body into the response type
//!
//! Every error a caller sees is a classified [`GridError`].

use crate::holder::ClientHolder;
use crate::retry::{Executor, RetryPolicy};
use grid_core::{
    classify, refine_domain, AccountInfo, ApiRequest, CreateAccountRequest, CreateAccountResponse,
    CreateSpendingLimitRequest, CreateSpendingLimitResponse, DeleteSpendingLimitRequest,
    DeleteSpendingLimitResponse, Failure, GetAccountInfoRequest, GetBalancesRequest,
    GetBalancesResponse, GetSpendingLimitsRequest, GetSpendingLimitsResponse,
    GetTransactionsRequest, GetTransactionsResponse, GridEnvironment, GridError, GridResult,
    TransactionRequest, TransactionResponse, UpdateAccountRequest,
    UpdateAccountResponse, VerifyOtpRequest, VerifyOtpResponse,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Non-secret description of the configured client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub environment: GridEnvironment,
    /// First eight characters of the key followed by `...`
    pub api_key: String,
}

/// Grid payments facade
#[derive(Debug, Clone)]
pub struct GridService {
    holder: Arc<ClientHolder>,
    executor: Executor,
}

impl GridService {
    pub fn new(holder: Arc<ClientHolder>, executor: Executor) -> Self {
        Self { holder, executor }
    }

    /// Service wired from environment variables.
    ///
    /// Only the retry policy is read here; the API key is resolved on the
    /// first call.
    pub fn from_env() -> GridResult<Self> {
        let policy = RetryPolicy::from_env()?;
        Ok(Self::new(
            Arc::new(ClientHolder::from_env()),
            Executor::with_policy(policy),
        ))
    }

    pub fn holder(&self) -> &Arc<ClientHolder> {
        &self.holder
    }

    pub fn is_initialized(&self) -> bool {
        self.holder.is_initialized()
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Create an email- or signer-based account.
    #[instrument(skip(self, request), fields(account_type = ?request.account_type))]
    pub async fn create_account(
        &self,
        request: CreateAccountRequest,
    ) -> GridResult<CreateAccountResponse> {
        request.validate()?;
        let api_request = ApiRequest::post(["accounts"]).with_body(to_body(&request)?);

        let response: CreateAccountResponse = self.call("createAccount", api_request).await?;
        info!(
            account_id = response.data.account_id().unwrap_or_default(),
            "Grid account created"
        );
        Ok(response)
    }

    /// Confirm the one-time code sent on account creation.
    #[instrument(skip(self, request))]
    pub async fn verify_otp(&self, request: VerifyOtpRequest) -> GridResult<VerifyOtpResponse> {
        request.validate()?;
        let api_request =
            ApiRequest::post(["accounts", "verify-otp"]).with_body(to_body(&request)?);

        self.call("verifyOtp", api_request).await
    }

    #[instrument(skip(self, request), fields(account_id = %request.account_id))]
    pub async fn get_account_info(&self, request: GetAccountInfoRequest) -> GridResult<AccountInfo> {
        request.validate()?;
        let api_request = ApiRequest::get(["accounts", request.account_id.as_str()]);

        self.call("getAccountInfo", api_request).await
    }

    #[instrument(skip(self, request), fields(account_id = %request.account_id))]
    pub async fn update_account(
        &self,
        request: UpdateAccountRequest,
    ) -> GridResult<UpdateAccountResponse> {
        request.validate()?;
        let api_request = ApiRequest::patch(["accounts", request.account_id.as_str()])
            .with_body(to_body(&request)?);

        self.call("updateAccount", api_request).await
    }

    // =========================================================================
    // Balances
    // =========================================================================

    #[instrument(skip(self, request), fields(account_id = %request.account_id))]
    pub async fn get_balances(&self, request: GetBalancesRequest) -> GridResult<GetBalancesResponse> {
        request.validate()?;
        let api_request = ApiRequest::get(["accounts", request.account_id.as_str(), "balances"])
            .with_query("currency", request.currency.as_deref());

        self.call("getBalances", api_request).await
    }

    // =========================================================================
    // Spending limits
    // =========================================================================

    #[instrument(skip(self, request), fields(account_id = %request.account_id, period = %request.period))]
    pub async fn create_spending_limit(
        &self,
        request: CreateSpendingLimitRequest,
    ) -> GridResult<CreateSpendingLimitResponse> {
        request.validate()?;
        let api_request =
            ApiRequest::post(["accounts", request.account_id.as_str(), "spending-limits"])
                .with_body(to_body(&request)?);

        let limit: CreateSpendingLimitResponse =
            self.call("createSpendingLimit", api_request).await?;
        info!(limit_id = %limit.limit_id, "Spending limit created");
        Ok(limit)
    }

    #[instrument(skip(self, request), fields(account_id = %request.account_id, limit_id = %request.limit_id))]
    pub async fn delete_spending_limit(
        &self,
        request: DeleteSpendingLimitRequest,
    ) -> GridResult<DeleteSpendingLimitResponse> {
        request.validate()?;
        let api_request = ApiRequest::delete([
            "accounts",
            request.account_id.as_str(),
            "spending-limits",
            request.limit_id.as_str(),
        ]);

        self.call("deleteSpendingLimit", api_request).await
    }

    #[instrument(skip(self, request), fields(account_id = %request.account_id))]
    pub async fn get_spending_limits(
        &self,
        request: GetSpendingLimitsRequest,
    ) -> GridResult<GetSpendingLimitsResponse> {
        request.validate()?;
        let api_request =
            ApiRequest::get(["accounts", request.account_id.as_str(), "spending-limits"])
                .with_query("status", request.status.map(|s| s.as_str()))
                .with_query("limit", request.limit)
                .with_query("offset", request.offset);

        self.call("getSpendingLimits", api_request).await
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    #[instrument(skip(self, request), fields(account_id = %request.account_id, amount = request.amount, currency = %request.currency))]
    pub async fn create_transaction(
        &self,
        request: TransactionRequest,
    ) -> GridResult<TransactionResponse> {
        request.validate()?;
        let api_request =
            ApiRequest::post(["accounts", request.account_id.as_str(), "transactions"])
                .with_body(to_body(&request)?);

        let transaction: TransactionResponse = self.call("createTransaction", api_request).await?;
        info!(
            transaction_id = %transaction.transaction_id,
            status = transaction.status.as_str(),
            "Transaction created"
        );
        Ok(transaction)
    }

    #[instrument(skip(self, request), fields(account_id = %request.account_id))]
    pub async fn get_transactions(
        &self,
        request: GetTransactionsRequest,
    ) -> GridResult<GetTransactionsResponse> {
        request.validate()?;
        let api_request =
            ApiRequest::get(["accounts", request.account_id.as_str(), "transactions"])
                .with_query("limit", request.limit)
                .with_query("offset", request.offset)
                .with_query("status", request.status.map(|s| s.as_str()))
                .with_query("startDate", request.start_date.as_deref())
                .with_query("endDate", request.end_date.as_deref());

        self.call("getTransactions", api_request).await
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Reachability check. Never fails: any problem reads as unhealthy.
    pub async fn is_healthy(&self) -> bool {
        let handle = match self.holder.initialize().await {
            Ok(handle) => handle,
            Err(failure) => {
                warn!("Grid health check failed to initialize: {}", classify(failure));
                return false;
            }
        };

        let timeout = self.executor.policy().timeout;
        match tokio::time::timeout(timeout, handle.transport().probe()).await {
            Ok(Ok(())) => true,
            Ok(Err(failure)) => {
                warn!("Grid health probe failed: {}", classify(failure));
                false
            }
            Err(_) => {
                warn!("Grid health probe timed out after {}ms", timeout.as_millis());
                false
            }
        }
    }

    /// Environment and masked API key. Does not initialize the client.
    pub fn client_info(&self) -> GridResult<ClientInfo> {
        let config = self.holder.config()?;
        Ok(ClientInfo {
            environment: config.environment,
            api_key: config.masked_api_key(),
        })
    }

    /// Shared call path for every remote operation.
    async fn call<T>(&self, operation: &'static str, request: ApiRequest) -> GridResult<T>
    where
        T: DeserializeOwned,
    {
        let handle = self
            .holder
            .initialize()
            .await
            .map_err(|failure| classify(failure))?;
        let transport = handle.transport();

        let body = self
            .executor
            .execute(operation, || {
                let transport = Arc::clone(transport);
                let request = request.clone();
                async move {
                    transport
                        .send(request)
                        .await
                        .map_err(|failure| Failure::from(refine_domain(classify(failure))))
                }
            })
            .await?;

        decode(operation, body)
    }
}

fn to_body<R: Serialize>(request: &R) -> GridResult<Value> {
    serde_json::to_value(request)
        .map_err(|e| GridError::unknown(format!("failed to encode request: {}", e)))
}

fn decode<T: DeserializeOwned>(operation: &str, body: Value) -> GridResult<T> {
    serde_json::from_value(body.clone()).map_err(|e| {
        error!(operation, "Unexpected Grid response shape: {}", e);
        GridError::unknown(format!("unexpected {} response from Grid: {}", operation, e))
            .with_details(body)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::holder::ConfigResolver;
    use crate::testing::{test_holder, RecordingDelay, ScriptedTransport, StaticFactory};
    use grid_core::{
        ApiMethod, GridErrorKind, LimitPeriod, LimitStatus, RawFailure, TransactionStatus,
    };
    use serde_json::json;
    use std::time::Duration;

    struct Fixture {
        service: GridService,
        transport: Arc<ScriptedTransport>,
        factory: Arc<StaticFactory>,
        delay: Arc<RecordingDelay>,
    }

    fn fixture(transport: ScriptedTransport) -> Fixture {
        let transport = Arc::new(transport);
        let factory = Arc::new(StaticFactory::new(transport.clone()));
        let delay = Arc::new(RecordingDelay::new());
        let service = GridService::new(
            test_holder(factory.clone()),
            Executor::new(RetryPolicy::default(), delay.clone()),
        );
        Fixture {
            service,
            transport,
            factory,
            delay,
        }
    }

    fn spending_limit_body() -> Value {
        json!({
            "limitId": "lim_1",
            "accountId": "acc_1",
            "limit": 1000.0,
            "currency": "USD",
            "period": "monthly",
            "status": "active",
            "createdAt": "2025-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_create_account_invalid_email() {
        let fx = fixture(
            ScriptedTransport::new().fail(RawFailure::new("invalid email").with_status(400)),
        );

        let err = fx
            .service
            .create_account(CreateAccountRequest::email("user@example"))
            .await
            .unwrap_err();

        assert!(err.is(GridErrorKind::Validation));
        assert_eq!(err.message(), "invalid email");
        assert_eq!(fx.transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_create_account_success() {
        let fx = fixture(ScriptedTransport::new().respond(json!({
            "data": {
                "type": "email",
                "email": "user@example.com",
                "status": "pending_verification",
                "otp_sent": true,
                "created_at": "2025-01-01T00:00:00Z"
            },
            "metadata": {"request_id": "req_1", "timestamp": "2025-01-01T00:00:00Z"}
        })));

        let response = fx
            .service
            .create_account(CreateAccountRequest::email("user@example.com"))
            .await
            .unwrap();

        assert_eq!(response.data.account_id(), Some("user@example.com"));
        let sent = fx.transport.last_request().unwrap();
        assert_eq!(sent.method, ApiMethod::Post);
        assert_eq!(sent.path(), "/accounts");
        assert_eq!(sent.body.unwrap()["email"], "user@example.com");
    }

    #[tokio::test]
    async fn test_create_spending_limit_recovers_from_unavailable() {
        let fx = fixture(
            ScriptedTransport::new()
                .fail(RawFailure::new("Service Unavailable").with_status(503))
                .fail(RawFailure::new("Service Unavailable").with_status(503))
                .respond(spending_limit_body()),
        );

        let limit = fx
            .service
            .create_spending_limit(CreateSpendingLimitRequest::new(
                "acc_1",
                1000.0,
                "USD",
                LimitPeriod::Monthly,
            ))
            .await
            .unwrap();

        assert_eq!(limit.limit_id, "lim_1");
        assert_eq!(limit.status, LimitStatus::Active);
        assert_eq!(fx.transport.calls(), 3);
        assert_eq!(
            fx.delay.waits(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
        assert_eq!(
            fx.transport.last_request().unwrap().path(),
            "/accounts/acc_1/spending-limits"
        );
    }

    #[tokio::test]
    async fn test_verify_otp_invalid_code_not_retried() {
        let fx = fixture(
            ScriptedTransport::new()
                .fail(RawFailure::new("invalid otp").with_status(400))
                .respond(json!({})),
        );

        let err = fx
            .service
            .verify_otp(VerifyOtpRequest::new("user@example.com", "000000"))
            .await
            .unwrap_err();

        assert!(err.is(GridErrorKind::InvalidOtp));
        assert_eq!(err.status_code(), Some(400));
        assert_eq!(fx.transport.calls(), 1);
        assert!(fx.delay.waits().is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_funds_is_refined_and_retried() {
        let funds = || RawFailure::new("Insufficient funds for transfer").with_status(400);
        let fx = fixture(
            ScriptedTransport::new()
                .fail(funds())
                .fail(funds())
                .fail(funds()),
        );

        let err = fx
            .service
            .create_transaction(TransactionRequest::new("acc_1", 15.99, "USD"))
            .await
            .unwrap_err();

        assert!(err.is(GridErrorKind::InsufficientFunds));
        assert_eq!(err.status_code(), Some(400));
        assert_eq!(fx.transport.calls(), 3);
        assert_eq!(
            fx.delay.waits(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn test_local_validation_skips_remote_call() {
        let fx = fixture(ScriptedTransport::new());

        let err = fx
            .service
            .create_transaction(TransactionRequest::new("acc_1", 0.0, "USD"))
            .await
            .unwrap_err();

        assert!(err.is(GridErrorKind::Validation));
        assert_eq!(fx.transport.calls(), 0);
        assert_eq!(fx.factory.constructions(), 0);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_config_error() {
        let transport = Arc::new(ScriptedTransport::new());
        let factory = Arc::new(StaticFactory::new(transport.clone()));
        let resolver: ConfigResolver = Arc::new(|| GridConfig::from_lookup(|_| None));
        let service = GridService::new(
            Arc::new(ClientHolder::new(resolver, factory.clone())),
            Executor::new(RetryPolicy::default(), Arc::new(RecordingDelay::new())),
        );

        let err = service
            .get_balances(GetBalancesRequest::new("acc_1"))
            .await
            .unwrap_err();

        assert!(err.is(GridErrorKind::Config));
        assert_eq!(factory.constructions(), 0);
        assert_eq!(transport.calls(), 0);
        assert!(service.client_info().unwrap_err().is(GridErrorKind::Config));
    }

    #[tokio::test]
    async fn test_get_transactions_query() {
        let fx = fixture(ScriptedTransport::new().respond(json!({
            "transactions": [],
            "total": 0,
            "hasMore": false
        })));

        let mut request = GetTransactionsRequest::new("acc_1");
        request.limit = Some(10);
        request.status = Some(TransactionStatus::Pending);
        request.start_date = Some("2025-01-01".to_string());

        let response = fx.service.get_transactions(request).await.unwrap();
        assert_eq!(response.total, 0);

        let sent = fx.transport.last_request().unwrap();
        assert_eq!(sent.path(), "/accounts/acc_1/transactions");
        assert_eq!(
            sent.query,
            vec![
                ("limit".to_string(), "10".to_string()),
                ("status".to_string(), "pending".to_string()),
                ("startDate".to_string(), "2025-01-01".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_spending_limit_path() {
        let fx = fixture(ScriptedTransport::new().respond(json!({
            "success": true,
            "limitId": "lim_1",
            "deletedAt": "2025-01-02T00:00:00Z"
        })));

        let response = fx
            .service
            .delete_spending_limit(DeleteSpendingLimitRequest::new("acc_1", "lim_1"))
            .await
            .unwrap();

        assert!(response.success);
        let sent = fx.transport.last_request().unwrap();
        assert_eq!(sent.method, ApiMethod::Delete);
        assert_eq!(sent.path(), "/accounts/acc_1/spending-limits/lim_1");
    }

    #[tokio::test]
    async fn test_update_account_patches_profile() {
        let fx = fixture(ScriptedTransport::new().respond(json!({
            "success": true,
            "accountId": "acc_1",
            "updatedAt": "2025-01-03T00:00:00Z",
            "account": {
                "accountId": "acc_1",
                "email": "user@example.com",
                "firstName": "Ada",
                "status": "active",
                "createdAt": "2025-01-01T00:00:00Z"
            }
        })));

        let request = UpdateAccountRequest {
            account_id: "acc_1".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: None,
            phone_number: None,
            metadata: None,
        };
        let response = fx.service.update_account(request).await.unwrap();
        assert_eq!(response.account.first_name.as_deref(), Some("Ada"));

        let sent = fx.transport.last_request().unwrap();
        assert_eq!(sent.method, ApiMethod::Patch);
        assert_eq!(sent.path(), "/accounts/acc_1");
        assert_eq!(sent.body.unwrap(), json!({"accountId": "acc_1", "firstName": "Ada"}));
    }

    #[tokio::test]
    async fn test_get_spending_limits_query() {
        let fx = fixture(ScriptedTransport::new().respond(json!({
            "limits": [spending_limit_body()],
            "total": 1,
            "hasMore": false
        })));

        let mut request = GetSpendingLimitsRequest::new("acc_1");
        request.status = Some(LimitStatus::Active);
        request.limit = Some(25);

        let response = fx.service.get_spending_limits(request).await.unwrap();
        assert_eq!(response.limits.len(), 1);

        let sent = fx.transport.last_request().unwrap();
        assert_eq!(sent.path(), "/accounts/acc_1/spending-limits");
        assert_eq!(
            sent.query,
            vec![
                ("status".to_string(), "active".to_string()),
                ("limit".to_string(), "25".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_unknown_and_not_retried() {
        let fx = fixture(ScriptedTransport::new().respond(json!({"unexpected": true})));

        let err = fx
            .service
            .get_account_info(GetAccountInfoRequest::new("acc_1"))
            .await
            .unwrap_err();

        assert!(err.is(GridErrorKind::Unknown));
        assert_eq!(fx.transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_is_healthy() {
        let fx = fixture(ScriptedTransport::new());
        assert!(fx.service.is_healthy().await);
        assert!(fx.service.is_initialized());
    }

    #[tokio::test]
    async fn test_unhealthy_when_probe_fails() {
        let fx = fixture(ScriptedTransport::new().with_probe(Err(RawFailure::new(
            "Service Unavailable",
        )
        .with_status(503)
        .into())));

        assert!(!fx.service.is_healthy().await);
    }

    #[tokio::test]
    async fn test_unhealthy_when_construction_fails() {
        let factory = Arc::new(StaticFactory::failing(RawFailure::new(
            "network error: dns lookup failed",
        )));
        let service = GridService::new(
            test_holder(factory),
            Executor::new(RetryPolicy::default(), Arc::new(RecordingDelay::new())),
        );

        assert!(!service.is_healthy().await);
        assert!(!service.is_initialized());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unhealthy_when_probe_hangs() {
        let fx = fixture(ScriptedTransport::new().with_latency(Duration::from_secs(120)));
        assert!(!fx.service.is_healthy().await);
    }

    #[test]
    fn test_client_info_masks_key() {
        let fx = fixture(ScriptedTransport::new());
        let info = fx.service.client_info().unwrap();

        assert_eq!(info.environment, GridEnvironment::Sandbox);
        assert_eq!(info.api_key, "grid_sk_...");

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value, json!({"environment": "sandbox", "apiKey": "grid_sk_..."}));
    }

    #[test]
    fn test_client_info_never_exposes_short_key() {
        let factory = Arc::new(StaticFactory::new(Arc::new(ScriptedTransport::new())));
        let resolver: ConfigResolver =
            Arc::new(|| -> GridResult<GridConfig> { Ok(GridConfig::new("sk_12345")) });
        let service = GridService::new(
            Arc::new(ClientHolder::new(resolver, factory)),
            Executor::new(RetryPolicy::default(), Arc::new(RecordingDelay::new())),
        );

        let info = service.client_info().unwrap();
        assert!(!info.api_key.contains("sk_12345"));
        assert_eq!(info.api_key, "...");
    }
}
