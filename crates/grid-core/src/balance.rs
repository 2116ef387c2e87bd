//! Balance lookups.

use crate::validate::require_id;
use crate::error::GridResult;
use serde::{Deserialize, Serialize};

/// Balance of one account in one currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    pub account_id: String,
    pub balance: f64,
    pub currency: String,
    pub available_balance: f64,
    pub pending_balance: f64,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBalancesRequest {
    pub account_id: String,
    /// Restrict to one currency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl GetBalancesRequest {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            currency: None,
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn validate(&self) -> GridResult<()> {
        require_id("accountId", &self.account_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBalancesResponse {
    pub balances: Vec<AccountBalance>,
    pub total_balance: f64,
    pub currency: String,
}
