//! # Spending Limit Types
//!
//! Recurring caps on transaction volume, enforced by Grid.

use crate::error::GridResult;
use crate::validate::{require_currency, require_id, require_positive};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Window a spending limit resets over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitPeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl LimitPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitPeriod::Daily => "daily",
            LimitPeriod::Weekly => "weekly",
            LimitPeriod::Monthly => "monthly",
            LimitPeriod::Yearly => "yearly",
        }
    }
}

impl fmt::Display for LimitPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitStatus {
    Active,
    Paused,
    Cancelled,
}

impl LimitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitStatus::Active => "active",
            LimitStatus::Paused => "paused",
            LimitStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpendingLimitRequest {
    pub account_id: String,
    pub limit: f64,
    pub currency: String,
    pub period: LimitPeriod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl CreateSpendingLimitRequest {
    pub fn new(
        account_id: impl Into<String>,
        limit: f64,
        currency: impl Into<String>,
        period: LimitPeriod,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            limit,
            currency: currency.into(),
            period,
            description: None,
            metadata: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> GridResult<()> {
        require_id("accountId", &self.account_id)?;
        require_positive("limit", self.limit)?;
        require_currency(&self.currency)
    }
}

/// A spending limit as Grid reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingLimit {
    pub limit_id: String,
    pub account_id: String,
    pub limit: f64,
    pub currency: String,
    /// Kept as a string: Grid may add periods this client does not model
    pub period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: LimitStatus,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

pub type CreateSpendingLimitResponse = SpendingLimit;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSpendingLimitRequest {
    pub limit_id: String,
    pub account_id: String,
}

impl DeleteSpendingLimitRequest {
    pub fn new(account_id: impl Into<String>, limit_id: impl Into<String>) -> Self {
        Self {
            limit_id: limit_id.into(),
            account_id: account_id.into(),
        }
    }

    pub fn validate(&self) -> GridResult<()> {
        require_id("accountId", &self.account_id)?;
        require_id("limitId", &self.limit_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSpendingLimitResponse {
    pub success: bool,
    pub limit_id: String,
    pub deleted_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSpendingLimitsRequest {
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LimitStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl GetSpendingLimitsRequest {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            status: None,
            limit: None,
            offset: None,
        }
    }

    pub fn validate(&self) -> GridResult<()> {
        require_id("accountId", &self.account_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSpendingLimitsResponse {
    pub limits: Vec<SpendingLimit>,
    pub total: u64,
    pub has_more: bool,
}
