//! # Account Types
//!
//! Account creation, OTP verification and profile records.

use crate::error::{GridError, GridResult};
use crate::validate::require_id;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// How a Grid account is controlled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Email-based account, activated with a one-time code
    Email,
    /// Multisig account controlled by signer keys
    Signers,
}

/// Account creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    #[serde(rename = "type")]
    pub account_type: AccountType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl CreateAccountRequest {
    /// Email-based account request
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            account_type: AccountType::Email,
            email: Some(email.into()),
            signers: None,
            threshold: None,
            memo: None,
        }
    }

    /// Signer-based account request
    pub fn signers(signers: Vec<String>, threshold: u32) -> Self {
        Self {
            account_type: AccountType::Signers,
            email: None,
            signers: Some(signers),
            threshold: Some(threshold),
            memo: None,
        }
    }

    /// Builder: set memo
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn validate(&self) -> GridResult<()> {
        match self.account_type {
            AccountType::Email => {
                let email = self.email.as_deref().map(str::trim).unwrap_or_default();
                if email.is_empty() {
                    return Err(GridError::validation("email is required for email accounts"));
                }
                if !email.contains('@') {
                    return Err(GridError::validation(format!(
                        "invalid email address: {}",
                        email
                    )));
                }
            }
            AccountType::Signers => {
                let signers = self.signers.as_deref().unwrap_or_default();
                if signers.is_empty() {
                    return Err(GridError::validation(
                        "at least one signer is required for signer accounts",
                    ));
                }
                if let Some(threshold) = self.threshold {
                    if threshold == 0 || threshold as usize > signers.len() {
                        return Err(GridError::validation(format!(
                            "threshold must be between 1 and {}",
                            signers.len()
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Lifecycle state of a newly created account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    PendingVerification,
    Pending,
    Active,
    Suspended,
}

/// Request/response envelope metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub request_id: String,
    pub timestamp: String,
}

/// Account creation payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedAccount {
    #[serde(rename = "type")]
    pub account_type: AccountType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub status: AccountStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otp_sent: Option<bool>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    /// Present for signer-based accounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl CreatedAccount {
    /// Identifier for follow-up calls: the address, else the email
    pub fn account_id(&self) -> Option<&str> {
        self.address.as_deref().or(self.email.as_deref())
    }
}

/// Account creation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAccountResponse {
    pub data: CreatedAccount,
    pub metadata: ResponseMetadata,
}

/// OTP verification request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

impl VerifyOtpRequest {
    pub fn new(email: impl Into<String>, otp: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            otp: otp.into(),
        }
    }

    pub fn validate(&self) -> GridResult<()> {
        if self.email.trim().is_empty() {
            return Err(GridError::validation("email is required"));
        }
        if self.otp.trim().is_empty() {
            return Err(GridError::validation("otp is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    Failed,
}

/// OTP verification payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtpVerification {
    pub email: String,
    pub status: VerificationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// OTP verification response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyOtpResponse {
    pub data: OtpVerification,
    pub metadata: ResponseMetadata,
}

impl VerifyOtpResponse {
    pub fn is_verified(&self) -> bool {
        self.data.status == VerificationStatus::Verified
    }
}

/// Account profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub account_id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub status: AccountStatus,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAccountInfoRequest {
    pub account_id: String,
}

impl GetAccountInfoRequest {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
        }
    }

    pub fn validate(&self) -> GridResult<()> {
        require_id("accountId", &self.account_id)
    }
}

/// Profile update; unset fields are left unchanged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl UpdateAccountRequest {
    pub fn validate(&self) -> GridResult<()> {
        require_id("accountId", &self.account_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountResponse {
    pub success: bool,
    pub account_id: String,
    pub updated_at: String,
    pub account: AccountInfo,
}
