//! JSON response bodies.
//!
//! Addresses are rendered checksummed, timestamps as RFC 3339 UTC and an
//! on-chain timestamp of 0 as `null`.

use alloy::primitives::{Address, TxHash};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::credentials::{
    Credential, IssuedCredential, IssuedReceipt, Listing, ReceivedCredential, Verification,
};

pub(crate) const STATUS_SUCCESS: &str = "success";

fn rfc3339(date: Option<DateTime<Utc>>) -> Option<String> {
    date.map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

impl RootResponse {
    pub fn new() -> Self {
        let endpoints = BTreeMap::from([
            ("health", "/health"),
            ("contract_info", "/api/contract/info"),
            ("issue_credential", "/api/credentials/issue"),
            ("verify_credential", "/api/credentials/verify/{credential_id}"),
            ("get_credential", "/api/credentials/{credential_id}"),
            ("revoke_credential", "/api/credentials/revoke/{credential_id}"),
            ("authorize_issuer", "/api/issuers/authorize"),
            ("issuer_credentials", "/api/issuers/{issuer_address}/credentials"),
            ("recipient_credentials", "/api/recipients/{email}/credentials"),
            ("qr_code", "/api/credentials/{credential_id}/qr"),
            ("pdf", "/api/credentials/{credential_id}/pdf"),
            ("issuer_authorized", "/api/issuers/{issuer_address}/authorized"),
        ]);
        Self {
            message: "Credential Verification API",
            version: env!("CARGO_PKG_VERSION"),
            endpoints,
        }
    }
}

impl Default for RootResponse {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub blockchain_connected: bool,
}

#[derive(Debug, Serialize)]
pub struct ContractInfoResponse {
    pub contract_address: Option<String>,
    pub network: String,
    pub abi_available: bool,
}

#[derive(Debug, Serialize)]
pub struct IssueCredentialResponse {
    pub credential_id: String,
    pub transaction_hash: String,
    pub status: &'static str,
    pub message: &'static str,
    pub issue_date: String,
}

impl From<IssuedReceipt> for IssueCredentialResponse {
    fn from(receipt: IssuedReceipt) -> Self {
        Self {
            credential_id: receipt.credential_id,
            transaction_hash: receipt.transaction_hash.to_string(),
            status: STATUS_SUCCESS,
            message: "Credential issued successfully",
            issue_date: receipt.issue_date.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Record fields are only present when the credential exists.
#[derive(Debug, Serialize)]
pub struct VerifyCredentialResponse {
    pub credential_id: String,
    pub exists: bool,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<String>,
    pub message: &'static str,
}

impl VerifyCredentialResponse {
    pub fn new(credential_id: String, v: Verification) -> Self {
        let message = v.message();
        if !v.exists {
            return Self {
                credential_id,
                exists: false,
                is_valid: false,
                recipient_name: None,
                issuer_name: None,
                credential_type: None,
                issue_date: None,
                message,
            };
        }
        Self {
            credential_id,
            exists: true,
            is_valid: v.is_valid,
            recipient_name: Some(v.recipient_name),
            issuer_name: Some(v.issuer_name),
            credential_type: Some(v.credential_type),
            issue_date: rfc3339(v.issue_date),
            message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CredentialResponse {
    pub credential_id: String,
    pub recipient_name: String,
    pub recipient_email: String,
    pub issuer_name: String,
    pub credential_type: String,
    pub description: String,
    pub issue_date: Option<String>,
    pub issuer_address: String,
    pub is_valid: bool,
    pub metadata_uri: String,
}

impl From<Credential> for CredentialResponse {
    fn from(c: Credential) -> Self {
        Self {
            credential_id: c.credential_id,
            recipient_name: c.recipient_name,
            recipient_email: c.recipient_email,
            issuer_name: c.issuer_name,
            credential_type: c.credential_type,
            description: c.description,
            issue_date: rfc3339(c.issue_date),
            issuer_address: c.issuer_address.to_string(),
            is_valid: c.is_valid,
            metadata_uri: c.metadata_uri,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RevokeCredentialResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub credential_id: String,
    pub transaction_hash: String,
}

impl RevokeCredentialResponse {
    pub fn new(credential_id: String, tx_hash: TxHash) -> Self {
        Self {
            status: STATUS_SUCCESS,
            message: "Credential revoked successfully",
            credential_id,
            transaction_hash: tx_hash.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthorizeIssuerResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub issuer_address: String,
    pub transaction_hash: String,
}

impl AuthorizeIssuerResponse {
    pub fn new(issuer: Address, tx_hash: TxHash) -> Self {
        Self {
            status: STATUS_SUCCESS,
            message: "Issuer authorized successfully",
            issuer_address: issuer.to_string(),
            transaction_hash: tx_hash.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IssuedCredentialSummary {
    pub credential_id: String,
    pub recipient_name: String,
    pub recipient_email: String,
    pub credential_type: String,
    pub issue_date: Option<String>,
    pub is_valid: bool,
}

impl From<IssuedCredential> for IssuedCredentialSummary {
    fn from(c: IssuedCredential) -> Self {
        Self {
            credential_id: c.credential_id,
            recipient_name: c.recipient_name,
            recipient_email: c.recipient_email,
            credential_type: c.credential_type,
            issue_date: rfc3339(c.issue_date),
            is_valid: c.is_valid,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReceivedCredentialSummary {
    pub credential_id: String,
    pub issuer_name: String,
    pub credential_type: String,
    pub description: String,
    pub issue_date: Option<String>,
    pub is_valid: bool,
}

impl From<ReceivedCredential> for ReceivedCredentialSummary {
    fn from(c: ReceivedCredential) -> Self {
        Self {
            credential_id: c.credential_id,
            issuer_name: c.issuer_name,
            credential_type: c.credential_type,
            description: c.description,
            issue_date: rfc3339(c.issue_date),
            is_valid: c.is_valid,
        }
    }
}

/// `total` counts returned entries; `omitted` counts IDs that could not be loaded.
#[derive(Debug, Serialize)]
pub struct IssuerCredentialsResponse {
    pub issuer_address: String,
    pub credentials: Vec<IssuedCredentialSummary>,
    pub total: usize,
    pub omitted: usize,
}

impl IssuerCredentialsResponse {
    pub fn new(issuer: Address, listing: Listing<IssuedCredential>) -> Self {
        let credentials: Vec<_> = listing.items.into_iter().map(Into::into).collect();
        Self {
            issuer_address: issuer.to_string(),
            total: credentials.len(),
            credentials,
            omitted: listing.omitted,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipientCredentialsResponse {
    pub recipient_email: String,
    pub credentials: Vec<ReceivedCredentialSummary>,
    pub total: usize,
    pub omitted: usize,
}

impl RecipientCredentialsResponse {
    pub fn new(recipient_email: String, listing: Listing<ReceivedCredential>) -> Self {
        let credentials: Vec<_> = listing.items.into_iter().map(Into::into).collect();
        Self {
            recipient_email,
            total: credentials.len(),
            credentials,
            omitted: listing.omitted,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QrCodeResponse {
    pub credential_id: String,
    pub qr_code: String,
    pub verification_url: String,
}

#[derive(Debug, Serialize)]
pub struct IssuerAuthorizedResponse {
    pub issuer_address: String,
    pub is_authorized: bool,
}
