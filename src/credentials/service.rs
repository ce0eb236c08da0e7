//! Credential gateway service: one method per registry operation.
//!
//! Each method validates its input, makes exactly one contract call or
//! transaction (listings add one `getCredential` per ID) and reshapes the
//! outputs. Who may issue, revoke or authorize is decided by the contract.

use std::sync::Arc;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, TxHash};
use thiserror::Error;

use crate::blockchain::{normalize_address, ChainAdapter, ChainError};
use crate::credentials::id::{derive_credential_id, Clock, SystemClock};
use crate::credentials::types::{
    single_bool, string_list, Credential, IssuedCredential, IssuedReceipt, Listing, NewCredential,
    ReceivedCredential, Verification,
};
use crate::observability::metrics;
use crate::presentation::PresentationError;

/// Errors surfaced by gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request input rejected before any chain interaction.
    #[error("{0}")]
    Validation(String),

    /// No credential with the requested ID.
    #[error("Credential not found")]
    NotFound,

    #[error(transparent)]
    Chain(#[from] ChainError),

    /// QR or PDF rendering failed.
    #[error(transparent)]
    Presentation(#[from] PresentationError),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// The credential registry, as seen through the chain adapter.
#[derive(Clone)]
pub struct CredentialService {
    chain: Arc<ChainAdapter>,
    clock: Arc<dyn Clock>,
}

impl CredentialService {
    pub fn new(chain: Arc<ChainAdapter>) -> Self {
        Self::with_clock(chain, Arc::new(SystemClock))
    }

    pub fn with_clock(chain: Arc<ChainAdapter>, clock: Arc<dyn Clock>) -> Self {
        Self { chain, clock }
    }

    pub fn chain(&self) -> &ChainAdapter {
        &self.chain
    }

    /// Issue a credential. The ID is derived here from the input and the current time.
    pub async fn issue_credential(&self, input: NewCredential) -> GatewayResult<IssuedReceipt> {
        require_non_empty("recipient_name", &input.recipient_name)?;
        require_non_empty("issuer_name", &input.issuer_name)?;
        require_non_empty("credential_type", &input.credential_type)?;
        if !is_valid_email(&input.recipient_email) {
            return Err(GatewayError::Validation(format!(
                "Invalid recipient_email '{}'",
                input.recipient_email
            )));
        }
        let issuer = normalize_address(&input.issuer_address)?;
        self.require_signer("issuer_address", issuer)?;

        let issue_date = self.clock.now();
        let credential_id = derive_credential_id(
            &input.recipient_email,
            &input.credential_type,
            &input.issuer_name,
            issue_date,
        );

        let args = [
            DynSolValue::String(credential_id.clone()),
            DynSolValue::String(input.recipient_name),
            DynSolValue::String(input.recipient_email),
            DynSolValue::String(input.issuer_name),
            DynSolValue::String(input.credential_type),
            DynSolValue::String(input.description),
            DynSolValue::String(input.metadata_uri.unwrap_or_default()),
        ];
        let transaction_hash = self
            .chain
            .transact("issueCredential", &args)
            .await
            .inspect_err(|_| metrics::record_credential_operation("issue", false))?;

        tracing::info!(credential_id = %credential_id, tx_hash = %transaction_hash, issuer = %issuer, "Credential issued");
        metrics::record_credential_operation("issue", true);

        Ok(IssuedReceipt {
            credential_id,
            transaction_hash,
            issue_date,
        })
    }

    /// Check existence and validity. An unknown ID is a normal result, not an error.
    pub async fn verify_credential(&self, credential_id: &str) -> GatewayResult<Verification> {
        let outputs = self
            .chain
            .call("verifyCredential", &[DynSolValue::String(credential_id.to_string())])
            .await?;
        let verification = Verification::from_outputs(&outputs)?;
        tracing::debug!(credential_id, exists = verification.exists, is_valid = verification.is_valid, "Credential verified");
        Ok(verification)
    }

    /// Full record, or [`GatewayError::NotFound`] for the empty sentinel.
    pub async fn get_credential(&self, credential_id: &str) -> GatewayResult<Credential> {
        self.fetch_credential(credential_id)
            .await?
            .ok_or(GatewayError::NotFound)
    }

    async fn fetch_credential(&self, credential_id: &str) -> Result<Option<Credential>, ChainError> {
        let outputs = self
            .chain
            .call("getCredential", &[DynSolValue::String(credential_id.to_string())])
            .await?;
        Credential::from_outputs(&outputs)
    }

    /// Revoke a credential. Whether `issuer_address` may do so is the contract's call.
    pub async fn revoke_credential(&self, credential_id: &str, issuer_address: &str) -> GatewayResult<TxHash> {
        require_non_empty("credential_id", credential_id)?;
        let issuer = normalize_address(issuer_address)?;
        self.require_signer("issuer_address", issuer)?;

        let tx_hash = self
            .chain
            .transact("revokeCredential", &[DynSolValue::String(credential_id.to_string())])
            .await
            .inspect_err(|_| metrics::record_credential_operation("revoke", false))?;

        tracing::info!(credential_id, tx_hash = %tx_hash, "Credential revoked");
        metrics::record_credential_operation("revoke", true);
        Ok(tx_hash)
    }

    /// Authorize `issuer_address`, sent from `owner_address`.
    ///
    /// Returns the normalized issuer address with the transaction hash.
    pub async fn authorize_issuer(&self, issuer_address: &str, owner_address: &str) -> GatewayResult<(Address, TxHash)> {
        let issuer = normalize_address(issuer_address)?;
        let owner = normalize_address(owner_address)?;
        self.require_signer("owner_address", owner)?;

        let tx_hash = self
            .chain
            .transact("authorizeIssuer", &[DynSolValue::Address(issuer)])
            .await
            .inspect_err(|_| metrics::record_credential_operation("authorize", false))?;

        tracing::info!(issuer = %issuer, tx_hash = %tx_hash, "Issuer authorized");
        metrics::record_credential_operation("authorize", true);
        Ok((issuer, tx_hash))
    }

    /// Credentials issued by `issuer_address`.
    pub async fn get_issuer_credentials(&self, issuer_address: &str) -> GatewayResult<(Address, Listing<IssuedCredential>)> {
        let issuer = normalize_address(issuer_address)?;
        let outputs = self
            .chain
            .call("getIssuerCredentials", &[DynSolValue::Address(issuer)])
            .await?;
        let ids = string_list("getIssuerCredentials", &outputs)?;
        Ok((issuer, self.collect("issuer", ids).await))
    }

    /// Credentials received by `recipient_email`.
    pub async fn get_recipient_credentials(&self, recipient_email: &str) -> GatewayResult<Listing<ReceivedCredential>> {
        let outputs = self
            .chain
            .call(
                "getRecipientCredentials",
                &[DynSolValue::String(recipient_email.to_string())],
            )
            .await?;
        let ids = string_list("getRecipientCredentials", &outputs)?;
        Ok(self.collect("recipient", ids).await)
    }

    /// Whether `issuer_address` may issue credentials.
    pub async fn is_authorized_issuer(&self, issuer_address: &str) -> GatewayResult<(Address, bool)> {
        let issuer = normalize_address(issuer_address)?;
        let outputs = self
            .chain
            .call("isAuthorizedIssuer", &[DynSolValue::Address(issuer)])
            .await?;
        Ok((issuer, single_bool("isAuthorizedIssuer", &outputs)?))
    }

    /// Fetch each ID; failures and empty records are skipped and counted.
    async fn collect<T: From<Credential>>(&self, listing: &'static str, ids: Vec<String>) -> Listing<T> {
        let mut items = Vec::with_capacity(ids.len());
        let mut omitted = 0;
        for id in ids {
            match self.fetch_credential(&id).await {
                Ok(Some(credential)) => items.push(T::from(credential)),
                Ok(None) => {
                    tracing::warn!(listing, credential_id = %id, "Listed credential has no record");
                    omitted += 1;
                }
                Err(e) => {
                    tracing::warn!(listing, credential_id = %id, error = %e, "Skipping credential that failed to load");
                    omitted += 1;
                }
            }
        }
        if omitted > 0 {
            metrics::record_list_omitted(listing, omitted);
        }
        Listing { items, omitted }
    }

    /// The gateway signs every transaction with one key, so the claimed
    /// sender must be that key's address.
    fn require_signer(&self, field: &str, claimed: Address) -> GatewayResult<()> {
        match self.chain.signer_address() {
            Some(signer) if signer != claimed => Err(GatewayError::Validation(format!(
                "{} {} does not match the gateway signer {}",
                field, claimed, signer
            ))),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService")
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

fn require_non_empty(field: &str, value: &str) -> GatewayResult<()> {
    if value.trim().is_empty() {
        return Err(GatewayError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Syntactic check only: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}
