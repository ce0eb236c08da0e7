//! Credential records as read back from the registry contract.
//!
//! The contract returns flat tuples; these types give the positions names.
//! An unknown credential comes back as a zeroed record, which is detected via
//! the empty identifier and mapped to `None`.

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::Address;
use chrono::{DateTime, Utc};

use crate::blockchain::ChainError;

/// Full on-chain credential record (`getCredential`).
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub credential_id: String,
    pub recipient_name: String,
    pub recipient_email: String,
    pub issuer_name: String,
    pub credential_type: String,
    pub description: String,
    pub issue_date: Option<DateTime<Utc>>,
    pub issuer_address: Address,
    pub is_valid: bool,
    pub metadata_uri: String,
}

impl Credential {
    /// Decode the ten `getCredential` outputs. `Ok(None)` for the empty sentinel.
    pub fn from_outputs(values: &[DynSolValue]) -> Result<Option<Self>, ChainError> {
        let fields = Outputs::new("getCredential", values, 10)?;
        let credential_id = fields.string(0)?;
        if credential_id.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            credential_id,
            recipient_name: fields.string(1)?,
            recipient_email: fields.string(2)?,
            issuer_name: fields.string(3)?,
            credential_type: fields.string(4)?,
            description: fields.string(5)?,
            issue_date: fields.timestamp(6)?,
            issuer_address: fields.address(7)?,
            is_valid: fields.bool(8)?,
            metadata_uri: fields.string(9)?,
        }))
    }
}

/// Result of `verifyCredential`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Verification {
    pub exists: bool,
    pub is_valid: bool,
    pub recipient_name: String,
    pub issuer_name: String,
    pub credential_type: String,
    pub issue_date: Option<DateTime<Utc>>,
}

impl Verification {
    pub fn from_outputs(values: &[DynSolValue]) -> Result<Self, ChainError> {
        let fields = Outputs::new("verifyCredential", values, 6)?;
        Ok(Self {
            exists: fields.bool(0)?,
            is_valid: fields.bool(1)?,
            recipient_name: fields.string(2)?,
            issuer_name: fields.string(3)?,
            credential_type: fields.string(4)?,
            issue_date: fields.timestamp(5)?,
        })
    }

    /// Human-readable outcome.
    pub fn message(&self) -> &'static str {
        match (self.exists, self.is_valid) {
            (false, _) => "Credential not found",
            (true, true) => "Credential verified",
            (true, false) => "Credential has been revoked",
        }
    }
}

/// A credential as listed for its issuer.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedCredential {
    pub credential_id: String,
    pub recipient_name: String,
    pub recipient_email: String,
    pub credential_type: String,
    pub issue_date: Option<DateTime<Utc>>,
    pub is_valid: bool,
}

impl From<Credential> for IssuedCredential {
    fn from(c: Credential) -> Self {
        Self {
            credential_id: c.credential_id,
            recipient_name: c.recipient_name,
            recipient_email: c.recipient_email,
            credential_type: c.credential_type,
            issue_date: c.issue_date,
            is_valid: c.is_valid,
        }
    }
}

/// A credential as listed for its recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedCredential {
    pub credential_id: String,
    pub issuer_name: String,
    pub credential_type: String,
    pub description: String,
    pub issue_date: Option<DateTime<Utc>>,
    pub is_valid: bool,
}

impl From<Credential> for ReceivedCredential {
    fn from(c: Credential) -> Self {
        Self {
            credential_id: c.credential_id,
            issuer_name: c.issuer_name,
            credential_type: c.credential_type,
            description: c.description,
            issue_date: c.issue_date,
            is_valid: c.is_valid,
        }
    }
}

/// A best-effort list: entries that could not be fetched are counted, not returned.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub omitted: usize,
}

/// What a confirmed issue transaction produced.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedReceipt {
    pub credential_id: String,
    pub transaction_hash: alloy::primitives::TxHash,
    pub issue_date: DateTime<Utc>,
}

/// Input for issuing a credential.
#[derive(Debug, Clone, Default)]
pub struct NewCredential {
    pub recipient_name: String,
    pub recipient_email: String,
    pub issuer_name: String,
    pub credential_type: String,
    pub description: String,
    pub metadata_uri: Option<String>,
    pub issuer_address: String,
}

/// Positional accessor over decoded contract outputs.
struct Outputs<'a> {
    function: &'static str,
    values: &'a [DynSolValue],
}

impl<'a> Outputs<'a> {
    fn new(function: &'static str, values: &'a [DynSolValue], expected: usize) -> Result<Self, ChainError> {
        if values.len() != expected {
            return Err(ChainError::Call(format!(
                "{} returned {} values, expected {}",
                function,
                values.len(),
                expected
            )));
        }
        Ok(Self { function, values })
    }

    fn mismatch(&self, idx: usize, want: &str) -> ChainError {
        ChainError::Call(format!("{} output {} is not a {}", self.function, idx, want))
    }

    fn string(&self, idx: usize) -> Result<String, ChainError> {
        self.values[idx]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.mismatch(idx, "string"))
    }

    fn bool(&self, idx: usize) -> Result<bool, ChainError> {
        self.values[idx].as_bool().ok_or_else(|| self.mismatch(idx, "bool"))
    }

    fn address(&self, idx: usize) -> Result<Address, ChainError> {
        self.values[idx].as_address().ok_or_else(|| self.mismatch(idx, "address"))
    }

    /// Unix seconds; zero means "no date".
    fn timestamp(&self, idx: usize) -> Result<Option<DateTime<Utc>>, ChainError> {
        let (value, _) = self.values[idx]
            .as_uint()
            .ok_or_else(|| self.mismatch(idx, "uint"))?;
        if value.is_zero() {
            return Ok(None);
        }
        let secs = i64::try_from(value).map_err(|_| self.mismatch(idx, "timestamp"))?;
        DateTime::from_timestamp(secs, 0)
            .map(Some)
            .ok_or_else(|| self.mismatch(idx, "timestamp"))
    }
}

/// Decode a `string[]` output (credential ID lists).
pub fn string_list(function: &'static str, values: &[DynSolValue]) -> Result<Vec<String>, ChainError> {
    let fields = Outputs::new(function, values, 1)?;
    let items = fields.values[0]
        .as_array()
        .ok_or_else(|| fields.mismatch(0, "string[]"))?;
    items
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| fields.mismatch(i, "string"))
        })
        .collect()
}

/// Decode a single `bool` output.
pub fn single_bool(function: &'static str, values: &[DynSolValue]) -> Result<bool, ChainError> {
    Outputs::new(function, values, 1)?.bool(0)
}
