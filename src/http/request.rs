//! Request bodies and query strings accepted by the API.
//!
//! Addresses arrive as strings; normalization happens in the service so a
//! malformed address becomes a 400 before any chain call.

use serde::Deserialize;

use crate::credentials::NewCredential;

/// `POST /api/credentials/issue`
#[derive(Debug, Clone, Deserialize)]
pub struct IssueCredentialRequest {
    pub recipient_name: String,
    pub recipient_email: String,
    pub issuer_name: String,
    pub credential_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata_uri: Option<String>,
    pub issuer_address: String,
}

impl From<IssueCredentialRequest> for NewCredential {
    fn from(req: IssueCredentialRequest) -> Self {
        Self {
            recipient_name: req.recipient_name,
            recipient_email: req.recipient_email,
            issuer_name: req.issuer_name,
            credential_type: req.credential_type,
            description: req.description,
            metadata_uri: req.metadata_uri,
            issuer_address: req.issuer_address,
        }
    }
}

/// `POST /api/issuers/authorize`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeIssuerRequest {
    pub issuer_address: String,
    pub owner_address: String,
}

/// `?issuer_address=` on `POST /api/credentials/revoke/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RevokeQuery {
    pub issuer_address: String,
}
