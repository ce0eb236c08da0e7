//! Route handlers. Each one extracts, calls the service once and shapes the JSON.

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};

use crate::credentials::GatewayError;
use crate::http::error::ApiError;
use crate::http::extract::{ApiJson, ApiQuery};
use crate::http::request::{AuthorizeIssuerRequest, IssueCredentialRequest, RevokeQuery};
use crate::http::response::{
    AuthorizeIssuerResponse, ContractInfoResponse, CredentialResponse, HealthResponse,
    IssueCredentialResponse, IssuerAuthorizedResponse, IssuerCredentialsResponse,
    QrCodeResponse, RecipientCredentialsResponse, RevokeCredentialResponse, RootResponse,
    VerifyCredentialResponse,
};
use crate::http::server::AppState;
use crate::presentation::{pdf, qr, PresentationError};

/// Reported when the address record names no network.
const DEFAULT_NETWORK: &str = "localhost";

type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse::new())
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        blockchain_connected: state.service.chain().is_connected().await,
    })
}

pub async fn contract_info(State(state): State<AppState>) -> Json<ContractInfoResponse> {
    let contract = state.service.chain().contract();
    Json(ContractInfoResponse {
        contract_address: contract.map(|c| c.address().to_string()),
        network: contract
            .and_then(|c| c.network())
            .unwrap_or(DEFAULT_NETWORK)
            .to_string(),
        abi_available: contract.is_some(),
    })
}

pub async fn issue_credential(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<IssueCredentialRequest>,
) -> ApiResult<IssueCredentialResponse> {
    let receipt = state.service.issue_credential(body.into()).await?;
    Ok(Json(receipt.into()))
}

pub async fn verify_credential(
    State(state): State<AppState>,
    Path(credential_id): Path<String>,
) -> ApiResult<VerifyCredentialResponse> {
    let verification = state.service.verify_credential(&credential_id).await?;
    Ok(Json(VerifyCredentialResponse::new(credential_id, verification)))
}

pub async fn get_credential(
    State(state): State<AppState>,
    Path(credential_id): Path<String>,
) -> ApiResult<CredentialResponse> {
    let credential = state.service.get_credential(&credential_id).await?;
    Ok(Json(credential.into()))
}

pub async fn revoke_credential(
    State(state): State<AppState>,
    Path(credential_id): Path<String>,
    ApiQuery(query): ApiQuery<RevokeQuery>,
) -> ApiResult<RevokeCredentialResponse> {
    let tx_hash = state
        .service
        .revoke_credential(&credential_id, &query.issuer_address)
        .await?;
    Ok(Json(RevokeCredentialResponse::new(credential_id, tx_hash)))
}

pub async fn authorize_issuer(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AuthorizeIssuerRequest>,
) -> ApiResult<AuthorizeIssuerResponse> {
    let (issuer, tx_hash) = state
        .service
        .authorize_issuer(&body.issuer_address, &body.owner_address)
        .await?;
    Ok(Json(AuthorizeIssuerResponse::new(issuer, tx_hash)))
}

pub async fn issuer_credentials(
    State(state): State<AppState>,
    Path(issuer_address): Path<String>,
) -> ApiResult<IssuerCredentialsResponse> {
    let (issuer, listing) = state.service.get_issuer_credentials(&issuer_address).await?;
    Ok(Json(IssuerCredentialsResponse::new(issuer, listing)))
}

pub async fn recipient_credentials(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<RecipientCredentialsResponse> {
    let listing = state.service.get_recipient_credentials(&email).await?;
    Ok(Json(RecipientCredentialsResponse::new(email, listing)))
}

pub async fn issuer_authorized(
    State(state): State<AppState>,
    Path(issuer_address): Path<String>,
) -> ApiResult<IssuerAuthorizedResponse> {
    let (issuer, is_authorized) = state.service.is_authorized_issuer(&issuer_address).await?;
    Ok(Json(IssuerAuthorizedResponse {
        issuer_address: issuer.to_string(),
        is_authorized,
    }))
}

pub async fn credential_qr(
    State(state): State<AppState>,
    Path(credential_id): Path<String>,
) -> ApiResult<QrCodeResponse> {
    let verification = state.service.verify_credential(&credential_id).await?;
    if !verification.exists {
        return Err(GatewayError::NotFound.into());
    }

    let verification_url = qr::verification_url(&state.frontend_url, &credential_id)?;
    let qr_code = qr::png_data_uri(&verification_url)?;
    Ok(Json(QrCodeResponse {
        credential_id,
        qr_code,
        verification_url,
    }))
}

pub async fn credential_pdf(
    State(state): State<AppState>,
    Path(credential_id): Path<String>,
) -> Result<Response, ApiError> {
    let credential = state.service.get_credential(&credential_id).await?;
    let verification_url = qr::verification_url(&state.frontend_url, &credential_id)?;

    let bytes = tokio::task::spawn_blocking(move || {
        pdf::render_certificate(&credential, &verification_url)
    })
    .await
    .map_err(|e| PresentationError::Pdf(e.to_string()))??;

    let disposition = format!("attachment; filename=\"credential-{}.pdf\"", credential_id);
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"credential.pdf\""));

    tracing::debug!(credential_id = %credential_id, size = bytes.len(), "Certificate rendered");
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
