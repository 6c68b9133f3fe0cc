//! # Request Handlers
//!
//! Axum request handlers for checkout pages, blink actions, image uploads
//! and the wallet proxy.

use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use checkout_core::{
    validate_new_page, ActionGetResponse, ActionPostRequest, ActionPostResponse, ActionsJson,
    Asset, CheckoutError, CheckoutPage, FieldErrors, NewCheckoutPage, UploadedAsset,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Created checkout page
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePageResponse {
    pub id: i32,
    pub checkout_path: String,
    pub checkout_url: String,
    /// Solana Actions endpoint wallets unfurl into a blink
    pub blink_url: String,
}

/// Body of `POST /api/authenticate`
#[derive(Debug, Default, Deserialize)]
pub struct AuthenticateRequest {
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
            fields: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Map a checkout error onto its HTTP status and JSON body
pub fn error_response(err: CheckoutError) -> ApiError {
    let code = err.status_code();
    let mut response = ErrorResponse::new(err.to_string(), code);
    if let CheckoutError::Validation(fields) = err {
        response.error = "Validation failed".to_string();
        response.fields = Some(fields);
    }
    (status(code), Json(response))
}

/// Same status as `err`, reported under a fixed summary with the cause as details
fn error_with_summary(summary: &str, err: CheckoutError) -> ApiError {
    let code = err.status_code();
    (
        status(code),
        Json(ErrorResponse::new(summary, code).with_details(err.to_string())),
    )
}

/// Ids that are not integers can never match a page
fn parse_page_id(raw: &str) -> Result<i32, ApiError> {
    raw.trim().parse().map_err(|_| {
        warn!("Checkout page not found for id: {}", raw);
        error_response(CheckoutError::PageNotFound { id: 0 })
    })
}

async fn load_page(state: &AppState, raw_id: &str) -> Result<CheckoutPage, ApiError> {
    let id = parse_page_id(raw_id)?;
    state.pages.require(id).await.map_err(|e| {
        if matches!(e, CheckoutError::PageNotFound { .. }) {
            warn!("Checkout page not found for id: {}", id);
        } else {
            error!("Failed to load checkout page {}: {}", id, e);
        }
        error_response(e)
    })
}

/// Unwrap a JSON body, reporting axum's rejection as a 400 `ErrorResponse`
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        warn!("Rejected request body: {}", rejection.body_text());
        (
            StatusCode::BAD_REQUEST,
            Json(
                ErrorResponse::new("Invalid request body", 400)
                    .with_details(rejection.body_text()),
            ),
        )
    })
}

fn bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            error_response(CheckoutError::Unauthorized("No token provided".to_string()))
        })
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "usdc-checkout",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Blink URL-mapping rules
pub async fn actions_json() -> Json<ActionsJson> {
    Json(ActionsJson::default())
}

/// CORS preflight for the actions endpoints
pub async fn action_preflight() -> Json<serde_json::Value> {
    Json(json!({}))
}

/// Blink metadata for a checkout page
#[instrument(skip(state))]
pub async fn get_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ActionGetResponse>, ApiError> {
    let page = load_page(&state, &id).await?;
    Ok(Json(ActionGetResponse::for_page(&page)))
}

/// Build the unsigned purchase transaction for a buyer
#[instrument(skip(state, payload))]
pub async fn post_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ActionPostRequest>, JsonRejection>,
) -> Result<Json<ActionPostResponse>, ApiError> {
    let request = json_body(payload)?;
    info!("Received purchase request for page {} from {}", id, request.account);
    let page = load_page(&state, &id).await?;

    let purchase = state
        .rail
        .build_purchase(&page, &request.account)
        .await
        .map_err(|e| {
            error!("Error creating transaction on {}: {}", state.rail.network(), e);
            error_with_summary("Failed to create transaction", e)
        })?;

    info!(
        "Transaction created: {} base units to {}",
        purchase.amount, purchase.recipient
    );
    Ok(Json(ActionPostResponse::from_purchase(purchase)))
}

/// Persist a new checkout page
#[instrument(skip(state, payload))]
pub async fn create_page(
    State(state): State<AppState>,
    payload: Result<Json<NewCheckoutPage>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatePageResponse>), ApiError> {
    let page = json_body(payload)?;
    validate_new_page(&page).map_err(error_response)?;

    let store_name = page.store_name.clone();
    let id = state.pages.create(page).await.map_err(|e| {
        error!("Failed to save checkout page: {}", e);
        error_response(e)
    })?;

    info!("Created checkout page {} for {}", id, store_name);
    Ok((
        StatusCode::CREATED,
        Json(CreatePageResponse {
            id,
            checkout_path: checkout_core::checkout_path(id),
            checkout_url: state.checkout_url(id),
            blink_url: state.blink_url(id),
        }),
    ))
}

/// Page record for the checkout renderer
#[instrument(skip(state))]
pub async fn get_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CheckoutPage>, ApiError> {
    load_page(&state, &id).await.map(Json)
}

/// Forward the multipart `file` field to the image host
#[instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadedAsset>, ApiError> {
    let mut asset = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error_response(CheckoutError::InvalidRequest(format!(
            "Malformed multipart body: {}",
            e
        )))
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| {
            error_response(CheckoutError::InvalidRequest(format!(
                "Failed to read file: {}",
                e
            )))
        })?;

        let mut file = Asset::new(file_name, bytes.to_vec());
        if let Some(content_type) = content_type {
            file = file.with_content_type(content_type);
        }
        asset = Some(file);
        break;
    }

    let asset = asset.filter(|a| !a.is_empty()).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("No file uploaded", 400)),
        )
    })?;

    let uploader = state.uploader.as_ref().ok_or_else(|| {
        error!("Upload failed: image host is not configured");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(
                ErrorResponse::new("Upload failed", 500)
                    .with_details("image host is not configured"),
            ),
        )
    })?;

    let uploaded = uploader.upload(&asset).await.map_err(|e| {
        error!("Upload failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Upload failed", 500).with_details(e.to_string())),
        )
    })?;

    Ok(Json(uploaded))
}

/// Exchange a Google id token for Okto auth tokens
#[instrument(skip(state, payload))]
pub async fn authenticate(
    State(state): State<AppState>,
    payload: Result<Json<AuthenticateRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request = json_body(payload)?;
    if !state.okto.is_configured() {
        error!("Missing API key");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Missing API key", 500)),
        ));
    }

    let id_token = request.id_token.filter(|t| !t.is_empty()).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Missing id_token", 400)),
        )
    })?;

    state
        .okto
        .authenticate(&id_token)
        .await
        .map(Json)
        .map_err(error_response)
}

#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let authorization = bearer(&headers)?;
    let upstream = state
        .okto
        .logout(authorization)
        .await
        .map_err(error_response)?;

    Ok((upstream, Json(json!({ "message": "Logout successful" }))))
}

#[instrument(skip(state, headers))]
pub async fn portfolio(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let authorization = bearer(&headers)?;
    state
        .okto
        .portfolio(authorization)
        .await
        .map(Json)
        .map_err(error_response)
}
