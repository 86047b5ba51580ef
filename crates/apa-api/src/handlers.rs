//! # Request Handlers
//!
//! Axum request handlers for the gateway API: widget script resolution,
//! operator settings with credential validation, and shopper identity
//! resolution on checkout steps.

use crate::state::AppState;
use apa_core::session::parse_cookie_header;
use apa_core::{
    keys_validated, resolve_region, resolve_widget_url, ApaError, Environment, MemorySession,
    Notice, NoticeBoard, RequestContext, SessionIdentity, Settings,
};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, error, info, instrument};

/// Cookie carrying the shopper session id
pub const SESSION_COOKIE: &str = "apa_session";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Widget script response
#[derive(Debug, Serialize)]
pub struct WidgetResponse {
    /// Script URL the storefront must embed
    pub widget_url: String,
    pub region: String,
    pub environment: String,
    pub login_app: bool,
}

/// Settings as shown to the operator (secret never echoed)
#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub payment_region: String,
    pub sandbox: bool,
    pub enable_login_app: bool,
    pub seller_id: String,
    /// Masked access key
    pub mws_access_key: String,
    pub secret_key_set: bool,
    pub keys_validated: bool,
}

/// Settings save response
#[derive(Debug, Serialize)]
pub struct SaveSettingsResponse {
    pub validated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub notices: Vec<Notice>,
}

/// Checkout identity response
#[derive(Debug, Serialize)]
pub struct CheckoutIdentityResponse {
    #[serde(flatten)]
    pub identity: SessionIdentity,
    /// Request was the redirect back from the provider
    pub redirect_back: bool,
    /// A shopper session was attached to the request
    pub session_active: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

fn apa_error_to_response(err: ApaError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "apa-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Resolve the widget script for the current settings
#[instrument(skip(state))]
pub async fn widget(
    State(state): State<AppState>,
) -> Result<Json<WidgetResponse>, (StatusCode, Json<ErrorResponse>)> {
    let settings = state.settings_snapshot();

    let resolved = resolve_region(&settings, state.storefront.as_ref()).and_then(|region| {
        resolve_widget_url(&settings, state.storefront.as_ref()).map(|url| (region, url))
    });

    let (region, widget_url) = resolved.map_err(|e| {
        error!("Widget URL resolution failed: {}", e);
        apa_error_to_response(e)
    })?;

    Ok(Json(WidgetResponse {
        widget_url,
        region: region.to_string(),
        environment: Environment::from_sandbox(settings.sandbox).to_string(),
        login_app: settings.enable_login_app,
    }))
}

/// Current settings
pub async fn get_settings(State(state): State<AppState>) -> Json<SettingsView> {
    let settings = state.settings_snapshot();

    Json(SettingsView {
        mws_access_key: settings.masked_access_key(),
        secret_key_set: !settings.secret_key.is_empty(),
        keys_validated: keys_validated(state.settings.as_ref()),
        payment_region: settings.payment_region,
        sandbox: settings.sandbox,
        enable_login_app: settings.enable_login_app,
        seller_id: settings.seller_id,
    })
}

/// Save settings and validate the API keys
#[instrument(skip_all)]
pub async fn save_settings(
    State(state): State<AppState>,
    payload: Result<Json<Settings>, JsonRejection>,
) -> Result<Json<SaveSettingsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(settings) = payload.map_err(|rejection| {
        apa_error_to_response(ApaError::InvalidRequest(rejection.body_text()))
    })?;

    settings.save(state.settings.as_ref()).map_err(|e| {
        error!("Failed to save settings: {}", e);
        apa_error_to_response(e)
    })?;

    info!(
        "Settings saved: region={}, sandbox={}, access_key={}, seller_id={}",
        settings.payment_region,
        settings.sandbox,
        settings.masked_access_key(),
        settings.seller_id
    );

    // Each save reports only its own notices
    let notices = NoticeBoard::new();
    let outcome = state
        .validator
        .validate_api_keys(state.settings.as_ref(), &notices)
        .await;

    Ok(Json(SaveSettingsResponse {
        validated: outcome.validated,
        message: outcome.message,
        notices: notices.take(),
    }))
}

/// Resolve shopper identity on a checkout step (query + cookies)
#[instrument(skip_all)]
pub async fn checkout_identity(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    resolve_identity(&state, query, HashMap::new(), &headers)
}

/// Resolve shopper identity on a posted checkout update (query + form + cookies)
#[instrument(skip_all)]
pub async fn checkout_identity_form(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    resolve_identity(&state, query, form, &headers)
}

/// Shared identity resolution. A shopper without a live session gets one
/// before resolving, so a first request that is already the redirect back
/// is captured. With sessions disabled every request passes through.
fn resolve_identity(
    state: &AppState,
    query: HashMap<String, String>,
    form: HashMap<String, String>,
    headers: &HeaderMap,
) -> Response {
    let cookie_header = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let (response, issued) = match &state.sessions {
        Some(sessions) => {
            let known = parse_cookie_header(cookie_header)
                .remove(SESSION_COOKIE)
                .filter(|id| sessions.contains(id));
            let (session_id, issued) = match known {
                Some(id) => (id, false),
                None => (sessions.start(), true),
            };

            let response = sessions.with_session(Some(&session_id), |session| {
                identity_response(query, form, cookie_header, session)
            });
            (response, issued.then_some(session_id))
        }
        None => (identity_response(query, form, cookie_header, None), None),
    };

    debug!(
        "Checkout identity: reference_id_present={}, access_token_present={}, redirect_back={}, session_active={}",
        !response.identity.reference_id.is_empty(),
        !response.identity.access_token.is_empty(),
        response.redirect_back,
        response.session_active
    );

    let mut http_response = Json(response).into_response();

    if let Some(id) = issued {
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id);
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            http_response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }

    http_response
}

fn identity_response(
    query: HashMap<String, String>,
    form: HashMap<String, String>,
    cookie_header: &str,
    session: Option<&mut MemorySession>,
) -> CheckoutIdentityResponse {
    let session_active = session.is_some();
    let mut ctx = RequestContext::new()
        .with_query(query)
        .with_form(form)
        .with_cookie_header(cookie_header);
    if let Some(session) = session {
        ctx = ctx.with_session(session);
    }

    CheckoutIdentityResponse {
        identity: ctx.identity(),
        redirect_back: ctx.is_redirect_back(),
        session_active,
    }
}
