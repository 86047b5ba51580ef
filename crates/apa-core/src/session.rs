//! # Shopper Session Identity
//!
//! Correlates a shopper's checkout across redirects to and from the
//! provider's hosted pages. Two identifiers are tracked per session:
//! the order reference id and the login access token.
//!
//! Candidate values come from the current request. They are written to the
//! session only on the redirect back from the provider (the request carries
//! the `amazon_payments_advanced` marker), so a stray parameter on any other
//! request can never replace an identifier already held by the session.
//!
//! Precedence: posted `post_data` > request parameter > cookie (access token
//! only) > session value > empty string.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request parameter carrying the order reference id
pub const REFERENCE_ID_PARAM: &str = "amazon_reference_id";
/// Request parameter carrying the login access token
pub const ACCESS_TOKEN_PARAM: &str = "access_token";
/// Cookie set by the provider's login widget
pub const ACCESS_TOKEN_COOKIE: &str = "amazon_Login_accessToken";
/// Posted field holding the serialized checkout form
pub const POST_DATA_FIELD: &str = "post_data";
/// Query marker present on the redirect back from the provider
pub const REDIRECT_MARKER: &str = "amazon_payments_advanced";

const SESSION_KEY_PREFIX: &str = "amazon_";

/// Key-value store scoped to one shopper's browsing session
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory session storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySession {
    values: HashMap<String, String>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// Identifiers tracked in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    ReferenceId,
    AccessToken,
}

impl SessionKey {
    /// Recognise a logical key, with or without the storage prefix
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "reference_id" | "amazon_reference_id" => Some(SessionKey::ReferenceId),
            "access_token" | "amazon_access_token" => Some(SessionKey::AccessToken),
            _ => None,
        }
    }

    /// Key under which the value lives in the session store
    pub fn storage_key(&self) -> &'static str {
        match self {
            SessionKey::ReferenceId => "amazon_reference_id",
            SessionKey::AccessToken => "amazon_access_token",
        }
    }
}

/// Prefix a session key with `amazon_` unless it already carries it
pub fn normalize_session_key(key: &str) -> String {
    if let Some(known) = SessionKey::parse(key) {
        return known.storage_key().to_string();
    }
    if key.starts_with(SESSION_KEY_PREFIX) {
        key.to_string()
    } else {
        format!("{}{}", SESSION_KEY_PREFIX, key)
    }
}

/// Resolved identifiers for one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub reference_id: String,
    pub access_token: String,
}

/// Everything the resolver may read from the current request.
///
/// The session handle is optional: when the session subsystem is not yet
/// available the resolver passes candidates through untouched.
#[derive(Default)]
pub struct RequestContext<'s> {
    query: HashMap<String, String>,
    form: HashMap<String, String>,
    cookies: HashMap<String, String>,
    session: Option<&'s mut dyn SessionStore>,
}

impl<'s> RequestContext<'s> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: replace all query parameters
    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    /// Builder: add one query parameter
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Builder: replace all posted form fields
    pub fn with_form(mut self, form: HashMap<String, String>) -> Self {
        self.form = form;
        self
    }

    /// Builder: add one posted form field
    pub fn with_form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(name.into(), value.into());
        self
    }

    /// Builder: add one cookie
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Builder: add cookies from a raw `Cookie` header
    pub fn with_cookie_header(mut self, header: &str) -> Self {
        self.cookies.extend(parse_cookie_header(header));
        self
    }

    /// Builder: attach the shopper's session
    pub fn with_session(mut self, session: &'s mut dyn SessionStore) -> Self {
        self.session = Some(session);
        self
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Request parameter lookup; posted fields shadow query parameters
    pub fn request_param(&self, name: &str) -> Option<&str> {
        self.form
            .get(name)
            .or_else(|| self.query.get(name))
            .map(String::as_str)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Whether this request is the redirect back from the provider
    pub fn is_redirect_back(&self) -> bool {
        self.query
            .get(REDIRECT_MARKER)
            .map(|v| is_truthy(v))
            .unwrap_or(false)
    }

    /// Reference id carried by the request itself, before the session is consulted
    pub fn reference_id_candidate(&self) -> String {
        let mut candidate = self
            .request_param(REFERENCE_ID_PARAM)
            .filter(|v| !v.is_empty())
            .unwrap_or_default()
            .to_string();

        if let Some(post_data) = self.form.get(POST_DATA_FIELD) {
            if let Some(posted) = form_value(post_data, REFERENCE_ID_PARAM) {
                candidate = posted;
            }
        }

        candidate
    }

    /// Access token carried by the request itself, before the session is consulted
    pub fn access_token_candidate(&self) -> String {
        self.request_param(ACCESS_TOKEN_PARAM)
            .filter(|v| !v.is_empty())
            .or_else(|| self.cookie(ACCESS_TOKEN_COOKIE).filter(|v| !v.is_empty()))
            .unwrap_or_default()
            .to_string()
    }

    /// Reconcile a candidate value for `key` with the shopper's session.
    ///
    /// Unknown keys and a missing session pass the candidate through.
    /// A non-empty candidate is stored only on the redirect back; an empty
    /// one is replaced by the stored value when there is one.
    pub fn resolve_session_value(&mut self, key: &str, candidate: String) -> String {
        if SessionKey::parse(key).is_none() {
            return candidate;
        }

        let redirect_back = self.is_redirect_back();
        let Some(session) = self.session.as_deref_mut() else {
            return candidate;
        };

        let storage_key = normalize_session_key(key);

        if !candidate.is_empty() {
            if redirect_back {
                session.set(&storage_key, &candidate);
            }
        } else if let Some(stored) = session.get(&storage_key).filter(|v| !v.is_empty()) {
            return stored;
        }

        candidate
    }

    /// Resolved order reference id
    pub fn reference_id(&mut self) -> String {
        let candidate = self.reference_id_candidate();
        self.resolve_session_value(REFERENCE_ID_PARAM, candidate)
    }

    /// Resolved login access token
    pub fn access_token(&mut self) -> String {
        let candidate = self.access_token_candidate();
        self.resolve_session_value(ACCESS_TOKEN_PARAM, candidate)
    }

    /// Resolve both identifiers
    pub fn identity(&mut self) -> SessionIdentity {
        SessionIdentity {
            reference_id: self.reference_id(),
            access_token: self.access_token(),
        }
    }
}

/// Non-empty and not `"0"`
fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0"
}

/// Extract a field from a URL-encoded form body; the last occurrence wins
fn form_value(body: &str, name: &str) -> Option<String> {
    form_urlencoded::parse(body.as_bytes())
        .filter(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .last()
}

/// Parse a `Cookie` request header into name/value pairs (values percent-decoded)
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| !name.trim().is_empty())
        .map(|(name, value)| {
            let value = percent_decode_str(value.trim()).decode_utf8_lossy();
            (name.trim().to_string(), value.into_owned())
        })
        .collect()
}
