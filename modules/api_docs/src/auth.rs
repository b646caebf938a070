//! Authentication layer for routes declared under an auth requirement.
//!
//! Each registered security scheme gets one [`AuthProvider`]: the scheme says
//! where credentials live in a request, the user-supplied [`AuthValidator`]
//! decides whether they are good. A guarded route passes when any of its
//! schemes accepts the request; the resulting [`Principal`] is put into the
//! request extensions.
//!
//! JWT providers verify the bearer token's signature and registered claims
//! with `jsonwebtoken` before the validator runs; the decoded claims travel
//! on to the validator and the principal.

use std::sync::Arc;

use apidoc::{ApiKeyLocation, AuthRequirement, SchemeKind, SecurityScheme};
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use dashmap::DashMap;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::Value;

use crate::error::AppError;
use crate::request_id::XRequestId;

/// Credentials found in a request, before validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    ApiKey(String),
    Basic { username: String, password: String },
    Bearer(String),
    /// Bearer token whose signature and `exp` have been verified.
    Jwt { token: String, claims: Value },
}

/// The authenticated caller, available to handlers as `Extension<Principal>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    /// Scheme that accepted the request.
    pub scheme: String,
    pub subject: String,
    /// Decoded token claims, for JWT schemes.
    pub claims: Option<Value>,
}

impl Principal {
    pub fn new(scheme: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            subject: subject.into(),
            claims: None,
        }
    }

    pub fn with_claims(mut self, claims: Value) -> Self {
        self.claims = Some(claims);
        self
    }
}

/// Decides whether extracted credentials are valid.
pub trait AuthValidator: Send + Sync + 'static {
    /// `Some(subject)` on success.
    fn validate(&self, credentials: &Credentials) -> Option<String>;
}

impl<F> AuthValidator for F
where
    F: Fn(&Credentials) -> Option<String> + Send + Sync + 'static,
{
    fn validate(&self, credentials: &Credentials) -> Option<String> {
        self(credentials)
    }
}

/// Signature key and claim rules for JWT bearer tokens.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(key: DecodingKey, validation: Validation) -> Self {
        Self { key, validation }
    }

    /// HMAC-SHA256 shared secret with the default rules (`exp` required and checked).
    pub fn hs256(secret: &[u8]) -> Self {
        Self::new(
            DecodingKey::from_secret(secret),
            Validation::new(Algorithm::HS256),
        )
    }

    pub fn verify(&self, token: &str) -> Result<Value, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Value>(token, &self.key, &self.validation).map(|data| data.claims)
    }
}

pub struct AuthProvider {
    scheme: Arc<SecurityScheme>,
    validator: Box<dyn AuthValidator>,
    jwt: Option<JwtVerifier>,
}

impl AuthProvider {
    pub fn new(scheme: Arc<SecurityScheme>, validator: impl AuthValidator) -> Self {
        Self {
            scheme,
            validator: Box::new(validator),
            jwt: None,
        }
    }

    /// Provider whose bearer tokens must pass `verifier` before reaching `validator`.
    pub fn jwt(
        scheme: Arc<SecurityScheme>,
        verifier: JwtVerifier,
        validator: impl AuthValidator,
    ) -> Self {
        Self {
            jwt: Some(verifier),
            ..Self::new(scheme, validator)
        }
    }

    pub fn name(&self) -> &str {
        &self.scheme.name
    }

    pub fn scheme(&self) -> &Arc<SecurityScheme> {
        &self.scheme
    }

    /// Credentials for this scheme, if the request carries any.
    pub fn extract<B>(&self, req: &Request<B>) -> Option<Credentials> {
        match &self.scheme.kind {
            SchemeKind::ApiKey {
                location,
                parameter_name,
            } => {
                let value = match location {
                    ApiKeyLocation::Header => header_value(req.headers(), parameter_name),
                    ApiKeyLocation::Query => query_value(req.uri().query(), parameter_name),
                    ApiKeyLocation::Cookie => cookie_value(req.headers(), parameter_name),
                };
                value.map(Credentials::ApiKey)
            }
            SchemeKind::HttpBasic => {
                let encoded = authorization(req.headers(), "Basic")?;
                let decoded = STANDARD.decode(encoded).ok()?;
                let decoded = String::from_utf8(decoded).ok()?;
                let (username, password) = decoded.split_once(':')?;
                Some(Credentials::Basic {
                    username: username.to_string(),
                    password: password.to_string(),
                })
            }
            SchemeKind::HttpBearer { .. } | SchemeKind::OAuth2 { .. } => {
                authorization(req.headers(), "Bearer").map(|t| Credentials::Bearer(t.to_string()))
            }
        }
    }

    pub fn authenticate(&self, credentials: &Credentials) -> Option<Principal> {
        if let (Some(verifier), Credentials::Bearer(token)) = (&self.jwt, credentials) {
            let claims = match verifier.verify(token) {
                Ok(claims) => claims,
                Err(e) => {
                    tracing::debug!(scheme = %self.name(), error = %e, "JWT rejected");
                    return None;
                }
            };
            let verified = Credentials::Jwt {
                token: token.clone(),
                claims: claims.clone(),
            };
            let subject = self.validator.validate(&verified)?;
            return Some(Principal::new(self.name(), subject).with_claims(claims));
        }

        self.validator
            .validate(credentials)
            .map(|subject| Principal::new(self.name(), subject))
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name.to_ascii_lowercase().as_str())
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn query_value(query: Option<&str>, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
        .filter(|v| !v.is_empty())
}

/// Token of an `Authorization: <scheme> <token>` header; scheme is case-insensitive.
fn authorization<'a>(headers: &'a HeaderMap, scheme: &str) -> Option<&'a str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (given, token) = value.split_once(' ')?;
    let token = token.trim();
    (given.eq_ignore_ascii_case(scheme) && !token.is_empty()).then_some(token)
}

/// Scheme name → provider. Shared by every guard.
pub type AuthProviders = Arc<DashMap<String, Arc<AuthProvider>>>;

/// State of one guarded route.
#[derive(Clone)]
pub struct AuthGuard {
    pub providers: AuthProviders,
    pub requirement: Arc<AuthRequirement>,
}

/// Middleware enforcing an [`AuthRequirement`].
pub async fn auth_guard(
    State(guard): State<AuthGuard>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let mut presented = false;

    for name in &guard.requirement.schemes {
        let provider = guard.providers.get(name).map(|p| Arc::clone(p.value()));
        let Some(provider) = provider else {
            tracing::error!(scheme = %name, "No auth provider registered for scheme");
            continue;
        };
        let Some(credentials) = provider.extract(&req) else {
            continue;
        };
        presented = true;

        if let Some(principal) = provider.authenticate(&credentials) {
            tracing::debug!(scheme = %principal.scheme, subject = %principal.subject, "Authenticated request");
            req.extensions_mut().insert(principal);
            return next.run(req).await;
        }
    }

    if !presented && guard.requirement.optional {
        return next.run(req).await;
    }

    let request_id = req.extensions().get::<XRequestId>().map(|r| r.0.clone());
    let message = if presented {
        "invalid credentials"
    } else {
        "missing credentials"
    };
    let mut response =
        AppError::Unauthorized(message.to_string()).into_response_with(request_id.as_deref());
    if let Some(challenge) = challenge(&guard) {
        if let Ok(value) = challenge.parse() {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }
    }
    response
}

/// `WWW-Authenticate` challenge for the first HTTP-style scheme of the requirement.
fn challenge(guard: &AuthGuard) -> Option<String> {
    guard.requirement.schemes.iter().find_map(|name| {
        let provider = guard.providers.get(name)?;
        match provider.scheme().kind {
            SchemeKind::HttpBasic => Some(format!("Basic realm=\"{name}\"")),
            SchemeKind::HttpBearer { .. } | SchemeKind::OAuth2 { .. } => Some("Bearer".to_string()),
            SchemeKind::ApiKey { .. } => None,
        }
    })
}
