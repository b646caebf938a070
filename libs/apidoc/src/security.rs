//! Security schemes and the name-keyed scheme table.
//!
//! Schemes are identified by name. Registering the same name twice is fine as
//! long as the variant agrees (the first instance is handed back); a different
//! variant under an existing name is a configuration error.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{DocError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Query,
    Header,
    Cookie,
}

/// Variant tag of a [`SecurityScheme`], used for conflict detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemeVariant {
    ApiKey,
    HttpBasic,
    HttpBearer,
    OAuth2,
}

impl fmt::Display for SchemeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SchemeVariant::ApiKey => "apiKey",
            SchemeVariant::HttpBasic => "http-basic",
            SchemeVariant::HttpBearer => "http-bearer",
            SchemeVariant::OAuth2 => "oauth2",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SchemeKind {
    ApiKey {
        location: ApiKeyLocation,
        parameter_name: String,
    },
    HttpBasic,
    HttpBearer {
        bearer_format: Option<String>,
    },
    OAuth2 {
        flows: OAuthFlows,
    },
}

impl SchemeKind {
    pub fn variant(&self) -> SchemeVariant {
        match self {
            SchemeKind::ApiKey { .. } => SchemeVariant::ApiKey,
            SchemeKind::HttpBasic => SchemeVariant::HttpBasic,
            SchemeKind::HttpBearer { .. } => SchemeVariant::HttpBearer,
            SchemeKind::OAuth2 { .. } => SchemeVariant::OAuth2,
        }
    }
}

/// A named Security Scheme Object.
#[derive(Clone, Debug, PartialEq)]
pub struct SecurityScheme {
    pub name: String,
    pub description: Option<String>,
    pub kind: SchemeKind,
}

impl SecurityScheme {
    fn with_kind(name: impl Into<String>, kind: SchemeKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
        }
    }

    /// API key whose parameter name equals the scheme name.
    pub fn api_key(name: impl Into<String>, location: ApiKeyLocation) -> Self {
        let name = name.into();
        let parameter_name = name.clone();
        Self::api_key_named(name, location, parameter_name)
    }

    /// API key read from a differently named parameter, e.g. `X-API-Key`.
    pub fn api_key_named(
        name: impl Into<String>,
        location: ApiKeyLocation,
        parameter_name: impl Into<String>,
    ) -> Self {
        Self::with_kind(
            name,
            SchemeKind::ApiKey {
                location,
                parameter_name: parameter_name.into(),
            },
        )
    }

    pub fn basic(name: impl Into<String>) -> Self {
        Self::with_kind(name, SchemeKind::HttpBasic)
    }

    pub fn bearer(name: impl Into<String>) -> Self {
        Self::with_kind(name, SchemeKind::HttpBearer { bearer_format: None })
    }

    /// Bearer scheme with `bearerFormat: JWT`.
    pub fn jwt(name: impl Into<String>) -> Self {
        Self::with_kind(
            name,
            SchemeKind::HttpBearer {
                bearer_format: Some("JWT".to_string()),
            },
        )
    }

    /// OAuth2 scheme. Flows are validated here, at declaration time.
    pub fn oauth2(name: impl Into<String>, flows: OAuthFlows) -> Result<Self> {
        let name = name.into();
        flows.validate(&name)?;
        Ok(Self::with_kind(name, SchemeKind::OAuth2 { flows }))
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn variant(&self) -> SchemeVariant {
        self.kind.variant()
    }
}

impl Serialize for SecurityScheme {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match &self.kind {
            SchemeKind::ApiKey {
                location,
                parameter_name,
            } => {
                map.serialize_entry("type", "apiKey")?;
                map.serialize_entry("name", parameter_name)?;
                map.serialize_entry("in", location)?;
            }
            SchemeKind::HttpBasic => {
                map.serialize_entry("type", "http")?;
                map.serialize_entry("scheme", "basic")?;
            }
            SchemeKind::HttpBearer { bearer_format } => {
                map.serialize_entry("type", "http")?;
                map.serialize_entry("scheme", "bearer")?;
                if let Some(format) = bearer_format {
                    map.serialize_entry("bearerFormat", format)?;
                }
            }
            SchemeKind::OAuth2 { flows } => {
                map.serialize_entry("type", "oauth2")?;
                map.serialize_entry("flows", flows)?;
            }
        }
        if let Some(description) = &self.description {
            map.serialize_entry("description", description)?;
        }
        map.end()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlows {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_credentials: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<OAuthFlow>,
}

impl OAuthFlows {
    pub fn implicit(mut self, flow: OAuthFlow) -> Self {
        self.implicit = Some(flow);
        self
    }

    pub fn password(mut self, flow: OAuthFlow) -> Self {
        self.password = Some(flow);
        self
    }

    pub fn client_credentials(mut self, flow: OAuthFlow) -> Self {
        self.client_credentials = Some(flow);
        self
    }

    pub fn authorization_code(mut self, flow: OAuthFlow) -> Self {
        self.authorization_code = Some(flow);
        self
    }

    fn validate(&self, scheme: &str) -> Result<()> {
        let flows = [
            ("implicit", &self.implicit, true, false),
            ("password", &self.password, false, true),
            ("clientCredentials", &self.client_credentials, false, true),
            ("authorizationCode", &self.authorization_code, true, true),
        ];

        let mut any = false;
        for (flow_name, flow, needs_auth_url, needs_token_url) in flows {
            let Some(flow) = flow else { continue };
            any = true;
            if needs_auth_url && is_blank(&flow.authorization_url) {
                return Err(DocError::InvalidOAuthFlow {
                    scheme: scheme.to_string(),
                    flow: flow_name,
                    field: "authorizationUrl",
                });
            }
            if needs_token_url && is_blank(&flow.token_url) {
                return Err(DocError::InvalidOAuthFlow {
                    scheme: scheme.to_string(),
                    flow: flow_name,
                    field: "tokenUrl",
                });
            }
        }

        if !any {
            return Err(DocError::NoOAuthFlows {
                scheme: scheme.to_string(),
            });
        }
        Ok(())
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// One OAuth2 flow. Which URLs are mandatory depends on the flow type.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
    pub scopes: IndexMap<String, String>,
}

impl OAuthFlow {
    pub fn implicit(authorization_url: impl Into<String>) -> Self {
        Self {
            authorization_url: Some(authorization_url.into()),
            ..Self::default()
        }
    }

    /// Flow that only needs a token URL (`password`, `clientCredentials`).
    pub fn token(token_url: impl Into<String>) -> Self {
        Self {
            token_url: Some(token_url.into()),
            ..Self::default()
        }
    }

    pub fn authorization_code(
        authorization_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            authorization_url: Some(authorization_url.into()),
            token_url: Some(token_url.into()),
            ..Self::default()
        }
    }

    pub fn refresh_url(mut self, url: impl Into<String>) -> Self {
        self.refresh_url = Some(url.into());
        self
    }

    pub fn scope(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.scopes.insert(name.into(), description.into());
        self
    }
}

/// Name → scheme table, in registration order.
#[derive(Debug, Default)]
pub struct SecuritySchemeRegistry {
    schemes: IndexMap<String, Arc<SecurityScheme>>,
}

impl SecuritySchemeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `scheme` under its name.
    ///
    /// Returns the already registered instance when the name exists with the
    /// same variant; a different variant fails and leaves the table untouched.
    pub fn register(&mut self, scheme: SecurityScheme) -> Result<Arc<SecurityScheme>> {
        if let Some(existing) = self.schemes.get(&scheme.name) {
            let requested = scheme.variant();
            if existing.variant() == requested {
                return Ok(Arc::clone(existing));
            }
            return Err(DocError::SchemeConflict {
                existing: existing.variant(),
                requested,
                name: scheme.name,
            });
        }

        tracing::debug!(scheme = %scheme.name, variant = %scheme.variant(), "Registered security scheme");
        let scheme = Arc::new(scheme);
        self.schemes
            .insert(scheme.name.clone(), Arc::clone(&scheme));
        Ok(scheme)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<SecurityScheme>> {
        self.schemes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<SecurityScheme>)> {
        self.schemes.iter().map(|(k, v)| (k.as_str(), v))
    }
}
