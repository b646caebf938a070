use thiserror::Error;

use crate::security::SchemeVariant;

/// Errors raised while declaring or assembling a document.
///
/// Everything except [`DocError::Serialize`] is a configuration error: a
/// programmer mistake detected eagerly, never retried.
#[derive(Debug, Error)]
pub enum DocError {
    #[error("info.{field} must be set before the document can be built")]
    MissingInfoField { field: &'static str },

    #[error(
        "security scheme '{name}' is already registered as {existing}; cannot redeclare it as {requested}"
    )]
    SchemeConflict {
        name: String,
        existing: SchemeVariant,
        requested: SchemeVariant,
    },

    #[error("server variable '{variable}' does not appear in url '{url}'")]
    UnknownServerVariable { url: String, variable: String },

    #[error("oauth2 scheme '{scheme}': {flow} flow requires a non-empty {field}")]
    InvalidOAuthFlow {
        scheme: String,
        flow: &'static str,
        field: &'static str,
    },

    #[error("oauth2 scheme '{scheme}' declares no flows")]
    NoOAuthFlows { scheme: String },

    #[error("failed to serialize OpenAPI document: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl DocError {
    /// True for programmer errors in the declarations themselves.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, DocError::Serialize(_))
    }
}

pub type Result<T> = std::result::Result<T, DocError>;
