use std::path::PathBuf;

use anyhow::{Context, Result};
use runtime::AppConfig;
use serde::{Deserialize, Serialize};

/// Name of this module's section in the `modules` bag.
pub const MODULE_NAME: &str = "api_docs";

/// HTTP host configuration, read from `modules.api_docs`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ApiDocsConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Prefix of the docs endpoints, e.g. `/api` serves `/api/docs/openapi.json`.
    #[serde(default)]
    pub base_path: String,
    #[serde(default = "default_true")]
    pub enable_docs: bool,
    /// Directory with documentation UI assets; a built-in page is used when unset.
    #[serde(default)]
    pub docs_dir: Option<PathBuf>,
    /// Security schemes guarding the docs endpoints; any one of them is enough.
    #[serde(default)]
    pub docs_auth: Option<Vec<String>>,
    #[serde(default)]
    pub cors_enabled: bool,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8087".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_body_limit() -> usize {
    16 * 1024 * 1024
}

impl Default for ApiDocsConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            base_path: String::new(),
            enable_docs: true,
            docs_dir: None,
            docs_auth: None,
            cors_enabled: false,
            request_timeout_secs: default_timeout_secs(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl ApiDocsConfig {
    /// Module section of `app`, falling back to the server host/port for the
    /// bind address when the section does not set one.
    pub fn from_app_config(app: &AppConfig) -> Result<Self> {
        let mut cfg = match app.module_config::<Self>(MODULE_NAME) {
            Some(cfg) => cfg.with_context(|| format!("Invalid modules.{MODULE_NAME} section"))?,
            None => Self {
                bind_addr: format!("{}:{}", app.server.host, app.server.port),
                ..Self::default()
            },
        };
        cfg.base_path = normalize_base_path(&cfg.base_path);
        Ok(cfg)
    }
}

/// `""` or `"/"` → `""`; otherwise a leading slash and no trailing one.
pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn base_path_normalization() {
        assert_eq!(normalize_base_path(""), "");
        assert_eq!(normalize_base_path("/"), "");
        assert_eq!(normalize_base_path("api"), "/api");
        assert_eq!(normalize_base_path("/api/"), "/api");
    }

    #[test]
    fn missing_section_uses_server_address() {
        let mut app = AppConfig::default();
        app.server.host = "0.0.0.0".into();
        app.server.port = 9000;

        let cfg = ApiDocsConfig::from_app_config(&app).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:9000");
        assert!(cfg.enable_docs);
    }

    #[test]
    fn section_is_parsed_with_defaults() {
        let mut app = AppConfig::default();
        app.modules.insert(
            MODULE_NAME.to_string(),
            json!({"bind_addr": "127.0.0.1:1234", "base_path": "api/", "cors_enabled": true}),
        );

        let cfg = ApiDocsConfig::from_app_config(&app).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:1234");
        assert_eq!(cfg.base_path, "/api");
        assert!(cfg.cors_enabled);
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.docs_dir, None);
        assert_eq!(cfg.docs_auth, None);
    }

    #[test]
    fn docs_auth_lists_scheme_names() {
        let mut app = AppConfig::default();
        app.modules.insert(
            MODULE_NAME.to_string(),
            json!({"docs_auth": ["apiKey", "admin"]}),
        );

        let cfg = ApiDocsConfig::from_app_config(&app).unwrap();
        assert_eq!(
            cfg.docs_auth,
            Some(vec!["apiKey".to_string(), "admin".to_string()])
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut app = AppConfig::default();
        app.modules
            .insert(MODULE_NAME.to_string(), json!({"bind_adr": "typo"}));
        assert!(ApiDocsConfig::from_app_config(&app).is_err());
    }
}
