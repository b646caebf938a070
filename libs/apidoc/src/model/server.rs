use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{DocError, Result};

/// A server the API is reachable at; `url` may be a template such as
/// `https://{region}.example.com`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Server {
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    variables: IndexMap<String, ServerVariable>,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
            variables: IndexMap::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare a substitution variable. The url must contain `{name}`.
    pub fn variable(mut self, name: impl Into<String>, variable: ServerVariable) -> Result<Self> {
        let name = name.into();
        if !self.url.contains(&format!("{{{name}}}")) {
            return Err(DocError::UnknownServerVariable {
                url: self.url,
                variable: name,
            });
        }
        self.variables.insert(name, variable);
        Ok(self)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerVariable {
    default: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    enum_values: Vec<String>,
}

impl ServerVariable {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            description: None,
            enum_values: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }
}
