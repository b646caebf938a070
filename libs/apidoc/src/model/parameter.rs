use serde::Serialize;

use crate::schema::SchemaType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
}

/// Parameter of an operation. Required by default.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub location: ParamLocation,
    pub name: String,
    pub param_type: SchemaType,
    pub required: bool,
    pub description: Option<String>,
    pub example: Option<String>,
}

impl Parameter {
    pub fn new(location: ParamLocation, name: impl Into<String>) -> Self {
        Self {
            location,
            name: name.into(),
            param_type: SchemaType::String,
            required: true,
            description: None,
            example: None,
        }
    }

    pub fn path(name: impl Into<String>) -> Self {
        Self::new(ParamLocation::Path, name)
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::new(ParamLocation::Query, name)
    }

    pub fn header(name: impl Into<String>) -> Self {
        Self::new(ParamLocation::Header, name)
    }

    pub fn cookie(name: impl Into<String>) -> Self {
        Self::new(ParamLocation::Cookie, name)
    }

    pub fn param_type(mut self, param_type: SchemaType) -> Self {
        self.param_type = param_type;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// OpenAPI requires all path params to be required.
    pub fn is_required(&self) -> bool {
        self.location == ParamLocation::Path || self.required
    }
}
