//! Operation records and the builder used to declare them.
//!
//! An [`OperationBuilder`] collects everything the author says about one
//! route; declaring it on a registry node turns it into an
//! [`OperationRecord`] with absolute documented and real paths.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::model::{Content, ParamLocation, Parameter, RequestBody, Response};
use crate::schema::SchemaType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One HTTP method on one documented path.
///
/// Identity is `(method, documented_path)`. `real_path` is where the router
/// dispatches it and differs from the documented path under undocumented
/// prefixes.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationRecord {
    pub method: HttpMethod,
    pub documented_path: String,
    pub real_path: String,
    pub operation_id: Option<String>,
    pub summary: String,
    pub description: String,
    pub tags: Vec<String>,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    pub responses: IndexMap<u16, Response>,
    /// Required scheme names; `None` means no `security` key at all.
    pub security: Option<Vec<String>>,
    /// Opaque reference to the handler mounted for this record.
    pub handler_id: String,
    pub(crate) sequence: u64,
}

impl OperationRecord {
    /// Declaration order across the whole registry.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Declaration-side description of an operation. `path` is relative to the
/// node it gets declared on.
#[derive(Clone, Debug)]
pub struct OperationSpec {
    pub method: HttpMethod,
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: String,
    pub description: String,
    pub tags: Vec<String>,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    pub responses: IndexMap<u16, Response>,
}

/// By-value builder for an [`OperationSpec`].
///
/// ```
/// use apidoc::OperationBuilder;
///
/// let op = OperationBuilder::get("/pets/{id}")
///     .summary("Find pet by id")
///     .path_param("id", "Pet id")
///     .json_response(200, "The pet", &serde_json::json!({"id": 1, "name": "Rex"}))
///     .response(404, "No such pet", None);
/// assert_eq!(op.spec().parameters.len(), 1);
/// ```
#[derive(Clone, Debug)]
#[must_use]
pub struct OperationBuilder {
    spec: OperationSpec,
}

impl OperationBuilder {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            spec: OperationSpec {
                method,
                path: path.into(),
                operation_id: None,
                summary: String::new(),
                description: String::new(),
                tags: Vec::new(),
                parameters: Vec::new(),
                request_body: None,
                responses: IndexMap::new(),
            },
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn spec(&self) -> &OperationSpec {
        &self.spec
    }

    pub fn into_spec(self) -> OperationSpec {
        self.spec
    }

    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.spec.operation_id = Some(id.into());
        self
    }

    pub fn summary(mut self, text: impl Into<String>) -> Self {
        self.spec.summary = text.into();
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.spec.description = text.into();
        self
    }

    /// Reference a tag by name. Duplicate references are ignored.
    pub fn tag(mut self, tag: impl AsRef<str>) -> Self {
        let name = tag.as_ref();
        if !self.spec.tags.iter().any(|t| t == name) {
            self.spec.tags.push(name.to_string());
        }
        self
    }

    pub fn tags<I, T>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        tags.into_iter().fold(self, |builder, tag| builder.tag(tag))
    }

    pub fn param(mut self, param: Parameter) -> Self {
        self.spec.parameters.push(param);
        self
    }

    pub fn path_param(self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.param(Parameter::path(name).description(description))
    }

    pub fn query_param(
        self,
        name: impl Into<String>,
        required: bool,
        description: impl Into<String>,
    ) -> Self {
        self.param(
            Parameter::new(ParamLocation::Query, name)
                .required(required)
                .description(description),
        )
    }

    /// Typed query parameter, e.g. `limit` as an integer.
    pub fn query_param_typed(
        self,
        name: impl Into<String>,
        param_type: SchemaType,
        required: bool,
        description: impl Into<String>,
    ) -> Self {
        self.param(
            Parameter::query(name)
                .param_type(param_type)
                .required(required)
                .description(description),
        )
    }

    pub fn request_body(mut self, body: RequestBody) -> Self {
        self.spec.request_body = Some(body);
        self
    }

    /// Required JSON request body documented by `example`.
    pub fn json_request<T: Serialize + ?Sized>(
        self,
        example: &T,
        description: impl Into<String>,
    ) -> Self {
        self.request_body(RequestBody::new(Content::json(example)).description(description))
    }

    /// Add a response; a second entry for the same status replaces the first.
    pub fn response(
        mut self,
        status: u16,
        description: impl Into<String>,
        content: Option<Content>,
    ) -> Self {
        let response = Response {
            description: description.into(),
            content,
        };
        self.spec.responses.insert(status, response);
        self
    }

    pub fn json_response<T: Serialize + ?Sized>(
        self,
        status: u16,
        description: impl Into<String>,
        example: &T,
    ) -> Self {
        self.response(status, description, Some(Content::json(example)))
    }

    pub fn text_response(
        self,
        status: u16,
        description: impl Into<String>,
        example: impl Into<String>,
    ) -> Self {
        self.response(status, description, Some(Content::text(example)))
    }
}

/// Stable identifier for the handler mounted at `(method, real_path)`,
/// e.g. `GET:_pets__id_`.
pub(crate) fn handler_id(method: HttpMethod, real_path: &str) -> String {
    format!(
        "{}:{}",
        method,
        real_path.replace(['/', '{', '}'], "_")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Tag;
    use serde_json::json;

    #[test]
    fn builder_collects_metadata() {
        let builder = OperationBuilder::post("/pets")
            .operation_id("createPet")
            .summary("Create pet")
            .description("Adds a pet to the store")
            .tag("pets")
            .tag(Tag::new("pets"))
            .json_request(&json!({"name": "Rex"}), "New pet")
            .json_response(201, "Created", &json!({"id": 1}))
            .response(400, "Invalid pet", None);

        let spec = builder.spec();
        assert_eq!(spec.method, HttpMethod::Post);
        assert_eq!(spec.path, "/pets");
        assert_eq!(spec.operation_id.as_deref(), Some("createPet"));
        assert_eq!(spec.tags, vec!["pets".to_string()]);
        assert!(spec.request_body.as_ref().is_some_and(|b| b.required));
        assert_eq!(spec.responses.keys().copied().collect::<Vec<_>>(), vec![201, 400]);
    }

    #[test]
    fn path_params_are_always_required() {
        let spec = OperationBuilder::get("/pets/{id}")
            .param(Parameter::path("id").required(false))
            .query_param("limit", false, "Max items")
            .into_spec();

        assert!(spec.parameters[0].is_required());
        assert!(!spec.parameters[1].is_required());
    }

    #[test]
    fn later_response_for_same_status_replaces_earlier() {
        let spec = OperationBuilder::get("/")
            .response(200, "first", None)
            .text_response(200, "second", "ok")
            .into_spec();
        assert_eq!(spec.responses.len(), 1);
        assert_eq!(spec.responses[&200].description, "second");
    }

    #[test]
    fn handler_id_is_path_safe() {
        assert_eq!(handler_id(HttpMethod::Get, "/pets/{id}"), "GET:_pets__id_");
        assert_eq!(handler_id(HttpMethod::Delete, "/"), "DELETE:_");
    }

    #[test]
    fn methods_serialize_lowercase() {
        assert_eq!(serde_json::to_value(HttpMethod::Patch).unwrap(), json!("patch"));
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
    }
}
