//! Document assembly.
//!
//! [`OpenApiDoc`] is the explicitly constructed root every declaration goes
//! through. Its lifecycle is init, registrations, then any number of
//! [`OpenApiDoc::build`] calls; builds are read-only and deterministic.

use std::collections::BTreeMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::model::{
    Content, ExternalDocs, Info, InfoObject, ParamLocation, Parameter, RequestBody, Response,
    Server, Tag,
};
use crate::operation::{HttpMethod, OperationBuilder, OperationRecord};
use crate::registry::{dedup_first_wins, AuthRequirement, NodeId, RouteRegistry};
use crate::schema::{infer_schema, Schema};
use crate::scope::{RouteScope, RouteSink};
use crate::security::{SecurityScheme, SecuritySchemeRegistry};

pub const OPENAPI_VERSION: &str = "3.0.3";

#[derive(Debug)]
pub struct OpenApiDoc {
    info: Info,
    external_docs: Option<ExternalDocs>,
    servers: Vec<Server>,
    security: Vec<String>,
    schemes: SecuritySchemeRegistry,
    registry: RouteRegistry,
    generation: u64,
}

impl OpenApiDoc {
    pub fn new(info: Info) -> Self {
        Self {
            info,
            external_docs: None,
            servers: Vec::new(),
            security: Vec::new(),
            schemes: SecuritySchemeRegistry::new(),
            registry: RouteRegistry::new(),
            generation: 0,
        }
    }

    /// Document whose paths are all listed under `prefix`; routes are still
    /// mounted without it. See [`RouteRegistry::with_documented_base`].
    pub fn with_documented_base(info: Info, prefix: &str) -> Self {
        Self {
            registry: RouteRegistry::with_documented_base(prefix),
            ..Self::new(info)
        }
    }

    /// Bumped by every mutation; lets hosts cache serialized output.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn touch(&mut self) {
        self.generation += 1;
    }

    pub fn info(&self) -> &Info {
        &self.info
    }

    pub fn set_info(&mut self, info: Info) -> &mut Self {
        self.info = info;
        self.touch();
        self
    }

    pub fn external_docs(&mut self, docs: ExternalDocs) -> &mut Self {
        self.external_docs = Some(docs);
        self.touch();
        self
    }

    pub fn server(&mut self, server: Server) -> &mut Self {
        self.servers.push(server);
        self.touch();
        self
    }

    /// Add a global security requirement by scheme name.
    pub fn security(&mut self, scheme: impl Into<String>) -> &mut Self {
        self.security.push(scheme.into());
        self.touch();
        self
    }

    /// Declare a document-level tag.
    pub fn tag(&mut self, tag: Tag) -> &mut Self {
        let root = self.registry.root();
        self.add_tag(root, tag);
        self
    }

    pub fn register_scheme(&mut self, scheme: SecurityScheme) -> Result<Arc<SecurityScheme>> {
        let before = self.schemes.len();
        let scheme = self.schemes.register(scheme)?;
        if self.schemes.len() != before {
            self.touch();
        }
        Ok(scheme)
    }

    pub fn schemes(&self) -> &SecuritySchemeRegistry {
        &self.schemes
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    pub fn root(&self) -> NodeId {
        self.registry.root()
    }

    pub fn nest(&mut self, parent: NodeId, prefix: &str) -> NodeId {
        self.touch();
        self.registry.nest(parent, prefix)
    }

    pub fn nest_undocumented(&mut self, parent: NodeId, prefix: &str) -> NodeId {
        self.touch();
        self.registry.nest_undocumented(parent, prefix)
    }

    pub fn authenticate(&mut self, parent: NodeId, auth: AuthRequirement) -> NodeId {
        self.touch();
        self.registry.authenticate(parent, auth)
    }

    pub fn declare(&mut self, node: NodeId, operation: OperationBuilder) -> &OperationRecord {
        self.touch();
        self.registry.declare(node, operation.into_spec())
    }

    pub fn add_tag(&mut self, node: NodeId, tag: Tag) {
        self.touch();
        self.registry.add_tag(node, tag);
    }

    /// Start declaring routes at the root, mounting handlers into `sink`.
    pub fn scope<'a, K: RouteSink>(&'a mut self, sink: &'a mut K) -> RouteScope<'a, K> {
        let root = self.registry.root();
        RouteScope::new(self, sink, root)
    }

    /// Assemble the document. Fails only on configuration errors.
    pub fn build(&self) -> Result<Document> {
        let info = self.info.to_object()?;

        let mut servers: Vec<Server> = Vec::with_capacity(self.servers.len());
        for server in &self.servers {
            if !servers.iter().any(|s| s.url() == server.url()) {
                servers.push(server.clone());
            }
        }

        let mut tags: Vec<Tag> = Vec::new();
        for tag in self.registry.all_tags() {
            if !tags.iter().any(|t| t.name == tag.name) {
                tags.push(tag.clone());
            }
        }

        let security = self
            .security
            .iter()
            .map(|name| IndexMap::from([(name.clone(), Vec::new())]))
            .collect();

        let paths = self.assemble_paths();
        let operation_count: usize = paths.values().map(BTreeMap::len).sum();

        let security_schemes = self
            .schemes
            .iter()
            .map(|(name, scheme)| (name.to_string(), scheme.as_ref().clone()))
            .collect();

        tracing::info!(
            paths = paths.len(),
            operations = operation_count,
            schemes = self.schemes.len(),
            "Built OpenAPI document"
        );

        Ok(Document {
            openapi: OPENAPI_VERSION,
            info,
            servers,
            tags,
            external_docs: self.external_docs.clone(),
            security,
            paths,
            components: Components { security_schemes },
        })
    }

    fn assemble_paths(&self) -> BTreeMap<String, PathItem> {
        let mut normalized: BTreeMap<String, Vec<&OperationRecord>> = BTreeMap::new();
        for (path, records) in self.registry.consolidated_paths(self.registry.root()) {
            let path = if path.is_empty() { "/".to_string() } else { path };
            normalized.entry(path).or_default().extend(records);
        }

        normalized
            .into_iter()
            .map(|(path, mut records)| {
                // "" and "/" may both have contributed.
                dedup_first_wins(&mut records);
                let item = records
                    .into_iter()
                    .map(|record| (record.method, OperationObject::from_record(record)))
                    .collect();
                (path, item)
            })
            .collect()
    }

    /// Compact JSON, as served to clients.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.build()?)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.build()?)?)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.build()?)?)
    }
}

/// Operations of one path, keyed by method.
pub type PathItem = BTreeMap<HttpMethod, OperationObject>;

/// Serializable OpenAPI 3.0.3 document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub openapi: &'static str,
    pub info: InfoObject,
    pub servers: Vec<Server>,
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    pub security: Vec<IndexMap<String, Vec<String>>>,
    pub paths: BTreeMap<String, PathItem>,
    pub components: Components,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub security_schemes: IndexMap<String, SecurityScheme>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    pub summary: String,
    pub description: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<String>>,
    pub parameters: Vec<ParameterObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBodyObject>,
    pub responses: IndexMap<String, ResponseObject>,
}

impl OperationObject {
    fn from_record(record: &OperationRecord) -> Self {
        Self {
            operation_id: record.operation_id.clone(),
            summary: record.summary.clone(),
            description: record.description.clone(),
            tags: record.tags.clone(),
            security: record.security.clone(),
            parameters: record.parameters.iter().map(ParameterObject::from).collect(),
            request_body: record.request_body.as_ref().map(RequestBodyObject::from),
            responses: record
                .responses
                .iter()
                .map(|(status, response)| (status.to_string(), ResponseObject::from(response)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterObject {
    #[serde(rename = "in")]
    pub location: ParamLocation,
    pub name: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: Schema,
}

impl From<&Parameter> for ParameterObject {
    fn from(param: &Parameter) -> Self {
        Self {
            location: param.location,
            name: param.name.clone(),
            required: param.is_required(),
            description: param.description.clone(),
            schema: Schema {
                schema_type: Some(param.param_type),
                example: param.example.clone().map(Value::String),
                ..Schema::default()
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaTypeObject {
    pub schema: Schema,
}

pub type ContentObject = IndexMap<String, MediaTypeObject>;

fn content_object(content: &Content) -> ContentObject {
    IndexMap::from([(
        content.media_type().to_string(),
        MediaTypeObject {
            schema: infer_schema(content.example()),
        },
    )])
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestBodyObject {
    pub required: bool,
    pub content: ContentObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&RequestBody> for RequestBodyObject {
    fn from(body: &RequestBody) -> Self {
        Self {
            required: body.required,
            content: content_object(&body.content),
            description: body.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseObject {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentObject>,
}

impl From<&Response> for ResponseObject {
    fn from(response: &Response) -> Self {
        Self {
            description: response.description.clone(),
            content: response.content.as_ref().map(content_object),
        }
    }
}
