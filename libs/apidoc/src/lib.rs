//! Route-declared OpenAPI 3.0.3 documents.
//!
//! Routes are declared once, through an [`OpenApiDoc`], and the same
//! declarations drive both the HTTP router (via [`RouteSink`]) and the
//! generated document. Request and response bodies are documented by live
//! example values; their schemas are inferred on every build.
//!
//! ```
//! use apidoc::{AuthRequirement, Info, OpenApiDoc, OperationBuilder, SecurityScheme, ApiKeyLocation};
//!
//! let mut doc = OpenApiDoc::new(Info::new("Pets API", "1.0"));
//! doc.register_scheme(SecurityScheme::api_key("apiKey", ApiKeyLocation::Header))?;
//!
//! let root = doc.root();
//! let secured = doc.authenticate(root, AuthRequirement::new(["apiKey"]));
//! doc.declare(root, OperationBuilder::get("/pets").summary("List pets"));
//! doc.declare(secured, OperationBuilder::post("/pets").summary("Create pet"));
//!
//! let json = doc.to_value()?;
//! assert_eq!(json["paths"]["/pets"]["post"]["security"][0], "apiKey");
//! # Ok::<(), apidoc::DocError>(())
//! ```

pub mod document;
pub mod error;
pub mod example;
pub mod model;
pub mod operation;
pub mod registry;
pub mod schema;
pub mod scope;
pub mod security;

pub use document::{Document, OpenApiDoc, OPENAPI_VERSION};
pub use error::{DocError, Result};
pub use example::Example;
pub use model::{
    media_type, Contact, Content, ExternalDocs, Info, License, ParamLocation, Parameter,
    RequestBody, Response, Server, ServerVariable, Tag,
};
pub use operation::{HttpMethod, OperationBuilder, OperationRecord, OperationSpec};
pub use registry::{AuthRequirement, EdgeKind, NodeId, RegistryNode, RouteRegistry};
pub use schema::{infer_schema, Schema, SchemaFormat, SchemaType, MAX_INFERENCE_DEPTH};
pub use scope::{MountedRoute, RouteScope, RouteSink};
pub use security::{
    ApiKeyLocation, OAuthFlow, OAuthFlows, SchemeKind, SchemeVariant, SecurityScheme,
    SecuritySchemeRegistry,
};
