use std::sync::Arc;

use apidoc::{
    infer_schema, ApiKeyLocation, AuthRequirement, Content, DocError, Example, ExternalDocs, Info,
    OpenApiDoc, OperationBuilder, Parameter, SchemaType, SecurityScheme, Server, ServerVariable,
    Tag,
};
use pretty_assertions::assert_eq;
use serde::Serialize;
use serde_json::json;

fn pets_doc() -> OpenApiDoc {
    let mut doc = OpenApiDoc::new(Info::new("Pets API", "1.0"));
    doc.register_scheme(SecurityScheme::api_key("apiKey", ApiKeyLocation::Header))
        .unwrap();

    let root = doc.root();
    let secured = doc.authenticate(root, AuthRequirement::new(["apiKey"]));
    doc.declare(root, OperationBuilder::get("/pets").summary("List pets"));
    doc.declare(secured, OperationBuilder::post("/pets").summary("Create pet"));
    doc
}

#[test]
fn pets_api_scenario() {
    let json = pets_doc().to_value().unwrap();

    assert_eq!(json["openapi"], "3.0.3");
    assert_eq!(json["info"], json!({"title": "Pets API", "version": "1.0"}));

    let pets = &json["paths"]["/pets"];
    assert!(pets["get"].is_object());
    assert!(pets["get"].get("security").is_none());
    assert_eq!(pets["post"]["security"], json!(["apiKey"]));

    assert_eq!(json["components"]["securitySchemes"]["apiKey"]["type"], "apiKey");
}

#[test]
fn duplicate_server_urls_keep_the_first() {
    let mut doc = OpenApiDoc::new(Info::new("Pets API", "1.0"));
    doc.server(Server::new("https://api.example.com").description("primary"))
        .server(Server::new("https://api.example.com").description("shadow"))
        .server(Server::new("https://backup.example.com"));

    let json = doc.to_value().unwrap();
    assert_eq!(
        json["servers"],
        json!([
            {"url": "https://api.example.com", "description": "primary", "variables": {}},
            {"url": "https://backup.example.com", "variables": {}}
        ])
    );
}

#[test]
fn two_builds_are_byte_identical() {
    let doc = pets_doc();
    let first = doc.to_json().unwrap();
    let second = doc.to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn scheme_registration_is_idempotent_and_conflicts_fail() {
    let mut doc = pets_doc();
    let before = doc.to_json().unwrap();

    let a = doc.schemes().get("apiKey").cloned().unwrap();
    let b = doc
        .register_scheme(SecurityScheme::api_key("apiKey", ApiKeyLocation::Header))
        .unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(doc.schemes().len(), 1);

    let err = doc.register_scheme(SecurityScheme::jwt("apiKey")).unwrap_err();
    assert!(matches!(err, DocError::SchemeConflict { ref name, .. } if name == "apiKey"));
    assert!(err.is_configuration());
    assert_eq!(doc.schemes().len(), 1);
    assert_eq!(doc.to_json().unwrap(), before);
}

#[test]
fn primitive_inference_examples() {
    assert_eq!(
        serde_json::to_value(infer_schema(&Example::from(true))).unwrap(),
        json!({"type": "boolean", "example": true})
    );
    assert_eq!(
        serde_json::to_value(infer_schema(&Example::from(3.14f32))).unwrap(),
        json!({"type": "number", "format": "float", "example": 3.14})
    );
    assert_eq!(
        serde_json::to_value(infer_schema(&Example::array(Vec::<Example>::new()))).unwrap(),
        json!({"type": "array"})
    );
    assert_eq!(
        serde_json::to_value(infer_schema(&Example::from(json!({"a": 1, "b": ["x"]})))).unwrap(),
        json!({
            "type": "object",
            "properties": {
                "a": {"type": "integer", "format": "int64", "example": 1},
                "b": {"type": "array", "items": {"type": "string", "example": "x"}}
            }
        })
    );
}

#[derive(Serialize)]
struct Pet {
    id: u32,
    name: String,
    tags: Vec<String>,
    vaccinated: bool,
}

#[test]
fn full_document_shape() {
    let mut doc = OpenApiDoc::new(
        Info::new("Pets API", "1.0")
            .description("Pet store")
            .license("MIT", None),
    );
    doc.external_docs(ExternalDocs::new("https://docs.example.com"))
        .server(
            Server::new("https://{env}.example.com")
                .variable("env", ServerVariable::new("prod").enum_values(["prod", "staging"]))
                .unwrap(),
        )
        .security("apiKey")
        .tag(Tag::new("pets").description("Everything about pets"));
    doc.register_scheme(
        SecurityScheme::api_key_named("apiKey", ApiKeyLocation::Header, "X-API-Key")
            .description("Static key"),
    )
    .unwrap();

    let root = doc.root();
    let v1 = doc.nest(root, "/v1");
    doc.add_tag(v1, Tag::new("pets").description("duplicate is dropped"));
    doc.add_tag(v1, Tag::new("store"));

    let pet = Pet {
        id: 7,
        name: "Rex".into(),
        tags: vec!["dog".into()],
        vaccinated: true,
    };
    doc.declare(
        v1,
        OperationBuilder::get("/pets/{id}")
            .operation_id("getPet")
            .summary("Find pet")
            .description("Returns a single pet")
            .tag("pets")
            .param(Parameter::path("id").param_type(SchemaType::Integer).description("Pet id"))
            .json_response(200, "The pet", &pet)
            .response(404, "Not found", Some(Content::text("no such pet"))),
    );
    doc.declare(
        v1,
        OperationBuilder::put("/pets/{id}")
            .summary("Replace pet")
            .json_request(&pet, "Replacement")
            .response(204, "Replaced", None),
    );

    let json = doc.to_value().unwrap();
    assert_eq!(
        json,
        json!({
            "openapi": "3.0.3",
            "info": {
                "title": "Pets API",
                "version": "1.0",
                "description": "Pet store",
                "license": {"name": "MIT"}
            },
            "servers": [{
                "url": "https://{env}.example.com",
                "variables": {"env": {"default": "prod", "enum": ["prod", "staging"]}}
            }],
            "tags": [
                {"name": "pets", "description": "Everything about pets"},
                {"name": "store"}
            ],
            "externalDocs": {"url": "https://docs.example.com"},
            "security": [{"apiKey": []}],
            "paths": {
                "/v1/pets/{id}": {
                    "get": {
                        "operationId": "getPet",
                        "summary": "Find pet",
                        "description": "Returns a single pet",
                        "tags": ["pets"],
                        "parameters": [{
                            "in": "path",
                            "name": "id",
                            "required": true,
                            "description": "Pet id",
                            "schema": {"type": "integer"}
                        }],
                        "responses": {
                            "200": {
                                "description": "The pet",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "id": {"type": "integer", "format": "int64", "example": 7},
                                                "name": {"type": "string", "example": "Rex"},
                                                "tags": {"type": "array", "items": {"type": "string", "example": "dog"}},
                                                "vaccinated": {"type": "boolean", "example": true}
                                            }
                                        }
                                    }
                                }
                            },
                            "404": {
                                "description": "Not found",
                                "content": {
                                    "text/plain": {"schema": {"type": "string", "example": "no such pet"}}
                                }
                            }
                        }
                    },
                    "put": {
                        "summary": "Replace pet",
                        "description": "",
                        "tags": [],
                        "parameters": [],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "id": {"type": "integer", "format": "int64", "example": 7},
                                            "name": {"type": "string", "example": "Rex"},
                                            "tags": {"type": "array", "items": {"type": "string", "example": "dog"}},
                                            "vaccinated": {"type": "boolean", "example": true}
                                        }
                                    }
                                }
                            },
                            "description": "Replacement"
                        },
                        "responses": {"204": {"description": "Replaced"}}
                    }
                }
            },
            "components": {
                "securitySchemes": {
                    "apiKey": {
                        "type": "apiKey",
                        "name": "X-API-Key",
                        "in": "header",
                        "description": "Static key"
                    }
                }
            }
        })
    );
}

#[test]
fn paths_are_sorted_and_methods_keyed() {
    let mut doc = OpenApiDoc::new(Info::new("t", "1"));
    let root = doc.root();
    doc.declare(root, OperationBuilder::get("/zebra"));
    doc.declare(root, OperationBuilder::delete("/alpha"));
    doc.declare(root, OperationBuilder::get("/alpha"));

    let json = doc.to_json().unwrap();
    let alpha = json.find("\"/alpha\"").unwrap();
    let zebra = json.find("\"/zebra\"").unwrap();
    assert!(alpha < zebra);

    let get = json.find("\"get\"").unwrap();
    let delete = json.find("\"delete\"").unwrap();
    assert!(get < delete, "methods follow the fixed method order");
}

#[test]
fn missing_info_fails_the_build() {
    let doc = OpenApiDoc::new(Info::default());
    let err = doc.build().unwrap_err();
    assert!(matches!(err, DocError::MissingInfoField { field: "title" }));
}

#[test]
fn empty_components_are_omitted() {
    let doc = OpenApiDoc::new(Info::new("t", "1"));
    let json = doc.to_value().unwrap();
    assert_eq!(json["components"], json!({}));
    assert_eq!(json["paths"], json!({}));
    assert_eq!(json["security"], json!([]));
}

#[test]
fn documented_base_prefixes_every_path() {
    let mut doc = OpenApiDoc::with_documented_base(Info::new("Pets API", "1.0"), "/api");
    let root = doc.root();
    let v1 = doc.nest(root, "/v1");
    doc.declare(root, OperationBuilder::get("/pets").summary("List pets"));
    let record = doc.declare(v1, OperationBuilder::get("/pets/{id}").summary("Get pet"));
    assert_eq!(record.real_path, "/v1/pets/{id}");

    let json = doc.to_value().unwrap();
    let paths: Vec<&String> = json["paths"].as_object().unwrap().keys().collect();
    assert_eq!(paths, vec!["/api/pets", "/api/v1/pets/{id}"]);
    assert_eq!(json["info"]["title"], "Pets API");
}
