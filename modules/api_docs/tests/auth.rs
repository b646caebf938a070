use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Value;
use tower::util::ServiceExt; // for `oneshot`

use api_docs::{ApiDocs, ApiDocsConfig, Credentials, JwtVerifier, Principal};
use jsonwebtoken::{encode, EncodingKey, Header};
use apidoc::{ApiKeyLocation, AuthRequirement, Info};

fn check_key(c: &Credentials) -> Option<String> {
    match c {
        Credentials::ApiKey(key) if key == "k-123" => Some("pet-owner".to_string()),
        _ => None,
    }
}

fn check_admin(c: &Credentials) -> Option<String> {
    match c {
        Credentials::Basic { username, password } if username == "admin" && password == "s3cret" => {
            Some(username.clone())
        }
        _ => None,
    }
}

async fn whoami(req: Request<Body>) -> String {
    match req.extensions().get::<Principal>() {
        Some(p) => format!("{}:{}", p.scheme, p.subject),
        None => "anonymous".to_string(),
    }
}

fn secured_api() -> ApiDocs {
    let api = ApiDocs::new(ApiDocsConfig::default(), Info::new("Pets API", "1.0"));
    api.api_key("apiKey", ApiKeyLocation::Header, check_key).unwrap();
    api.basic_auth("admin", check_admin).unwrap();

    api.routes(|scope| {
        scope
            .get("/open", get(whoami), |op| op.summary("Open"))
            .authenticate(AuthRequirement::new(["apiKey"]), |auth| {
                auth.post("/pets", post(whoami), |op| op.summary("Create pet"));
            })
            .authenticate(AuthRequirement::new(["apiKey", "admin"]), |auth| {
                auth.get("/stats", get(whoami), |op| op.summary("Stats"));
            })
            .authenticate(AuthRequirement::new(["apiKey"]).optional(), |auth| {
                auth.get("/feed", get(whoami), |op| op.summary("Feed"));
            })
            .authenticate(AuthRequirement::new(["nobody"]), |auth| {
                auth.get("/orphan", get(whoami), |op| op.summary("Orphan"));
            });
    });
    api
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Response) {
    let resp = app.oneshot(req).await.unwrap();
    (resp.status(), resp)
}

async fn text(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn open_routes_need_no_credentials() {
    let (status, resp) = call(
        secured_api().router(),
        Request::get("/open").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text(resp).await, "anonymous");
}

#[tokio::test]
async fn api_key_route_rejects_missing_and_wrong_keys() {
    let api = secured_api();

    let (status, resp) = call(
        api.router(),
        Request::post("/pets")
            .header("x-request-id", "auth-1")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_str(&text(resp).await).unwrap();
    assert_eq!(body["code"], "unauthorized");
    assert_eq!(body["message"], "missing credentials");
    assert_eq!(body["request_id"], "auth-1");

    let (status, _) = call(
        api.router(),
        Request::post("/pets")
            .header("apiKey", "wrong")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, resp) = call(
        api.router(),
        Request::post("/pets")
            .header("apiKey", "k-123")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text(resp).await, "apiKey:pet-owner");
}

#[tokio::test]
async fn any_listed_scheme_may_authenticate() {
    let api = secured_api();
    let basic = format!("Basic {}", STANDARD.encode("admin:s3cret"));

    let (status, resp) = call(
        api.router(),
        Request::get("/stats")
            .header(header::AUTHORIZATION, basic)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text(resp).await, "admin:admin");

    let (status, resp) = call(
        api.router(),
        Request::get("/stats").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers()[header::WWW_AUTHENTICATE],
        "Basic realm=\"admin\""
    );
}

#[tokio::test]
async fn optional_auth_allows_anonymous_but_not_bad_credentials() {
    let api = secured_api();

    let (status, resp) = call(
        api.router(),
        Request::get("/feed").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text(resp).await, "anonymous");

    let (status, resp) = call(
        api.router(),
        Request::get("/feed")
            .header("apiKey", "k-123")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text(resp).await, "apiKey:pet-owner");

    let (status, _) = call(
        api.router(),
        Request::get("/feed")
            .header("apiKey", "nope")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unregistered_scheme_denies() {
    let (status, _) = call(
        secured_api().router(),
        Request::get("/orphan").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn document_lists_required_schemes() {
    let api = secured_api();
    let cached = api.openapi_json().unwrap();
    let doc: Value = serde_json::from_slice(&cached.json).unwrap();

    assert_eq!(doc["paths"]["/pets"]["post"]["security"][0], "apiKey");
    assert_eq!(doc["paths"]["/stats"]["get"]["security"][1], "admin");
    assert!(doc["paths"]["/open"]["get"].get("security").is_none());
    assert_eq!(doc["components"]["securitySchemes"]["admin"]["scheme"], "basic");
    assert_eq!(doc["components"]["securitySchemes"]["apiKey"]["in"], "header");
}

const JWT_SECRET: &[u8] = b"petstore-signing-key";

async fn role(req: Request<Body>) -> String {
    req.extensions()
        .get::<Principal>()
        .and_then(|p| p.claims.as_ref())
        .and_then(|c| c["role"].as_str())
        .unwrap_or("none")
        .to_string()
}

fn jwt_api() -> ApiDocs {
    let api = ApiDocs::new(ApiDocsConfig::default(), Info::new("Pets API", "1.0"));
    api.jwt_auth("jwt", JwtVerifier::hs256(JWT_SECRET), |c: &Credentials| match c {
        Credentials::Jwt { claims, .. } if claims["role"] != "banned" => {
            claims["sub"].as_str().map(str::to_owned)
        }
        _ => None,
    })
    .unwrap();

    api.routes(|scope| {
        scope.authenticate(AuthRequirement::new(["jwt"]), |auth| {
            auth.get("/me", get(whoami), |op| op.summary("Current user"))
                .get("/me/role", get(role), |op| op.summary("Current role"));
        });
    });
    api
}

fn token(claims: Value, secret: &[u8]) -> String {
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret)).unwrap()
}

fn bearer(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn in_ten_minutes() -> i64 {
    chrono::Utc::now().timestamp() + 600
}

#[tokio::test]
async fn jwt_with_valid_signature_reaches_handler_with_claims() {
    let api = jwt_api();
    let good = token(
        serde_json::json!({ "sub": "alice", "role": "vet", "exp": in_ten_minutes() }),
        JWT_SECRET,
    );

    let (status, resp) = call(api.router(), bearer("/me", &good)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text(resp).await, "jwt:alice");

    let (status, resp) = call(api.router(), bearer("/me/role", &good)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text(resp).await, "vet");
}

#[tokio::test]
async fn jwt_with_tampered_signature_is_unauthorized() {
    let api = jwt_api();
    let claims = serde_json::json!({ "sub": "alice", "exp": in_ten_minutes() });

    let forged = token(claims.clone(), b"someone-elses-key");
    let (status, resp) = call(api.router(), bearer("/me", &forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers()[header::WWW_AUTHENTICATE], "Bearer");
    let body: Value = serde_json::from_str(&text(resp).await).unwrap();
    assert_eq!(body["message"], "invalid credentials");

    // Valid header and signature, payload swapped for another user's.
    let genuine = token(claims, JWT_SECRET);
    let other = token(
        serde_json::json!({ "sub": "mallory", "exp": in_ten_minutes() }),
        JWT_SECRET,
    );
    let mut parts: Vec<&str> = genuine.split('.').collect();
    parts[1] = other.split('.').nth(1).unwrap();
    let (status, _) = call(api.router(), bearer("/me", &parts.join("."))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_or_malformed_jwt_is_unauthorized() {
    let api = jwt_api();
    let expired = token(
        serde_json::json!({ "sub": "alice", "exp": chrono::Utc::now().timestamp() - 3600 }),
        JWT_SECRET,
    );
    let (status, _) = call(api.router(), bearer("/me", &expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let no_exp = token(serde_json::json!({ "sub": "alice" }), JWT_SECRET);
    let (status, _) = call(api.router(), bearer("/me", &no_exp)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(api.router(), bearer("/me", "not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn verified_jwt_can_still_be_refused_by_validator() {
    let api = jwt_api();
    let banned = token(
        serde_json::json!({ "sub": "bob", "role": "banned", "exp": in_ten_minutes() }),
        JWT_SECRET,
    );
    let (status, _) = call(api.router(), bearer("/me", &banned)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
