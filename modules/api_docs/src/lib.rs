//! axum host for route-declared OpenAPI documents.
//!
//! [`ApiDocs`] owns the [`OpenApiDoc`], mounts every declared operation on an
//! axum [`Router`] (wrapping authenticated ones in the auth guard) and serves
//! the generated document with a documentation UI.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use apidoc::{
    ApiKeyLocation, AuthRequirement, DocError, HttpMethod, Info, MountedRoute, OAuthFlows, OpenApiDoc,
    RouteScope, RouteSink, SecurityScheme,
};
use arc_swap::ArcSwap;
use axum::{
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, MethodRouter},
    Router,
};
use dashmap::{mapref::entry::Entry, DashMap};
use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

pub mod assets;
pub mod auth;
mod config;
pub mod doc_cache;
pub mod error;
pub mod request_id;
mod web;

pub use auth::{
    AuthGuard, AuthProvider, AuthProviders, AuthValidator, Credentials, JwtVerifier, Principal,
};
pub use config::{normalize_base_path, ApiDocsConfig, MODULE_NAME};
pub use doc_cache::{CachedDoc, DocCache};
pub use error::AppError;

use web::DocsState;

pub struct ApiDocs {
    config: ArcSwap<ApiDocsConfig>,
    doc: Arc<RwLock<OpenApiDoc>>,
    cache: Arc<DocCache>,
    providers: AuthProviders,
    // Declared routes, before the docs endpoints and middleware are added.
    routes: Mutex<Router>,
    // (method, real path) -> handler id of the first mount
    mounted: DashMap<(HttpMethod, String), String>,
}

impl ApiDocs {
    pub fn new(config: ApiDocsConfig, info: Info) -> Self {
        Self::with_doc(config, OpenApiDoc::new(info))
    }

    /// Host for a prepared document, e.g. one built with
    /// [`OpenApiDoc::with_documented_base`].
    pub fn with_doc(config: ApiDocsConfig, doc: OpenApiDoc) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            doc: Arc::new(RwLock::new(doc)),
            cache: Arc::new(DocCache::new()),
            providers: Arc::new(DashMap::new()),
            routes: Mutex::new(Router::new()),
            mounted: DashMap::new(),
        }
    }

    pub fn config(&self) -> Arc<ApiDocsConfig> {
        self.config.load_full()
    }

    /// Edit document-level settings (info, servers, tags, global security).
    pub fn configure_doc<R>(&self, f: impl FnOnce(&mut OpenApiDoc) -> R) -> R {
        f(&mut *self.doc.write())
    }

    /// Register `scheme` in the document and its validator with the auth layer.
    ///
    /// Registering an identical scheme again is a no-op and keeps the first
    /// validator.
    pub fn register_auth(
        &self,
        scheme: SecurityScheme,
        validator: impl AuthValidator,
    ) -> Result<Arc<SecurityScheme>, DocError> {
        self.install_provider(scheme, |scheme| AuthProvider::new(scheme, validator))
    }

    fn install_provider(
        &self,
        scheme: SecurityScheme,
        provider: impl FnOnce(Arc<SecurityScheme>) -> AuthProvider,
    ) -> Result<Arc<SecurityScheme>, DocError> {
        let scheme = self.doc.write().register_scheme(scheme)?;
        match self.providers.entry(scheme.name.clone()) {
            Entry::Occupied(_) => {
                tracing::debug!(scheme = %scheme.name, "Auth provider already registered");
            }
            Entry::Vacant(slot) => {
                tracing::debug!(scheme = %scheme.name, variant = %scheme.variant(), "Registered auth provider");
                slot.insert(Arc::new(provider(Arc::clone(&scheme))));
            }
        }
        Ok(scheme)
    }

    pub fn api_key(
        &self,
        name: &str,
        location: ApiKeyLocation,
        validator: impl AuthValidator,
    ) -> Result<Arc<SecurityScheme>, DocError> {
        self.register_auth(SecurityScheme::api_key(name, location), validator)
    }

    pub fn basic_auth(
        &self,
        name: &str,
        validator: impl AuthValidator,
    ) -> Result<Arc<SecurityScheme>, DocError> {
        self.register_auth(SecurityScheme::basic(name), validator)
    }

    pub fn bearer_auth(
        &self,
        name: &str,
        validator: impl AuthValidator,
    ) -> Result<Arc<SecurityScheme>, DocError> {
        self.register_auth(SecurityScheme::bearer(name), validator)
    }

    /// Bearer scheme documented with `bearerFormat: JWT`.
    ///
    /// Tokens failing `verifier` (bad signature, expired, malformed) are
    /// rejected with 401; `validator` sees [`Credentials::Jwt`] with the
    /// decoded claims.
    pub fn jwt_auth(
        &self,
        name: &str,
        verifier: JwtVerifier,
        validator: impl AuthValidator,
    ) -> Result<Arc<SecurityScheme>, DocError> {
        self.install_provider(SecurityScheme::jwt(name), |scheme| {
            AuthProvider::jwt(scheme, verifier, validator)
        })
    }

    pub fn oauth2(
        &self,
        name: &str,
        flows: OAuthFlows,
        validator: impl AuthValidator,
    ) -> Result<Arc<SecurityScheme>, DocError> {
        self.register_auth(SecurityScheme::oauth2(name, flows)?, validator)
    }

    /// Declare routes from the document root.
    ///
    /// Each declared operation is documented and mounted in one step. A second
    /// mount of the same `(method, real path)` is logged and skipped.
    pub fn routes(&self, declare: impl FnOnce(&mut RouteScope<'_, AxumSink<'_>>)) {
        let mut doc = self.doc.write();
        let mut routes = self.routes.lock();
        let mut sink = AxumSink {
            router: std::mem::take(&mut *routes),
            providers: &self.providers,
            mounted: &self.mounted,
        };
        {
            let mut scope = doc.scope(&mut sink);
            declare(&mut scope);
        }
        *routes = sink.router;
    }

    /// Serialized document, rebuilt only if it changed since the last call.
    pub fn openapi_json(&self) -> Result<Arc<CachedDoc>, DocError> {
        self.cache.get_or_build(&self.doc)
    }

    /// Full application router: declared routes, `/health`, the docs
    /// endpoints and the middleware stack.
    pub fn router(&self) -> Router {
        let cfg = self.config();
        let mut router = Router::new()
            .route("/health", get(web::health_check))
            .merge(self.routes.lock().clone());

        if cfg.enable_docs {
            let mut docs = web::docs_router(DocsState {
                doc: Arc::clone(&self.doc),
                cache: Arc::clone(&self.cache),
                base_path: cfg.base_path.clone(),
                docs_dir: cfg.docs_dir.clone(),
            });
            if let Some(schemes) = cfg.docs_auth.as_ref().filter(|s| !s.is_empty()) {
                docs = docs.route_layer(from_fn_with_state(
                    AuthGuard {
                        providers: Arc::clone(&self.providers),
                        requirement: Arc::new(AuthRequirement::new(schemes.iter().cloned())),
                    },
                    auth::auth_guard,
                ));
            }
            router = router.merge(docs);
        }

        // Outermost first: SetRequestId -> PropagateRequestId -> Trace ->
        // push_req_id_to_extensions -> Timeout -> CORS -> BodyLimit.
        router = router.layer(RequestBodyLimitLayer::new(cfg.body_limit_bytes));
        if cfg.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }
        router = router.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(cfg.request_timeout_secs),
        ));
        router = router.layer(from_fn(request_id::push_req_id_to_extensions));
        router = router.layer(request_id::create_trace_layer());

        let x_request_id = request_id::header();
        router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
        router.layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId))
    }

    /// Bind `bind_addr` and serve until `cancel` fires.
    pub async fn serve(self: Arc<Self>, cancel: CancellationToken) -> anyhow::Result<()> {
        let cfg = self.config();
        let addr: SocketAddr = cfg
            .bind_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", cfg.bind_addr, e))?;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("HTTP server bound on {}", addr);
        self.serve_with_listener(listener, cancel).await
    }

    pub async fn serve_with_listener(
        &self,
        listener: tokio::net::TcpListener,
        cancel: CancellationToken,
    ) -> anyhow::Result<()> {
        let router = self.router();
        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}

/// Mounts declared operations on an axum router.
///
/// The handler passed for a declaration should only answer the declared
/// method, e.g. `get(list_pets)` for a GET.
pub struct AxumSink<'a> {
    router: Router,
    providers: &'a AuthProviders,
    mounted: &'a DashMap<(HttpMethod, String), String>,
}

impl RouteSink for AxumSink<'_> {
    type Handler = MethodRouter;

    fn mount(&mut self, route: MountedRoute, handler: MethodRouter) {
        let path = if route.real_path.is_empty() {
            "/".to_string()
        } else {
            route.real_path
        };

        match self.mounted.entry((route.method, path.clone())) {
            Entry::Occupied(existing) => {
                tracing::error!(
                    method = %route.method,
                    path = %path,
                    handler_id = %route.handler_id,
                    first = %existing.get(),
                    "Duplicate (method, path) detected; ignoring subsequent registration"
                );
                return;
            }
            Entry::Vacant(slot) => {
                slot.insert(route.handler_id.clone());
            }
        }

        let handler = match route.auth {
            Some(requirement) => handler.route_layer(from_fn_with_state(
                AuthGuard {
                    providers: Arc::clone(self.providers),
                    requirement: Arc::new(requirement),
                },
                auth::auth_guard,
            )),
            None => handler,
        };

        tracing::debug!(
            handler_id = %route.handler_id,
            method = %route.method,
            path = %path,
            "Mounted route"
        );
        let router = std::mem::take(&mut self.router);
        self.router = router.route(&path, handler);
    }
}
