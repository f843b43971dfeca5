//! # HTTP Server
//!
//! Shared application state and the combined router.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Router};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::access_routes::access_routes;
use super::admin_routes::admin_routes;
use super::auth_routes::auth_routes;
use super::config::HttpServerConfig;
use super::form_routes::form_routes;
use super::meta_routes::meta_routes;
use super::observability_routes::{health_routes, observability_routes};
use crate::auth::crypto::PasswordPolicy;
use crate::auth::{AccessGate, AuthService, GrantAccessGate, JwtConfig, JwtManager, UserAdmin};
use crate::forms::{
    Catalog, FormService, FormVersionManager, SubmissionValidator, DEFAULT_PUBLISH_ATTEMPTS,
};
use crate::observability::MetricsRegistry;
use crate::schema::{InMemoryValidatorCache, SchemaLimits, ValidatorCache};
use crate::store::Repositories;

/// Knobs for assembling [`AppState`]
#[derive(Clone)]
pub struct StateOptions {
    pub jwt: JwtConfig,
    pub schema_limits: SchemaLimits,
    pub publish_max_attempts: u32,
    /// Compiled validator cache; one per process
    pub cache: Arc<dyn ValidatorCache>,
}

impl Default for StateOptions {
    fn default() -> Self {
        Self {
            jwt: JwtConfig::default(),
            schema_limits: SchemaLimits::default(),
            publish_max_attempts: DEFAULT_PUBLISH_ATTEMPTS,
            cache: Arc::new(InMemoryValidatorCache::new()),
        }
    }
}

/// Services shared by every handler
pub struct AppState {
    pub auth: AuthService,
    pub users: UserAdmin,
    pub catalog: Catalog,
    pub versions: Arc<FormVersionManager>,
    pub forms: FormService,
    pub metrics: Arc<MetricsRegistry>,
}

impl AppState {
    /// Wire services over the given repositories
    pub fn new(repos: Repositories, options: StateOptions) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());

        let auth = AuthService::new(
            Arc::clone(&repos.users),
            JwtManager::new(options.jwt),
            PasswordPolicy::self_service(),
        );
        let users = UserAdmin::new(Arc::clone(&repos.users), Arc::clone(&repos.grants));

        let versions = Arc::new(FormVersionManager::new(
            Arc::clone(&repos.definitions),
            options.schema_limits,
            options.publish_max_attempts,
            Arc::clone(&metrics),
        ));
        let validator = SubmissionValidator::new(
            Arc::clone(&versions),
            options.cache,
            Arc::clone(&metrics),
        );
        let gate: Arc<dyn AccessGate> = Arc::new(GrantAccessGate::new(Arc::clone(&repos.grants)));
        let forms = FormService::new(
            gate,
            Arc::clone(&versions),
            validator,
            Arc::clone(&repos.submissions),
            Arc::clone(&metrics),
        );

        Self {
            auth,
            users,
            catalog: Catalog::new(repos),
            versions,
            forms,
            metrics,
        }
    }
}

/// HTTP Server for divforms
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server over prepared state
    pub fn new(config: HttpServerConfig, state: Arc<AppState>) -> Self {
        let router = build_router(&config, state);
        Self { config, router }
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until the process is stopped
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("{}", e))
        })?;

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "divforms listening");

        axum::serve(listener, self.router).await
    }
}

fn cors_layer(config: &HttpServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.cors_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Build the combined router with all endpoints
pub fn build_router(config: &HttpServerConfig, state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health_routes())
        .nest("/auth", auth_routes(Arc::clone(&state)))
        .nest("/admin", admin_routes(Arc::clone(&state)))
        .nest("/meta", meta_routes(Arc::clone(&state)))
        .nest("/access", access_routes(Arc::clone(&state)))
        .nest("/forms", form_routes(Arc::clone(&state)))
        .nest("/observability", observability_routes(state))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
}
